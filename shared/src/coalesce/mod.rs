pub mod classifier;
pub mod decision;
pub mod engine;
pub mod field_event;
pub mod refresh_gate;
pub mod sweeper;
pub mod visual_cache;
