pub mod entity_id;
pub mod entity_store;
pub mod error;
pub mod field;
