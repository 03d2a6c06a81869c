pub mod clock;
pub mod host_context;
pub mod instance_guard;
pub mod notification;
pub mod replayer;
