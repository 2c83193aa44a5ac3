pub mod attendance;
pub mod core;
pub mod persons;
pub mod reports;
pub mod setup;
