pub mod config;
pub mod errors;
pub mod manager;
pub mod metric;
pub mod publisher;
pub mod sleep;
pub mod snapshot;
