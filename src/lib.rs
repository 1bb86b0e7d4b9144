// Public API for integration tests and potential library usage

pub mod catalog;
pub mod config;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;
