pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod service;
pub mod status;
pub mod types;
