pub mod config;
pub mod dates;
pub mod error;
pub mod prize;
pub mod types;
