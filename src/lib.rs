pub mod config;
pub mod controller;
pub mod data;
pub mod electors;
pub mod error;
pub mod events;
pub mod resolver;
pub mod server;
pub mod types;
