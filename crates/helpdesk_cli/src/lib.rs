pub mod commands;
pub mod config;
pub mod json_store;
pub mod telemetry;
