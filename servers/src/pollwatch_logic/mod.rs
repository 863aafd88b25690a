pub mod api;
pub mod config;
pub mod logger;
pub mod pipeline;
pub mod state;
