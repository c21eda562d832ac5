pub mod analysis;
pub mod config;
pub mod models;
pub mod reporter;
pub mod runner;
pub mod source;
