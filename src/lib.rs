pub mod config;
pub mod output;
pub mod scoring;
pub mod standings;
