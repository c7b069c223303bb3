pub mod analyze;
pub mod config;
pub mod jobs;
pub mod render;
pub mod runs;
