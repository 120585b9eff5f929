pub mod config;
pub mod info;
pub mod merge;
pub mod render;
