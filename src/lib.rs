pub mod build;
pub mod catalog;
pub mod config;
pub mod device;
pub mod package;
pub mod render;
pub mod report;
pub mod source;
