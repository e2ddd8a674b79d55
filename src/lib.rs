pub mod diagnostics;

pub mod config;
pub mod data;
pub mod output;
pub mod scoring;
