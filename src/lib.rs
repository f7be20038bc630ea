pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filename;
pub mod global;
pub mod notion;
pub mod uploader;
pub mod zoom;
