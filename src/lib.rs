pub mod commands;
pub mod config;
pub mod errors;
pub mod security;
pub mod uploader;
