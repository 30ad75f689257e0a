#![forbid(unsafe_code)]

pub mod analytics;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod llm;
pub mod models;
pub mod nlquery;
pub mod seed;
pub mod utils;

pub use cli::app::{Cli, Command};
