pub mod accounts;
pub mod cache;
pub mod check;
pub mod completions;
pub mod config;
pub mod resolve;
