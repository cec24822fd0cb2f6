pub mod ai;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod issues;
pub mod project;
pub mod session;
pub mod storage;
pub mod types;
