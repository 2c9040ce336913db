//! CLI command handlers

pub mod config;
pub mod error;
pub mod inspect;
pub mod output;
pub mod rules;
pub mod run;
