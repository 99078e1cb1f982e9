// shufflecheck/src/lib.rs
//! # shufflecheck CLI
//!
//! Thin command-line front end over `shufflecheck-core`: argument parsing,
//! logging, Ctrl-C handling and terminal/JSON rendering of the report.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
