//! CLI subcommands.

pub mod actuator;
pub mod common;
pub mod config;
pub mod init;
pub mod run;
pub mod send_distance;
