//! swc CLI library
//!
//! Exposes the command definitions, exit codes and output helpers of the
//! `swc` binary to integration tests.

pub mod commands;
pub mod exit_code;
pub mod output;
