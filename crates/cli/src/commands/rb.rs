//! rb command - Remove container
//!
//! A container that still holds objects is only removed with --force, which
//! deletes its objects first.

use clap::Args;
use serde::Serialize;
use sw_core::{ContainerDeletion, parse_remote};

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove a container
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Container path (profile/container)
    pub target: String,

    /// Delete the container's objects first
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    status: &'static str,
    container: String,
    removed_objects: usize,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_remote(args.target.trim_end_matches('/')) {
        Ok(p) if p.is_container() => p,
        Ok(_) => return usage(&formatter, "Target must be profile/container"),
        Err(e) => return usage(&formatter, &e.to_string()),
    };

    let client = match connect(&path.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.containers().delete(&path.container, args.force).await {
        Ok(deletion) => {
            let removed = deletion.removed_objects();
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "success",
                    container: path.to_string(),
                    removed_objects: removed,
                });
            } else {
                match deletion {
                    ContainerDeletion::Empty { .. } => {
                        formatter.success(&format!("Container '{path}' removed."));
                    }
                    ContainerDeletion::Forced { .. } => formatter.success(&format!(
                        "Container '{path}' removed with {removed} object(s)."
                    )),
                }
            }
            ExitCode::Success
        }
        Err(e @ sw_core::Error::Conflict(_)) => {
            formatter.error(&format!("{e}. Use --force to delete its objects."));
            ExitCode::Conflict
        }
        Err(e) => fail(&formatter, "Failed to remove container", &e),
    }
}
