//! stat command - Show account, container or object details
//!
//! Prints the response headers of the target, which carry sizes, counts,
//! dates and metadata.

use std::collections::BTreeMap;

use clap::Args;
use http::HeaderMap;
use serde::Serialize;
use sw_core::parse_remote;

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show details of an account, container or object
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Remote path (profile, profile/container or profile/container/key)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    target: String,
    kind: &'static str,
    headers: BTreeMap<String, String>,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_remote(args.path.trim_end_matches('/')) {
        Ok(p) => p,
        Err(e) => return usage(&formatter, &e.to_string()),
    };

    let client = match connect(&path.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (kind, result) = if path.is_account() {
        ("account", client.account().details().await)
    } else if path.is_container() {
        ("container", client.containers().info(&path.container).await)
    } else {
        ("object", client.objects().info(&path.object_path()).await)
    };

    let headers = match result {
        Ok(h) => header_map(&h),
        Err(e) => return fail(&formatter, &format!("Failed to stat {kind}"), &e),
    };

    if formatter.is_json() {
        formatter.json(&StatOutput {
            target: path.to_string(),
            kind,
            headers,
        });
    } else {
        formatter.println(&format!("{path} ({kind})"));
        formatter.table(
            &["Header", "Value"],
            headers.into_iter().map(|(k, v)| vec![k, v]).collect(),
        );
    }
    ExitCode::Success
}

/// Headers as sorted text pairs; values that are not UTF-8 are skipped
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
