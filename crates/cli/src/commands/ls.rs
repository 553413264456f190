//! ls command - List containers and objects
//!
//! Lists the account's containers when given a profile only, or the objects
//! of a container (optionally under a prefix) otherwise.

use clap::Args;
use serde::Serialize;
use sw_core::{ContainerEntry, ListOptions, ObjectEntry, RemotePath, StorageClient, parse_remote};

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List containers or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (profile or profile/container[/prefix])
    pub path: String,

    /// List recursively instead of rolling names up at '/'
    #[arg(short, long)]
    pub recursive: bool,

    /// Summarize output (show totals)
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct ContainersOutput {
    containers: Vec<ContainerEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct ObjectsOutput {
    items: Vec<ObjectEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: u64,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn new(total_objects: u64, total_size_bytes: u64) -> Self {
        Self {
            total_objects,
            total_size_bytes,
            total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_remote(args.path.trim_end_matches('/')) {
        Ok(p) => p,
        Err(e) => return usage(&formatter, &e.to_string()),
    };

    let client = match connect(&path.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if path.is_account() {
        list_containers(&client, &formatter, args.summarize).await
    } else {
        list_objects(&client, &path, &args, &formatter).await
    }
}

async fn list_containers(client: &StorageClient, formatter: &Formatter, summarize: bool) -> ExitCode {
    let containers = match client.account().containers().await {
        Ok(c) => c,
        Err(e) => return fail(formatter, "Failed to list containers", &e),
    };

    let summary = summarize.then(|| {
        Summary::new(
            containers.iter().map(|c| c.count).sum(),
            containers.iter().map(|c| c.bytes).sum(),
        )
    });

    if formatter.is_json() {
        formatter.json(&ContainersOutput {
            containers,
            summary,
        });
        return ExitCode::Success;
    }

    for container in &containers {
        let size = humansize::format_size(container.bytes, humansize::BINARY);
        formatter.println(&format!(
            "{:>10} {:>8} {}/",
            size, container.count, container.name
        ));
    }
    if let Some(summary) = summary {
        formatter.println(&format!(
            "\nTotal: {} containers, {} objects, {}",
            containers.len(),
            summary.total_objects,
            summary.total_size_human
        ));
    }
    ExitCode::Success
}

async fn list_objects(
    client: &StorageClient,
    path: &RemotePath,
    args: &LsArgs,
    formatter: &Formatter,
) -> ExitCode {
    let mut options = ListOptions::default();
    if !path.key.is_empty() {
        options = options.with_prefix(format!("{}/", path.key.trim_end_matches('/')));
    }
    if !args.recursive {
        options = options.with_delimiter("/");
    }

    let items = match client.containers().list_all_with(&path.container, options).await {
        Ok(items) => items,
        Err(e) => return fail(formatter, "Failed to list objects", &e),
    };

    let files = items.iter().filter(|i| !i.is_dir());
    let summary = args.summarize.then(|| {
        Summary::new(
            files.clone().count() as u64,
            files.map(|i| i.bytes).sum(),
        )
    });

    if formatter.is_json() {
        formatter.json(&ObjectsOutput { items, summary });
        return ExitCode::Success;
    }

    for item in &items {
        formatter.println(&format_entry(item));
    }
    if let Some(summary) = summary {
        formatter.println(&format!(
            "\nTotal: {} objects, {}",
            summary.total_objects, summary.total_size_human
        ));
    }
    ExitCode::Success
}

/// One human-readable listing line
fn format_entry(item: &ObjectEntry) -> String {
    if item.is_dir() {
        return format!("{:<26} {:>10} {}", "", "DIR", item.display_name());
    }
    let date = item
        .last_modified
        .as_deref()
        .map(|d| d.split('.').next().unwrap_or(d).replace('T', " "))
        .unwrap_or_default();
    format!("[{date:<24}] {:>10} {}", item.size_human(), item.name)
}
