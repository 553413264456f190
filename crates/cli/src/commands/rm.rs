//! rm command - Remove objects
//!
//! Removes one or more objects of a profile in a single concurrent batch.
//! Prefixes are expanded with a listing when --recursive is given.

use clap::Args;
use serde::Serialize;
use sw_core::{BatchDelete, Error, ListOptions, RemotePath, StorageClient, parse_remote};

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to remove (profile/container/key)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove every object under the given prefixes
    #[arg(short, long)]
    pub recursive: bool,

    /// Ignore objects that do not exist
    #[arg(short, long)]
    pub force: bool,

    /// Only show what would be deleted (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<RmFailure>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct RmFailure {
    path: String,
    error: String,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let targets = match parse_targets(&args.paths) {
        Ok(t) => t,
        Err(msg) => return usage(&formatter, &msg),
    };
    if !args.recursive && let Some(t) = targets.iter().find(|t| t.key.is_empty()) {
        return usage(
            &formatter,
            &format!("'{t}' is not an object. Use -r/--recursive to remove a whole container's objects."),
        );
    }

    let client = match connect(&targets[0].profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let objects = if args.recursive {
        match expand(&client, &targets).await {
            Ok(o) => o,
            Err(e) => return fail(&formatter, "Failed to list objects", &e),
        }
    } else {
        targets.iter().map(RemotePath::object_path).collect()
    };

    if args.dry_run {
        for object in &objects {
            formatter.println(&format!("Would remove: {object}"));
        }
        return ExitCode::Success;
    }
    if objects.is_empty() {
        formatter.warning("Nothing to remove.");
        return ExitCode::Success;
    }

    match client.objects().delete_many(&objects).await {
        Ok(batch) => report(&formatter, batch, args.force),
        Err(e) => fail(&formatter, "Failed to remove objects", &e),
    }
}

/// Parse every path; all of them must name the same profile
fn parse_targets(paths: &[String]) -> Result<Vec<RemotePath>, String> {
    let targets = paths
        .iter()
        .map(|p| parse_remote(p).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(first) = targets.first() else {
        return Err("No path given".into());
    };
    if let Some(other) = targets.iter().find(|t| t.profile != first.profile) {
        return Err(format!(
            "All paths must use the same profile ('{}' and '{}')",
            first.profile, other.profile
        ));
    }
    if let Some(account) = targets.iter().find(|t| t.is_account()) {
        return Err(format!("'{account}' names an account, not an object"));
    }
    Ok(targets)
}

/// Replace each target by the objects found under it
async fn expand(client: &StorageClient, targets: &[RemotePath]) -> sw_core::Result<Vec<String>> {
    let mut objects = Vec::new();
    for target in targets {
        let options = ListOptions::default().with_prefix(target.key.clone());
        let entries = client
            .containers()
            .list_all_with(&target.container, options)
            .await?;
        objects.extend(
            entries
                .iter()
                .filter(|e| !e.is_dir())
                .map(|e| format!("{}/{}", target.container, e.name)),
        );
    }
    Ok(objects)
}

/// Split batch outcomes; with `force`, missing objects count as neither
fn summarize(batch: BatchDelete, force: bool) -> (RmOutput, ExitCode) {
    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut code = ExitCode::Success;

    for item in batch.into_items() {
        match item.outcome {
            Ok(_) => deleted.push(item.path),
            Err(Error::NotFound(_)) if force => {}
            Err(e) => {
                if code == ExitCode::Success {
                    code = ExitCode::from_error(&e);
                }
                failed.push(RmFailure {
                    path: item.path,
                    error: e.to_string(),
                });
            }
        }
    }

    let output = RmOutput {
        status: if failed.is_empty() { "success" } else { "partial" },
        total: deleted.len() + failed.len(),
        deleted,
        failed,
    };
    (output, code)
}

fn report(formatter: &Formatter, batch: BatchDelete, force: bool) -> ExitCode {
    let (output, code) = summarize(batch, force);
    if formatter.is_json() {
        formatter.json(&output);
        return code;
    }

    for path in &output.deleted {
        formatter.println(&format!("Removed: {path}"));
    }
    for failure in &output.failed {
        formatter.error(&format!("Failed to remove {}: {}", failure.path, failure.error));
    }
    if output.failed.is_empty() {
        formatter.success(&format!("Removed {} object(s).", output.deleted.len()));
    } else {
        formatter.warning(&format!(
            "Removed {} of {} object(s).",
            output.deleted.len(),
            output.total
        ));
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake_swift::FakeSwift;

    fn strings(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_parse_targets_same_profile() {
        let targets = parse_targets(&strings(&["ovh/docs/a.txt", "ovh/docs/b.txt"])).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].object_path(), "docs/b.txt");
    }

    #[test]
    fn test_parse_targets_rejects_mixed_profiles() {
        let err = parse_targets(&strings(&["ovh/docs/a.txt", "other/docs/b.txt"])).unwrap_err();
        assert!(err.contains("same profile"));
    }

    #[test]
    fn test_parse_targets_rejects_account() {
        assert!(parse_targets(&strings(&["ovh"])).is_err());
    }

    #[tokio::test]
    async fn test_expand_follows_every_page() {
        let swift = FakeSwift::new(
            &["logs/1", "logs/2", "logs/3", "logs/4", "logs/5", "other"],
            2,
        );
        let client = swift.client();
        let targets = vec![RemotePath::new("ovh", "docs", "logs/")];

        let objects = expand(&client, &targets).await.unwrap();
        assert_eq!(
            objects,
            vec!["docs/logs/1", "docs/logs/2", "docs/logs/3", "docs/logs/4", "docs/logs/5"]
        );
    }

    #[tokio::test]
    async fn test_summary_total_counts_failures() {
        let swift = FakeSwift::new(&["a.txt"], 10);
        let client = swift.client();
        let batch = client
            .objects()
            .delete_many(["docs/a.txt", "docs/missing.txt"])
            .await
            .unwrap();

        let (output, code) = summarize(batch, false);
        assert_eq!(output.deleted, vec!["docs/a.txt"]);
        assert_eq!(output.failed.len(), 1);
        assert_eq!(output.total, 2);
        assert_eq!(output.status, "partial");
        assert_eq!(code, ExitCode::NotFound);
        assert_eq!(swift.deleted(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_force_ignores_missing_objects() {
        let swift = FakeSwift::new(&["a.txt"], 10);
        let batch = swift
            .client()
            .objects()
            .delete_many(["docs/missing.txt"])
            .await
            .unwrap();

        let (output, code) = summarize(batch, true);
        assert_eq!(output.total, 0);
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_container_needs_recursive() {
        let args = RmArgs {
            paths: strings(&["ovh/docs"]),
            recursive: false,
            force: false,
            dry_run: false,
        };
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(execute(args, config).await, ExitCode::UsageError);
    }
}
