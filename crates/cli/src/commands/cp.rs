//! cp command - Copy objects
//!
//! Uploads local files, downloads objects, or copies objects server-side
//! within one account.

use std::path::{Component, Path, PathBuf};

use clap::Args;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use sw_core::{ListOptions, ObjectBody, ParsedPath, RemotePath, StorageClient, parse_path};
use tokio_util::io::ReaderStream;

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Copy objects
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path (local path or profile/container/key)
    pub source: String,

    /// Destination path (local path or profile/container/key)
    pub target: String,

    /// Copy directories and prefixes recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Continue on errors
    #[arg(long)]
    pub continue_on_error: bool,

    /// Only show what would be copied (dry run)
    #[arg(long)]
    pub dry_run: bool,

    /// Content type for uploaded files, guessed from the extension otherwise
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let source = match parse_path(&args.source) {
        Ok(p) => p,
        Err(e) => return usage(&formatter, &format!("Invalid source path: {e}")),
    };
    let target = match parse_path(&args.target) {
        Ok(p) => p,
        Err(e) => return usage(&formatter, &format!("Invalid target path: {e}")),
    };

    match (source, target) {
        (ParsedPath::Local(src), ParsedPath::Remote(dst)) => {
            upload(&src, &dst, &args, &formatter).await
        }
        (ParsedPath::Remote(src), ParsedPath::Local(dst)) => {
            download(&src, &dst, &args, &formatter).await
        }
        (ParsedPath::Remote(src), ParsedPath::Remote(dst)) => {
            copy_remote(&src, &dst, &args, &formatter).await
        }
        (ParsedPath::Local(_), ParsedPath::Local(_)) => usage(
            &formatter,
            "Cannot copy between two local paths. Use system cp command.",
        ),
    }
}

async fn upload(src: &Path, dst: &RemotePath, args: &CpArgs, formatter: &Formatter) -> ExitCode {
    if !src.exists() {
        formatter.error(&format!("Source not found: {}", src.display()));
        return ExitCode::NotFound;
    }
    if src.is_dir() && !args.recursive {
        return usage(
            formatter,
            "Source is a directory. Use -r/--recursive to copy directories.",
        );
    }
    if dst.is_account() {
        return usage(formatter, "Target must include a container");
    }

    let client = match connect(&dst.profile, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if src.is_file() {
        let target = if dst.key.is_empty() || dst.key.ends_with('/') {
            let filename = src.file_name().unwrap_or_default().to_string_lossy();
            dst.join(&filename)
        } else {
            dst.clone()
        };
        return upload_file(&client, src, &target, args, formatter).await;
    }

    let files = match walk_dir(src) {
        Ok(f) => f,
        Err(e) => {
            formatter.error(&format!("Failed to read directory: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let mut outcomes = Tally::default();
    for (file, relative) in files {
        let code = upload_file(&client, &file, &dst.join(&relative), args, formatter).await;
        if let Some(stop) = outcomes.record(code, args.continue_on_error) {
            return stop;
        }
    }
    outcomes.finish(formatter, "Uploaded")
}

async fn upload_file(
    client: &StorageClient,
    src: &Path,
    dst: &RemotePath,
    args: &CpArgs,
    formatter: &Formatter,
) -> ExitCode {
    let src_display = src.display().to_string();
    let dst_display = dst.to_string();

    if args.dry_run {
        formatter.println(&format!("Would copy: {src_display} -> {dst_display}"));
        return ExitCode::Success;
    }

    let file = match tokio::fs::File::open(src).await {
        Ok(f) => f,
        Err(e) => {
            formatter.error(&format!("Failed to read {src_display}: {e}"));
            return ExitCode::GeneralError;
        }
    };
    let size = match file.metadata().await {
        Ok(m) => m.len(),
        Err(e) => {
            formatter.error(&format!("Failed to read {src_display}: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let guessed_type = mime_guess::from_path(src)
        .first()
        .map(|m| m.essence_str().to_string());
    let content_type = args.content_type.as_deref().or(guessed_type.as_deref());

    let progress = ProgressBar::bytes(formatter.config(), Some(size), &src_display);
    let tracker = progress.clone();
    let stream = ReaderStream::new(file)
        .inspect_ok(move |chunk| tracker.inc(chunk.len() as u64))
        .boxed();

    let result = client
        .objects()
        .upload_with(
            ObjectBody::stream(stream),
            &dst.object_path(),
            content_type,
        )
        .await;
    progress.finish_and_clear();

    match result {
        Ok(_) => {
            report(formatter, src_display, dst_display, Some(size));
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to upload {src_display}"), &e),
    }
}

async fn download(src: &RemotePath, dst: &Path, args: &CpArgs, formatter: &Formatter) -> ExitCode {
    if src.is_account() {
        return usage(formatter, "Source must include a container");
    }

    let client = match connect(&src.profile, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    if src.key.is_empty() || src.key.ends_with('/') || args.recursive {
        return download_prefix(&client, src, dst, args, formatter).await;
    }

    let target = if dst.is_dir() || dst.to_string_lossy().ends_with('/') {
        let filename = src.key.rsplit('/').next().unwrap_or(&src.key);
        dst.join(filename)
    } else {
        dst.to_path_buf()
    };
    download_file(&client, src, &target, args, formatter).await
}

async fn download_file(
    client: &StorageClient,
    src: &RemotePath,
    dst: &Path,
    args: &CpArgs,
    formatter: &Formatter,
) -> ExitCode {
    let src_display = src.to_string();
    let dst_display = dst.display().to_string();

    if args.dry_run {
        formatter.println(&format!("Would copy: {src_display} -> {dst_display}"));
        return ExitCode::Success;
    }

    if let Some(parent) = dst.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        formatter.error(&format!("Failed to create directory: {e}"));
        return ExitCode::GeneralError;
    }

    let progress = ProgressBar::bytes(formatter.config(), None, &src_display);
    let result = client
        .objects()
        .download_with(&src.object_path(), dst, |n| progress.inc(n))
        .await;
    progress.finish_and_clear();

    match result {
        Ok(size) => {
            report(formatter, src_display, dst_display, Some(size));
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to download {src_display}"), &e),
    }
}

async fn download_prefix(
    client: &StorageClient,
    src: &RemotePath,
    dst: &Path,
    args: &CpArgs,
    formatter: &Formatter,
) -> ExitCode {
    let mut options = ListOptions::default();
    if !src.key.is_empty() {
        options = options.with_prefix(src.key.clone());
    }
    let entries = match client.containers().list_all_with(&src.container, options).await {
        Ok(e) => e,
        Err(e) => return fail(formatter, "Failed to list objects", &e),
    };

    let mut outcomes = Tally::default();
    for entry in entries.iter().filter(|e| !e.is_dir()) {
        let Some(target) = local_target(dst, &src.key, &entry.name) else {
            formatter.warning(&format!(
                "Skipping '{}': no local path for it under {}",
                entry.name,
                dst.display()
            ));
            outcomes.record(ExitCode::GeneralError, true);
            continue;
        };
        let object = RemotePath::new(&src.profile, &src.container, &entry.name);

        let code = download_file(client, &object, &target, args, formatter).await;
        if let Some(stop) = outcomes.record(code, args.continue_on_error) {
            return stop;
        }
    }
    outcomes.finish(formatter, "Downloaded")
}

async fn copy_remote(
    src: &RemotePath,
    dst: &RemotePath,
    args: &CpArgs,
    formatter: &Formatter,
) -> ExitCode {
    if src.profile != dst.profile {
        return usage(
            formatter,
            "Server-side copy needs both paths in the same profile. Download and upload instead.",
        );
    }
    if src.key.is_empty() || dst.is_account() {
        return usage(formatter, "Copy needs an object source and a container target");
    }

    let target = if dst.key.is_empty() || dst.key.ends_with('/') {
        let filename = src.key.rsplit('/').next().unwrap_or(&src.key);
        dst.join(filename)
    } else {
        dst.clone()
    };

    if args.dry_run {
        formatter.println(&format!("Would copy: {src} -> {target}"));
        return ExitCode::Success;
    }

    let client = match connect(&src.profile, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client
        .objects()
        .copy(&src.object_path(), &target.object_path())
        .await
    {
        Ok(_) => {
            report(formatter, src.to_string(), target.to_string(), None);
            ExitCode::Success
        }
        Err(e) => fail(formatter, "Failed to copy", &e),
    }
}

fn report(formatter: &Formatter, source: String, target: String, size: Option<u64>) {
    let size_human = size.map(|s| humansize::format_size(s, humansize::BINARY));
    if formatter.is_json() {
        formatter.json(&CpOutput {
            status: "success",
            source,
            target,
            size_bytes: size,
            size_human,
        });
    } else {
        match size_human {
            Some(human) => formatter.println(&format!("{source} -> {target} ({human})")),
            None => formatter.println(&format!("{source} -> {target}")),
        }
    }
}

/// Success/failure counts of a multi-file transfer
#[derive(Debug, Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
}

impl Tally {
    /// Record one outcome; returns the code to stop with, if any
    fn record(&mut self, code: ExitCode, continue_on_error: bool) -> Option<ExitCode> {
        if code == ExitCode::Success {
            self.succeeded += 1;
            return None;
        }
        self.failed += 1;
        (!continue_on_error).then_some(code)
    }

    fn finish(&self, formatter: &Formatter, verb: &str) -> ExitCode {
        if self.failed > 0 {
            formatter.warning(&format!(
                "Completed with errors: {} succeeded, {} failed",
                self.succeeded, self.failed
            ));
            ExitCode::GeneralError
        } else if self.succeeded == 0 {
            formatter.warning("Nothing to copy.");
            ExitCode::Success
        } else {
            formatter.success(&format!("{verb} {} file(s).", self.succeeded));
            ExitCode::Success
        }
    }
}

/// Local file for `key` below `root`, once `prefix` is stripped
///
/// Keys come from the server; any that would resolve outside `root` (`..`,
/// absolute, drive prefixes) or to `root` itself yield `None`.
fn local_target(root: &Path, prefix: &str, key: &str) -> Option<PathBuf> {
    let relative = key.strip_prefix(prefix).unwrap_or(key).trim_start_matches('/');
    let relative = Path::new(relative);
    let inside = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    let names_file = relative
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    (inside && names_file).then(|| root.join(relative))
}

/// Every file under `root` with its '/'-separated relative path
fn walk_dir(root: &Path) -> std::io::Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                let relative = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                files.push((path, relative));
            }
        }
    }
    files.sort();
    Ok(files)
}
