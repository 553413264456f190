//! pipe command - Stream stdin to an object
//!
//! Reads stdin until EOF and streams it to the object without buffering the
//! whole input. Useful for piping output from other commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Args;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use sw_core::{ObjectBody, parse_remote};
use tokio_util::io::ReaderStream;

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Stream stdin to an object
#[derive(Args, Debug)]
pub struct PipeArgs {
    /// Destination path (profile/container/key)
    pub target: String,

    /// Content type for the uploaded object
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
struct PipeOutput {
    status: &'static str,
    target: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the pipe command
pub async fn execute(args: PipeArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_remote(&args.target) {
        Ok(p) if !p.key.is_empty() && !p.key.ends_with('/') => p,
        Ok(_) => return usage(&formatter, "Object key is required for pipe command."),
        Err(e) => return usage(&formatter, &e.to_string()),
    };

    let client = match connect(&path.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let received = Arc::new(AtomicU64::new(0));
    let progress = ProgressBar::bytes(formatter.config(), None, "Uploading from stdin");
    let (counter, tracker) = (received.clone(), progress.clone());
    let stream = ReaderStream::new(tokio::io::stdin())
        .inspect_ok(move |chunk| {
            counter.fetch_add(chunk.len() as u64, Ordering::Relaxed);
            tracker.inc(chunk.len() as u64);
        })
        .boxed();

    let result = client
        .objects()
        .upload_with(
            ObjectBody::stream(stream),
            &path.object_path(),
            Some(args.content_type.as_str()),
        )
        .await;
    progress.finish_and_clear();

    if let Err(e) = result {
        return fail(&formatter, "Failed to upload", &e);
    }

    let size = received.load(Ordering::Relaxed);
    let size_human = humansize::format_size(size, humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&PipeOutput {
            status: "success",
            target: path.to_string(),
            size_bytes: size,
            size_human,
        });
    } else {
        formatter.success(&format!("Uploaded {size_human} to {path}"));
    }
    ExitCode::Success
}
