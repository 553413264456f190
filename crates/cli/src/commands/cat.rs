//! cat command - Display object contents
//!
//! Writes the whole object to stdout, bytes untouched.

use clap::Args;
use std::io::{self, Write};
use sw_core::parse_remote;

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Display object contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object path (profile/container/key)
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_remote(&args.path) {
        Ok(p) if !p.key.is_empty() => p,
        Ok(_) => return usage(&formatter, "Path must include an object key"),
        Err(e) => return usage(&formatter, &e.to_string()),
    };

    let client = match connect(&path.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let object = match client.objects().get(&path.object_path()).await {
        Ok(o) => o,
        Err(e) => return fail(&formatter, "Failed to read object", &e),
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(&object.content).and_then(|()| stdout.flush()) {
        formatter.error(&format!("Failed to write to stdout: {e}"));
        return ExitCode::GeneralError;
    }
    ExitCode::Success
}
