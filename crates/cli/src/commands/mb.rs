//! mb command - Make container
//!
//! Creates a container, optionally readable by anyone or served as a
//! static website.

use clap::Args;
use serde::Serialize;
use sw_core::{StaticPages, Visibility, parse_remote};

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a container
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Target path (profile/container)
    pub target: String,

    /// Ignore error if the container already exists
    #[arg(short = 'p', long)]
    pub ignore_existing: bool,

    /// Allow anonymous reads and listings
    #[arg(long, conflicts_with = "static_site")]
    pub public: bool,

    /// Serve the container as a static website (implies public)
    #[arg(long = "static")]
    pub static_site: bool,

    /// Index page of the static website
    #[arg(long, requires = "static_site", default_value = "index.html")]
    pub index: String,

    /// Error page of the static website
    #[arg(long, requires = "static_site", default_value = "error.html")]
    pub error_page: String,

    /// Stylesheet of generated listings
    #[arg(long, requires = "static_site", default_value = "listing.css")]
    pub listings_css: String,
}

impl MbArgs {
    fn visibility(&self) -> Visibility {
        if self.static_site {
            Visibility::Static(StaticPages {
                index: self.index.clone(),
                error: self.error_page.clone(),
                listings_css: self.listings_css.clone(),
            })
        } else if self.public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    container: String,
    visibility: &'static str,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, output_config: OutputConfig) -> ExitCode {
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

    let containers = client.containers();
    if !args.ignore_existing {
        match containers.exist(&path.container).await {
            Ok(true) => {
                formatter.error(&format!("Container '{}' already exists", path.container));
                return ExitCode::Conflict;
            }
            Ok(false) => {}
            Err(e) => return fail(&formatter, "Failed to check container", &e),
        }
    }

    let visibility = args.visibility();
    let label = visibility_label(&visibility);
    match containers.create(&path.container, visibility).await {
        Ok(_) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    container: path.to_string(),
                    visibility: label,
                });
            } else {
                formatter.success(&format!("Container '{path}' created ({label})."));
            }
            ExitCode::Success
        }
        Err(e) => fail(&formatter, "Failed to create container", &e),
    }
}

fn visibility_label(visibility: &Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Private => "private",
        Visibility::Static(_) => "static",
    }
}
