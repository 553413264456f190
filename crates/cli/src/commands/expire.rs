//! expire command - Schedule an object for deletion
//!
//! The server removes the object at the given time, or after the given
//! number of seconds.

use clap::{ArgGroup, Args};
use jiff::Timestamp;
use serde::Serialize;
use sw_core::parse_remote;

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Schedule an object for deletion
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("when").required(true).args(["at", "after"])))]
pub struct ExpireArgs {
    /// Object path (profile/container/key)
    pub path: String,

    /// Absolute deletion time, RFC 3339 (e.g., "2030-01-01T00:00:00Z")
    #[arg(long)]
    pub at: Option<Timestamp>,

    /// Delay before deletion, in seconds
    #[arg(long)]
    pub after: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ExpireOutput {
    status: &'static str,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_after: Option<u64>,
}

/// Execute the expire command
pub async fn execute(args: ExpireArgs, output_config: OutputConfig) -> ExitCode {
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

    let objects = client.objects();
    let object = path.object_path();
    let (result, message) = match (args.at, args.after) {
        (Some(at), _) => (
            objects.expire_at(&object, at).await,
            format!("{path} will be deleted at {at}"),
        ),
        (None, Some(seconds)) => (
            objects.expire_after(&object, seconds).await,
            format!("{path} will be deleted in {seconds}s"),
        ),
        (None, None) => return usage(&formatter, "Either --at or --after is required"),
    };

    match result {
        Ok(_) => {
            if formatter.is_json() {
                formatter.json(&ExpireOutput {
                    status: "success",
                    target: path.to_string(),
                    delete_at: args.at.map(|t| t.as_second()),
                    delete_after: args.after,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => fail(&formatter, "Failed to schedule expiry", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ExpireArgs,
    }

    #[test]
    fn test_parse_at() {
        let wrapper =
            Wrapper::try_parse_from(["expire", "ovh/docs/a", "--at", "2030-01-01T00:00:00Z"])
                .unwrap();
        assert_eq!(wrapper.args.at.unwrap().as_second(), 1_893_456_000);
        assert!(wrapper.args.after.is_none());
    }

    #[test]
    fn test_parse_after() {
        let wrapper = Wrapper::try_parse_from(["expire", "ovh/docs/a", "--after", "3600"]).unwrap();
        assert_eq!(wrapper.args.after, Some(3600));
    }

    #[test]
    fn test_at_and_after_are_exclusive() {
        let result = Wrapper::try_parse_from([
            "expire",
            "ovh/docs/a",
            "--at",
            "2030-01-01T00:00:00Z",
            "--after",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_one_of_at_or_after_required() {
        assert!(Wrapper::try_parse_from(["expire", "ovh/docs/a"]).is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        assert!(Wrapper::try_parse_from(["expire", "ovh/docs/a", "--at", "tomorrow"]).is_err());
    }
}
