//! session command - Authenticate and show the negotiated session

use clap::Args;
use serde::Serialize;
use sw_core::auth::ConnectionDetails;

use super::connect;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Authenticate and show the negotiated session
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Profile name
    pub profile: String,

    /// Print the token in full
    #[arg(long)]
    pub show_token: bool,
}

#[derive(Debug, Serialize)]
struct SessionOutput {
    profile: String,
    #[serde(flatten)]
    details: ConnectionDetails,
}

/// Execute the session command
pub async fn execute(args: SessionArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match connect(&args.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut details = client.connection_details();
    if !args.show_token {
        details.token = mask(&details.token);
    }

    if formatter.is_json() {
        formatter.json(&SessionOutput {
            profile: args.profile,
            details,
        });
    } else {
        formatter.table(
            &["Field", "Value"],
            vec![
                vec!["Profile".into(), args.profile],
                vec!["Endpoint".into(), details.endpoint.url],
                vec!["Region".into(), details.endpoint.region],
                vec!["Interface".into(), details.endpoint.interface.to_string()],
                vec!["Connected at (UTC)".into(), details.connected_at],
                vec!["Token".into(), details.token],
            ],
        );
    }
    ExitCode::Success
}

/// Keep the first four characters of a token
fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("gAAAAABsecret"), "gAAA…");
        assert_eq!(mask("ab"), "ab…");
    }
}
