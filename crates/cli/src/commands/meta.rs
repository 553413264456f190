//! meta commands - Read and write metadata
//!
//! The path decides the scope: a bare profile targets the account, a
//! container path its container and a full path its object.

use std::collections::BTreeMap;

use clap::Subcommand;
use serde::Serialize;
use sw_core::{MetaScope, MetadataStore, RemotePath, StorageClient, parse_remote};

use super::{connect, fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Metadata subcommands
#[derive(Subcommand, Debug)]
pub enum MetaCommands {
    /// Show one metadata value
    Get {
        /// Remote path (profile, profile/container or profile/container/key)
        path: String,
        /// Metadata key
        key: String,
    },

    /// Set a metadata value
    Set {
        /// Remote path (profile, profile/container or profile/container/key)
        path: String,
        /// Metadata key
        key: String,
        /// Value to store
        value: String,
    },

    /// Remove a metadata key
    Rm {
        /// Remote path (profile, profile/container or profile/container/key)
        path: String,
        /// Metadata key
        key: String,
    },

    /// List all metadata
    List {
        /// Remote path (profile, profile/container or profile/container/key)
        path: String,
    },
}

impl MetaCommands {
    fn path(&self) -> &str {
        match self {
            Self::Get { path, .. }
            | Self::Set { path, .. }
            | Self::Rm { path, .. }
            | Self::List { path } => path,
        }
    }
}

#[derive(Debug, Serialize)]
struct MetaValueOutput<'a> {
    target: String,
    key: &'a str,
    value: Option<String>,
}

#[derive(Debug, Serialize)]
struct MetaListOutput {
    target: String,
    metadata: BTreeMap<String, String>,
}

/// Execute a meta subcommand
pub async fn execute(cmd: MetaCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_remote(cmd.path().trim_end_matches('/')) {
        Ok(p) => p,
        Err(e) => return usage(&formatter, &e.to_string()),
    };

    let client = match connect(&path.profile, &formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    dispatch(&client, &path, cmd, &formatter).await
}

async fn dispatch(
    client: &StorageClient,
    path: &RemotePath,
    cmd: MetaCommands,
    formatter: &Formatter,
) -> ExitCode {
    if path.is_account() {
        run(client.account().metas(), "", path, cmd, formatter).await
    } else if path.is_container() {
        run(client.containers().metas(), &path.container, path, cmd, formatter).await
    } else {
        let target = path.object_path();
        run(client.objects().metas(), &target, path, cmd, formatter).await
    }
}

async fn run<S: MetaScope>(
    store: MetadataStore<S>,
    target: &str,
    path: &RemotePath,
    cmd: MetaCommands,
    formatter: &Formatter,
) -> ExitCode {
    match cmd {
        MetaCommands::Get { key, .. } => match store.get(target, &key).await {
            Ok(value) => {
                if formatter.is_json() {
                    formatter.json(&MetaValueOutput {
                        target: path.to_string(),
                        key: &key,
                        value,
                    });
                    return ExitCode::Success;
                }
                match value {
                    Some(v) => {
                        formatter.println(&v);
                        ExitCode::Success
                    }
                    None => {
                        formatter.error(&format!("No metadata '{key}' on {path}"));
                        ExitCode::NotFound
                    }
                }
            }
            Err(e) => fail(formatter, "Failed to read metadata", &e),
        },
        MetaCommands::Set { key, value, .. } => match store.create(target, &key, &value).await {
            Ok(_) => {
                formatter.success(&format!("Set '{key}' on {path}"));
                ExitCode::Success
            }
            Err(e) => fail(formatter, "Failed to set metadata", &e),
        },
        MetaCommands::Rm { key, .. } => match store.delete(target, &key).await {
            Ok(_) => {
                formatter.success(&format!("Removed '{key}' from {path}"));
                ExitCode::Success
            }
            Err(e) => fail(formatter, "Failed to remove metadata", &e),
        },
        MetaCommands::List { .. } => match store.all(target).await {
            Ok(metadata) => {
                if formatter.is_json() {
                    formatter.json(&MetaListOutput {
                        target: path.to_string(),
                        metadata,
                    });
                } else if metadata.is_empty() {
                    formatter.println(&format!("No metadata on {path}"));
                } else {
                    formatter.table(
                        &["Key", "Value"],
                        metadata.into_iter().map(|(k, v)| vec![k, v]).collect(),
                    );
                }
                ExitCode::Success
            }
            Err(e) => fail(formatter, "Failed to list metadata", &e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        cmd: MetaCommands,
    }

    #[test]
    fn test_parse_set() {
        let wrapper =
            Wrapper::try_parse_from(["meta", "set", "ovh/docs", "color", "blue"]).unwrap();
        match wrapper.cmd {
            MetaCommands::Set { path, key, value } => {
                assert_eq!(path, "ovh/docs");
                assert_eq!(key, "color");
                assert_eq!(value, "blue");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_path_of_every_subcommand() {
        for argv in [
            vec!["meta", "get", "ovh", "k"],
            vec!["meta", "rm", "ovh", "k"],
            vec!["meta", "list", "ovh"],
        ] {
            let wrapper = Wrapper::try_parse_from(argv).unwrap();
            assert_eq!(wrapper.cmd.path(), "ovh");
        }
    }

    #[test]
    fn test_set_requires_value() {
        assert!(Wrapper::try_parse_from(["meta", "set", "ovh/docs", "color"]).is_err());
    }
}
