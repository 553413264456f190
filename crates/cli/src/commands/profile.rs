//! Profile management commands
//!
//! Profiles are named storage accounts: identity endpoint, credentials,
//! region and authentication scheme.

use clap::Subcommand;
use serde::Serialize;
use sw_core::profile::RetryConfig;
use sw_core::{AuthScheme, Error, Interface, Profile, ProfileManager};

use super::{fail, usage};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (letters, digits, '-' and '_')
    pub name: String,

    /// Identity service URL (e.g., "https://auth.cloud.ovh.net/v3")
    pub auth_url: String,

    /// User name
    pub username: String,

    /// Password
    #[arg(long, env = "SWC_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Region of the storage endpoint (e.g., "GRA")
    #[arg(long)]
    pub region: String,

    /// Tenant (project) id, required with --auth-scheme v2
    #[arg(long)]
    pub tenant_id: Option<String>,

    /// User domain for v3 authentication
    #[arg(long, default_value = "Default")]
    pub domain: String,

    /// Authentication scheme: v2 or v3
    #[arg(long, default_value = "v3")]
    pub auth_scheme: String,

    /// Endpoint interface: public, internal or admin
    #[arg(long, default_value = "public")]
    pub interface: String,

    /// Attempts for downloads whose body arrives incomplete
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

/// Arguments for the `profile list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// Profile information for output, without the password
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    auth_url: String,
    username: String,
    region: String,
    auth_scheme: AuthScheme,
    interface: Interface,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            auth_url: profile.auth_url.clone(),
            username: profile.username.clone(),
            region: profile.region.clone(),
            auth_scheme: profile.auth_scheme,
            interface: profile.interface,
            tenant_id: profile.tenant_id.clone(),
        }
    }
}

#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match ProfileManager::new() {
        Ok(m) => m,
        Err(e) => return fail(&formatter, "Failed to load profiles", &e),
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List(args) => execute_list(args, &manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profile = match build_profile(args) {
        Ok(p) => p,
        Err(msg) => return usage(formatter, &msg),
    };
    let name = profile.name.clone();

    match manager.set(profile) {
        Ok(()) => {
            report(formatter, &name, format!("Profile '{name}' configured successfully"));
            ExitCode::Success
        }
        Err(e) => fail(formatter, "Failed to save profile", &e),
    }
}

fn execute_list(args: ListArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(p) => p,
        Err(e) => return fail(formatter, "Failed to load profiles", &e),
    };

    if formatter.is_json() {
        formatter.json(&ProfileListOutput {
            profiles: profiles.iter().map(ProfileInfo::from).collect(),
        });
    } else if profiles.is_empty() {
        formatter.println("No profiles configured.");
    } else if args.long {
        for p in &profiles {
            formatter.println(&format!(
                "{:<12} {} (user: {}, region: {}, auth: {}, interface: {})",
                p.name,
                p.auth_url,
                p.username,
                p.region,
                p.auth_scheme,
                p.interface
            ));
        }
    } else {
        for p in &profiles {
            formatter.println(&format!("{:<12} {} {}", p.name, p.region, p.auth_url));
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            report(
                formatter,
                &args.name,
                format!("Profile '{}' removed successfully", args.name),
            );
            ExitCode::Success
        }
        Err(Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => fail(formatter, "Failed to remove profile", &e),
    }
}

fn report(formatter: &Formatter, name: &str, message: String) {
    if formatter.is_json() {
        formatter.json(&ProfileOperationOutput {
            success: true,
            profile: name.to_string(),
            message,
        });
    } else {
        formatter.success(&message);
    }
}

fn build_profile(args: SetArgs) -> Result<Profile, String> {
    if !sw_core::path::is_valid_profile_name(&args.name) {
        return Err(format!(
            "Invalid profile name '{}': use letters, digits, '-' and '_'",
            args.name
        ));
    }
    if args.auth_url.is_empty() {
        return Err("Auth URL cannot be empty".into());
    }
    if args.region.is_empty() {
        return Err("Region cannot be empty".into());
    }

    let auth_scheme = match args.auth_scheme.as_str() {
        "v2" => AuthScheme::V2,
        "v3" => AuthScheme::V3,
        _ => return Err("Auth scheme must be 'v2' or 'v3'".into()),
    };
    if auth_scheme == AuthScheme::V2 && args.tenant_id.is_none() {
        return Err("--tenant-id is required with --auth-scheme v2".into());
    }

    let interface = match args.interface.as_str() {
        "public" => Interface::Public,
        "internal" => Interface::Internal,
        "admin" => Interface::Admin,
        _ => return Err("Interface must be 'public', 'internal' or 'admin'".into()),
    };

    if args.max_attempts == Some(0) {
        return Err("--max-attempts must be at least 1".into());
    }

    let mut profile = Profile::new(
        args.name,
        args.auth_url,
        args.username,
        args.password,
        args.region,
    );
    profile.tenant_id = args.tenant_id;
    profile.domain = args.domain;
    profile.auth_scheme = auth_scheme;
    profile.interface = interface;
    profile.retry = args
        .max_attempts
        .map(|max_attempts| RetryConfig { max_attempts });
    Ok(profile)
}
