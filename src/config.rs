//! Configuration and CLI argument parsing for deployfast
//!
//! Connection settings come from `deployfast.json` (current directory first,
//! then the home directory) and can be overridden on the command line or
//! through `DEPLOYFAST_*` environment variables.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use directories::BaseDirs;
use serde::Deserialize;

use crate::error::{DeployError, Result};
use crate::runner::{ExecutionPolicy, ScriptJob};
use crate::ssh::{staging_path_for, HostKeyPolicy, SshConfig};

/// Name of the configuration file searched for on startup
pub const CONFIG_FILE_NAME: &str = "deployfast.json";

/// Default directory local scripts are resolved against
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Script run by the `provision` command
pub const PROVISION_SCRIPT: &str = "provision.sh";

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// deployfast CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "deployfast")]
#[command(version)]
#[command(about = "DeployFast is a CLI tool for SSH operations")]
#[command(long_about = "Provision remote servers and publish applications by uploading and running shell scripts over SSH.")]
pub struct Args {
    /// Path to the JSON configuration file
    #[arg(long, global = true, env = "DEPLOYFAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// SSH host (overrides the configuration file)
    #[arg(long, global = true, env = "DEPLOYFAST_HOST")]
    pub host: Option<String>,

    /// SSH username (overrides the configuration file)
    #[arg(long, global = true, env = "DEPLOYFAST_USER")]
    pub user: Option<String>,

    /// SSH port (overrides the configuration file)
    #[arg(long, global = true, env = "DEPLOYFAST_PORT")]
    pub port: Option<u16>,

    /// SSH password; prompted for on the terminal when absent
    #[arg(long, global = true, env = "DEPLOYFAST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// How the server's host key is verified
    #[arg(long, global = true, value_enum, env = "DEPLOYFAST_HOST_KEY_POLICY")]
    pub host_key_policy: Option<HostKeyPolicy>,

    /// known_hosts file used for host key verification (default: ~/.ssh/known_hosts)
    #[arg(long, global = true, env = "DEPLOYFAST_KNOWN_HOSTS")]
    pub known_hosts: Option<PathBuf>,

    /// Directory local scripts are resolved against
    #[arg(long, global = true, default_value = DEFAULT_TEMPLATES_DIR, env = "DEPLOYFAST_TEMPLATES")]
    pub templates_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Provision the remote server
    Provision {
        /// Execution policy for the provision script
        #[arg(long, value_enum, default_value_t = ExecutionPolicy::Streamed)]
        policy: ExecutionPolicy,
    },
    /// Upload and run a script from the templates directory
    Run {
        /// Script path, relative to the templates directory
        script: PathBuf,

        /// Remote staging path (default: /tmp/<script file name>)
        #[arg(long)]
        remote_path: Option<String>,

        /// Execution policy for the script
        #[arg(long, value_enum, default_value_t = ExecutionPolicy::Streamed)]
        policy: ExecutionPolicy,
    },
}

/// `ssh` section of the configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileSshConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub host_key_policy: Option<String>,
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
}

/// Contents of `deployfast.json`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default)]
    pub ssh: FileSshConfig,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl FileConfig {
    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DeployError::config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// First existing file among `candidates`
    pub fn discover(candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates.iter().find(|p| p.is_file()).cloned()
    }

    /// Default search order: `./deployfast.json`, then `~/deployfast.json`
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dirs) = BaseDirs::new() {
            paths.push(dirs.home_dir().join(CONFIG_FILE_NAME));
        }
        paths
    }
}

/// Parsed and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SSH host
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username
    pub user: String,

    /// SSH password given up front (None = prompt)
    pub password: Option<String>,

    /// Host key verification policy
    pub host_key_policy: HostKeyPolicy,

    /// known_hosts override
    pub known_hosts: Option<PathBuf>,

    /// Directory scripts are resolved against
    pub templates_dir: PathBuf,

    /// Repository to publish, from the configuration file
    pub repository: Option<String>,

    /// Application name, from the configuration file
    pub app_name: Option<String>,

    /// Configuration file that was loaded, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// Create Config from CLI Args, loading the configuration file if present
    pub fn from_args(args: &Args) -> Result<Self> {
        let source = match &args.config {
            Some(path) => Some(path.clone()),
            None => FileConfig::discover(&FileConfig::default_locations()),
        };

        let file = match &source {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Self::merge(args, file, source)
    }

    /// Combine CLI values with file values; CLI wins
    pub fn merge(args: &Args, file: FileConfig, source: Option<PathBuf>) -> Result<Self> {
        let mut errors = Vec::new();

        let host = args.host.clone().or(file.ssh.host).unwrap_or_default();
        if host.is_empty() {
            errors.push(
                "Missing SSH host (set ssh.host in the config file or pass --host)".to_string(),
            );
        }

        let user = args.user.clone().or(file.ssh.user).unwrap_or_default();
        if user.is_empty() {
            errors.push(
                "Missing SSH user (set ssh.user in the config file or pass --user)".to_string(),
            );
        }

        let port = args.port.or(file.ssh.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            errors.push("SSH port must be between 1 and 65535".to_string());
        }

        let host_key_policy = match (args.host_key_policy, file.ssh.host_key_policy) {
            (Some(policy), _) => policy,
            (None, Some(name)) => match name.parse::<HostKeyPolicy>() {
                Ok(policy) => policy,
                Err(e) => {
                    errors.push(e.to_string());
                    HostKeyPolicy::default()
                }
            },
            (None, None) => HostKeyPolicy::default(),
        };

        if !errors.is_empty() {
            let origin = source
                .as_ref()
                .map(|p| format!(" (config file: {})", p.display()))
                .unwrap_or_default();
            return Err(DeployError::config(format!(
                "Invalid configuration{}:\n{}",
                origin,
                errors.join("\n")
            )));
        }

        Ok(Config {
            host,
            port,
            user,
            password: sanitize_password(args.password.clone()),
            host_key_policy,
            known_hosts: args.known_hosts.clone().or(file.ssh.known_hosts),
            templates_dir: args.templates_dir.clone(),
            repository: file.repository,
            app_name: file.app_name,
            source,
        })
    }

    /// Connection parameters for the session
    pub fn ssh_config(&self) -> SshConfig {
        let config = SshConfig::new(&self.host, &self.user)
            .with_port(self.port)
            .with_host_key_policy(self.host_key_policy);
        match &self.known_hosts {
            Some(path) => config.with_known_hosts(path),
            None => config,
        }
    }

    /// Resolve a script name against the templates directory
    pub fn script_path(&self, script: &Path) -> PathBuf {
        if script.is_absolute() {
            script.to_path_buf()
        } else {
            self.templates_dir.join(script)
        }
    }

    /// Build the job and execution policy for a CLI command
    pub fn job_for(&self, command: &Command) -> Result<(ScriptJob, ExecutionPolicy)> {
        match command {
            Command::Provision { policy } => {
                let local = self.script_path(Path::new(PROVISION_SCRIPT));
                let remote = staging_path_for(&local)?;
                Ok((ScriptJob::new(local, remote), *policy))
            }
            Command::Run {
                script,
                remote_path,
                policy,
            } => {
                let local = self.script_path(script);
                let remote = match remote_path {
                    Some(path) => path.clone(),
                    None => staging_path_for(&local)?,
                };
                Ok((ScriptJob::new(local, remote), *policy))
            }
        }
    }
}

/// Sanitize password: return None if empty
fn sanitize_password(password: Option<String>) -> Option<String> {
    password.filter(|p| !p.is_empty())
}
