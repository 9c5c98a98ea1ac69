use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Environment variable names
pub mod env_vars {
    /// Workspace to open at startup, same as `--workspace`.
    pub const WORKSPACE: &str = "GRADEBOOKD_WORKSPACE";
    /// Log filter directives, same as `--log-filter`. `RUST_LOG` is read after this.
    pub const LOG: &str = "GRADEBOOKD_LOG";
    pub const RUST_LOG: &str = "RUST_LOG";
}

pub mod defaults {
    pub const LOG_FILTER: &str = "gradebookd=info";
}

#[derive(Debug, Parser)]
#[command(name = "gradebookd", version, about = "Gradebook sidecar speaking JSON lines on stdio")]
pub struct Cli {
    /// Workspace directory to open before reading requests
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// tracing filter directives (logs go to stderr)
    #[arg(long)]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Flags win over environment, environment over defaults.
    pub fn resolve(cli: Cli) -> Self {
        let workspace = cli
            .workspace
            .or_else(|| non_empty_env(env_vars::WORKSPACE).map(PathBuf::from));
        let log_filter = cli
            .log_filter
            .or_else(|| non_empty_env(env_vars::LOG))
            .or_else(|| non_empty_env(env_vars::RUST_LOG))
            .unwrap_or_else(|| defaults::LOG_FILTER.to_string());
        Self {
            workspace,
            log_filter,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
