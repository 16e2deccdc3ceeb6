//! Configuration management for the prompt catalog.
//!
//! Command-line arguments are parsed once in `main` and converted into an
//! immutable [`Config`]; nothing below the binary reads argv or the
//! environment.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default host for the remote repository backend.
pub const DEFAULT_HOST: &str = "https://raw.githubusercontent.com";

/// Default git ref for the remote repository backend.
pub const DEFAULT_REF: &str = "heads/main";

/// Command-line arguments for the prompt catalog server.
#[derive(Parser, Debug, Clone)]
#[command(name = "prompt-catalog")]
#[command(author = "Prompt Catalog Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server exposing a manifest-driven catalog of resources and prompts")]
pub struct Args {
    /// Repository backend: filesystem or github
    #[arg(long = "repository-type", env = "PROMPT_CATALOG_REPOSITORY_TYPE")]
    pub repository_type: RepositoryType,

    /// Catalog root directory (filesystem) or sub-path inside the repository (github)
    #[arg(long, env = "PROMPT_CATALOG_PATH")]
    pub path: Option<String>,

    /// Repository owner (github)
    #[arg(long, env = "PROMPT_CATALOG_USER")]
    pub user: Option<String>,

    /// Repository owner; ignored when --user is also given (github)
    #[arg(long, env = "PROMPT_CATALOG_ORGANISATION")]
    pub organisation: Option<String>,

    /// Repository name (github)
    #[arg(long, env = "PROMPT_CATALOG_REPOSITORY")]
    pub repository: Option<String>,

    /// Git ref, e.g. heads/main or tags/v1 (github)
    #[arg(long = "ref", default_value = DEFAULT_REF, env = "PROMPT_CATALOG_REF")]
    pub git_ref: String,

    /// Raw content host (github)
    #[arg(long, default_value = DEFAULT_HOST, env = "PROMPT_CATALOG_HOST")]
    pub host: String,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long = "log-level", default_value = "info", env = "PROMPT_CATALOG_LOG_LEVEL")]
    pub log_level: String,

    /// Enable debug logging (overrides --log-level)
    #[arg(short, long, env = "PROMPT_CATALOG_DEBUG")]
    pub debug: bool,
}

/// Repository backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    Filesystem,
    Github,
}

/// Settings for the local directory backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// Catalog root; holds `index.json`, `resources/` and `prompts/`.
    pub path: PathBuf,
}

/// Settings for the remote versioned-tree backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
    pub repository: String,
    #[serde(default = "default_ref", rename = "ref")]
    pub git_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_ref() -> String {
    DEFAULT_REF.to_string()
}

impl GithubConfig {
    /// Config for `owner/repository` with the default host and ref.
    pub fn new(user: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            user: Some(user.into()),
            organisation: None,
            repository: repository.into(),
            git_ref: default_ref(),
            path: None,
        }
    }

    /// Repository owner. `user` wins over `organisation` when both are set.
    pub fn owner(&self) -> Option<&str> {
        let present = |owner: &&str| !owner.is_empty();
        self.user
            .as_deref()
            .filter(present)
            .or_else(|| self.organisation.as_deref().filter(present))
    }
}

/// Which backend to construct, and its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepositoryConfig {
    Filesystem(FilesystemConfig),
    Github(GithubConfig),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Content repository backend
    pub repository: RepositoryConfig,
    /// Tracing filter directive
    pub log_level: String,
}

impl TryFrom<Args> for Config {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let log_level = if args.debug {
            "debug".to_string()
        } else {
            args.log_level
        };

        let repository = match args.repository_type {
            RepositoryType::Filesystem => {
                let path = args.path.filter(|p| !p.is_empty()).ok_or_else(|| {
                    Error::Config("--path is required for the filesystem repository".to_string())
                })?;
                RepositoryConfig::Filesystem(FilesystemConfig {
                    path: PathBuf::from(path),
                })
            }
            RepositoryType::Github => {
                let repository = args.repository.filter(|r| !r.is_empty()).ok_or_else(|| {
                    Error::Config("--repository is required for the github repository".to_string())
                })?;
                let github = GithubConfig {
                    host: args.host,
                    user: args.user,
                    organisation: args.organisation,
                    repository,
                    git_ref: args.git_ref,
                    path: args.path,
                };
                if github.owner().is_none() {
                    return Err(Error::Config(
                        "--user or --organisation is required for the github repository"
                            .to_string(),
                    ));
                }
                RepositoryConfig::Github(github)
            }
        };

        Ok(Self {
            repository,
            log_level,
        })
    }
}
