//! Workbench configuration.
//!
//! One immutable snapshot built at process start and handed to the HTTP
//! layer as shared state; nothing else reads the environment after that.
//! Resolution always succeeds — a root that does not exist on disk is only
//! discovered when a consumer touches it.

use std::path::PathBuf;

use serde::Serialize;

use crate::env_store;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_CLI_PROGRAM: &str = "cre";

/// Directory name of the orchestrator checkout expected next to the
/// workbench install when `ORCHESTRATOR_ROOT` is not set.
const DEFAULT_ROOT_SIBLING: &str = "cre-orchestrator";

/// Deployment mode. Production locks down file-mutating endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    /// Anything other than `production` (case-insensitive) is development.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            RunMode::Production
        } else {
            RunMode::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }
}

/// Values supplied on the command line. They beat environment variables,
/// which beat defaults.
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub orchestrator_root: Option<PathBuf>,
    pub mode: Option<RunMode>,
    pub frontend_origin: Option<String>,
    pub allow_file_writes: Option<bool>,
}

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    pub port: u16,
    /// The single origin the CORS layer will allow. There is no
    /// allow-all fallback.
    pub frontend_origin: String,
    /// Directory containing the external orchestrator project.
    pub orchestrator_root: PathBuf,
    /// Always `orchestrator_root/.env`.
    pub env_file: PathBuf,
    pub mode: RunMode,
    /// Whether `/api/write-file` is enabled. Defaults to the mode
    /// (development on, production off) unless overridden.
    pub allow_file_writes: bool,
    /// Program name of the simulation CLI.
    pub cli_program: String,
    /// Seed values for a freshly created `.env`.
    pub bootstrap_key: Option<String>,
    pub bootstrap_target: Option<String>,
}

impl WorkbenchConfig {
    /// Resolve from the process environment.
    pub fn from_env(overrides: Overrides) -> Self {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary environment snapshot.
    pub fn resolve(overrides: Overrides, env: impl Fn(&str) -> Option<String>) -> Self {
        let mode = overrides
            .mode
            .or_else(|| env("RUN_MODE").map(|v| RunMode::parse(&v)))
            .unwrap_or(RunMode::Development);

        let port = overrides
            .port
            .or_else(|| env("PORT").and_then(|v| v.trim().parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        let frontend_origin = overrides
            .frontend_origin
            .or_else(|| env("FRONTEND_ORIGIN"))
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string());

        let orchestrator_root = overrides
            .orchestrator_root
            .or_else(|| env("ORCHESTRATOR_ROOT").map(PathBuf::from))
            .unwrap_or_else(default_root);

        let allow_file_writes = overrides
            .allow_file_writes
            .or_else(|| env("ALLOW_FILE_WRITES").map(|v| parse_bool(&v)))
            .unwrap_or(mode == RunMode::Development);

        let cli_program = env("CRE_CLI")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLI_PROGRAM.to_string());

        let env_file = orchestrator_root.join(env_store::ENV_FILE_NAME);

        WorkbenchConfig {
            port,
            frontend_origin,
            orchestrator_root,
            env_file,
            mode,
            allow_file_writes,
            cli_program,
            bootstrap_key: env(env_store::PRIVATE_KEY_VAR),
            bootstrap_target: env(env_store::TARGET_VAR),
        }
    }
}

/// Default orchestrator root: `../cre-orchestrator` relative to the running
/// executable, falling back to the current directory's sibling when the
/// executable path is unavailable.
fn default_root() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("..").join(DEFAULT_ROOT_SIBLING)
}

fn parse_bool(value: &str) -> bool {
    let v = value.trim();
    v == "1" || v.eq_ignore_ascii_case("true")
}
