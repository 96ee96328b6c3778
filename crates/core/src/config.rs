//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the session and the
//! servers. Nothing in this crate reads environment variables while handling a request; the
//! binaries read the raw values and hand them to the `*_from_env_value` helpers below.

use crate::actions::CommandRegistry;
use crate::constants::{DEFAULT_ANALYSIS_TIMEOUT_SECS, DEFAULT_RECORDS_PATH, DEFAULT_REST_ADDR};
use crate::persona::PersonaRegistry;
use crate::{DashboardError, DashboardResult};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const RECORDS_ENV: &str = "CAREBOARD_RECORDS";
pub const PERSONA_DIR_ENV: &str = "CAREBOARD_PERSONA_DIR";
pub const ANALYSIS_TIMEOUT_ENV: &str = "CAREBOARD_ANALYSIS_TIMEOUT_SECS";
pub const REST_ADDR_ENV: &str = "CAREBOARD_REST_ADDR";

/// Engine configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    records_path: PathBuf,
    persona_dir: Option<PathBuf>,
    analysis_timeout: Duration,
    rest_addr: SocketAddr,
}

impl EngineConfig {
    /// Create a new `EngineConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidInput`] if `persona_dir` is given but is not a
    /// directory, or if the analysis timeout is zero.
    pub fn new(
        records_path: PathBuf,
        persona_dir: Option<PathBuf>,
        analysis_timeout: Duration,
        rest_addr: SocketAddr,
    ) -> DashboardResult<Self> {
        if let Some(dir) = &persona_dir {
            if !dir.is_dir() {
                return Err(DashboardError::InvalidInput(format!(
                    "persona directory {} does not exist",
                    dir.display()
                )));
            }
        }
        if analysis_timeout.is_zero() {
            return Err(DashboardError::InvalidInput(
                "analysis timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            records_path,
            persona_dir,
            analysis_timeout,
            rest_addr,
        })
    }

    /// Resolve every setting from raw environment values (`None` when unset).
    pub fn from_env_values(
        records: Option<String>,
        persona_dir: Option<String>,
        analysis_timeout_secs: Option<String>,
        rest_addr: Option<String>,
    ) -> DashboardResult<Self> {
        Self::new(
            records_path_from_env_value(records),
            persona_dir_from_env_value(persona_dir),
            analysis_timeout_from_env_value(analysis_timeout_secs)?,
            rest_addr_from_env_value(rest_addr)?,
        )
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn persona_dir(&self) -> Option<&Path> {
        self.persona_dir.as_deref()
    }

    pub fn analysis_timeout(&self) -> Duration {
        self.analysis_timeout
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    /// Build the persona registry: from the configured directory if there is one, otherwise
    /// from the built-in persona files.
    pub fn load_registry(&self, commands: &CommandRegistry) -> DashboardResult<PersonaRegistry> {
        match &self.persona_dir {
            Some(dir) => PersonaRegistry::from_dir(dir, commands),
            None => PersonaRegistry::builtin_with(commands),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn records_path_from_env_value(value: Option<String>) -> PathBuf {
    non_empty(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORDS_PATH))
}

pub fn persona_dir_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_empty(value).map(PathBuf::from)
}

/// Parse the analysis timeout in whole seconds, defaulting when unset or blank.
pub fn analysis_timeout_from_env_value(value: Option<String>) -> DashboardResult<Duration> {
    let Some(value) = non_empty(value) else {
        return Ok(Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS));
    };

    let secs = value.parse::<u64>().map_err(|_| {
        DashboardError::InvalidInput(format!(
            "{ANALYSIS_TIMEOUT_ENV} must be a whole number of seconds, got '{value}'"
        ))
    })?;
    Ok(Duration::from_secs(secs))
}

pub fn rest_addr_from_env_value(value: Option<String>) -> DashboardResult<SocketAddr> {
    let value = non_empty(value).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
    value.parse::<SocketAddr>().map_err(|_| {
        DashboardError::InvalidInput(format!(
            "{REST_ADDR_ENV} must be a socket address such as 0.0.0.0:3000, got '{value}'"
        ))
    })
}
