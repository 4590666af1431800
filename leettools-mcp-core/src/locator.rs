// leettools-mcp-core/src/locator.rs

//! Finds the `leet` executable.
//!
//! Resolution never fails: when nothing better is found the bare command name is
//! returned and a missing binary only shows up when the runner tries to spawn it.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::LeetConfig;

/// Command name used for PATH lookups and as the last-resort fallback.
pub const DEFAULT_EXECUTABLE: &str = "leet";

/// Filesystem and PATH access used by [`ExecutableLocator`].
pub trait ExecutableProbe: Send + Sync {
    /// Full path of `name` on PATH, if any.
    fn which(&self, name: &str) -> Option<PathBuf>;
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real PATH and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ExecutableProbe for SystemProbe {
    fn which(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Which strategy produced a [`ResolvedExecutable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    EnvOverride,
    SystemPath,
    VirtualEnv,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExecutable {
    pub path: PathBuf,
    pub source: ResolutionSource,
}

pub struct ExecutableLocator<P: ExecutableProbe = SystemProbe> {
    probe: P,
    executable_override: Option<PathBuf>,
    virtual_env: Option<PathBuf>,
}

impl ExecutableLocator<SystemProbe> {
    pub fn from_config(config: &LeetConfig) -> Self {
        Self::with_probe(config, SystemProbe)
    }
}

impl<P: ExecutableProbe> ExecutableLocator<P> {
    pub fn with_probe(config: &LeetConfig, probe: P) -> Self {
        Self {
            probe,
            executable_override: config.executable_override.clone(),
            virtual_env: config.virtual_env.clone(),
        }
    }

    /// Override, then PATH, then the active virtual environment, then the bare name.
    pub fn resolve(&self) -> ResolvedExecutable {
        if let Some(path) = &self.executable_override {
            info!(path = %path.display(), "Using LEET_EXECUTABLE environment variable");
            return ResolvedExecutable {
                path: path.clone(),
                source: ResolutionSource::EnvOverride,
            };
        }

        if let Some(path) = self.probe.which(DEFAULT_EXECUTABLE) {
            info!(path = %path.display(), "Found leet executable on PATH");
            return ResolvedExecutable {
                path,
                source: ResolutionSource::SystemPath,
            };
        }
        info!("Could not find leet on PATH");

        if let Some(venv) = &self.virtual_env {
            let path = venv_executable(venv);
            if self.probe.exists(&path) {
                info!(path = %path.display(), "Found leet in virtual environment");
                return ResolvedExecutable {
                    path,
                    source: ResolutionSource::VirtualEnv,
                };
            }
        }

        info!("Falling back to '{}' command", DEFAULT_EXECUTABLE);
        ResolvedExecutable {
            path: PathBuf::from(DEFAULT_EXECUTABLE),
            source: ResolutionSource::Fallback,
        }
    }
}

fn venv_executable(venv: &Path) -> PathBuf {
    let bin_dir = if cfg!(target_os = "windows") { "Scripts" } else { "bin" };
    venv.join(bin_dir).join(DEFAULT_EXECUTABLE)
}
