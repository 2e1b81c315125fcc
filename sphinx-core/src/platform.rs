//! Platform directories.

use std::path::PathBuf;

use crate::constants::APP_NAME;
use crate::error::{SphinxError, SphinxResult};

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the current platform at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Application data directory (config file, logs).
    ///
    /// - Windows: `%APPDATA%/SphinxRelay`
    /// - macOS: `~/Library/Application Support/SphinxRelay`
    /// - Linux: `~/.local/share/SphinxRelay`
    pub fn data_dir() -> SphinxResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| SphinxError::Config("could not determine data directory".into()))?;
        Ok(base.join(APP_NAME))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
