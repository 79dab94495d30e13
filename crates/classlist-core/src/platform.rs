//! Platform-specific behavior for manifest paths.
//!
//! All `#[cfg]` checks for the host OS live here. Everything else takes a
//! [`PathStyle`] value so that both conventions can be exercised on any host.

use serde::{Deserialize, Serialize};

/// How local-file URIs spell absolute paths on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// `file:/C:/dir/foo.jar`, a drive letter after the scheme slash.
    DriveLetter,
    /// `file:/dir/foo.jar`.
    Posix,
}

impl PathStyle {
    /// The convention used by the platform this crate was compiled for.
    pub fn host() -> Self {
        #[cfg(windows)]
        {
            PathStyle::DriveLetter
        }
        #[cfg(not(windows))]
        {
            PathStyle::Posix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathStyle::DriveLetter => "drive-letter",
            PathStyle::Posix => "posix",
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        PathStyle::host()
    }
}

impl std::fmt::Display for PathStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
