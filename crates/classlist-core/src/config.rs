//! Configuration for the class list writer.
//!
//! [`ManifestConfig`] holds the fixed constants of the manifest format.
//! [`ClassListConfig`] is the already-resolved runtime configuration handed
//! in by the host: whether dumping is on, where to, and for which platform.

use crate::platform::PathStyle;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Fixed constants of the manifest format.
pub struct ManifestConfig;

impl ManifestConfig {
    pub const HEADER: [&'static str; 3] = [
        "# NOTE: Do not modify this file.",
        "# This file is generated by dumping the list of loaded classes",
        "# and is used at archive dump time to replay the load order.",
    ];

    /// Scheme every user-defined loader origin must carry.
    pub const FILE_SCHEME: &'static str = "file:";

    /// Origin used by the runtime's species code generator.
    pub const GENERATED_SPECIES_MARKER: &'static str =
        "_ClassSpecializer_generateConcreteSpeciesCode";

    /// `file:/C:/dir` -> `C:/dir`
    pub const DRIVE_LETTER_STRIP: usize = 6;
    /// `file:/dir` -> `/dir`
    pub const POSIX_STRIP: usize = 5;

    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d_%H-%M-%S";
}

/// Runtime configuration for the writer.
#[derive(Debug, Clone)]
pub struct ClassListConfig {
    /// Output file name template. `None` turns the feature off.
    pub output: Option<PathBuf>,
    /// Local-file URI convention used when stripping `source:` paths.
    pub path_style: PathStyle,
    /// False for an exploded runtime with no packaged module image, where
    /// dumping is unsupported.
    pub has_runtime_image: bool,
}

impl Default for ClassListConfig {
    fn default() -> Self {
        Self {
            output: None,
            path_style: PathStyle::host(),
            has_runtime_image: true,
        }
    }
}

impl ClassListConfig {
    pub fn with_output(path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn path_style(mut self, style: PathStyle) -> Self {
        self.path_style = style;
        self
    }

    pub fn runtime_image(mut self, present: bool) -> Self {
        self.has_runtime_image = present;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some()
    }

    /// The output path with `%p` and `%t` expanded for this process.
    pub fn resolved_output(&self) -> Option<PathBuf> {
        self.output
            .as_deref()
            .map(|template| expand_log_name(template, std::process::id(), Local::now()))
    }
}

/// Expand `%p` (process id), `%t` (timestamp) and `%%` in a file name.
///
/// Unknown `%x` sequences and a trailing `%` are kept as written.
pub fn expand_log_name(template: &Path, pid: u32, started: DateTime<Local>) -> PathBuf {
    let raw = template.to_string_lossy();
    if !raw.contains('%') {
        return template.to_path_buf();
    }

    let mut out = String::with_capacity(raw.len() + 16);
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('p') => {
                chars.next();
                out.push_str(&pid.to_string());
            }
            Some('t') => {
                chars.next();
                out.push_str(&started.format(ManifestConfig::TIMESTAMP_FORMAT).to_string());
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    PathBuf::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_default_is_disabled() {
        let config = ClassListConfig::default();
        assert!(!config.is_enabled());
        assert!(config.resolved_output().is_none());
        assert!(config.has_runtime_image);
    }

    #[test]
    fn test_with_output_enables() {
        let config = ClassListConfig::with_output("classes.lst").path_style(PathStyle::DriveLetter);
        assert!(config.is_enabled());
        assert_eq!(config.path_style, PathStyle::DriveLetter);
        assert_eq!(config.resolved_output(), Some(PathBuf::from("classes.lst")));
    }

    #[test]
    fn test_expand_pid_and_time() {
        let path = expand_log_name(Path::new("out/classes-%p-%t.lst"), 4242, fixed_time());
        assert_eq!(
            path,
            PathBuf::from("out/classes-4242-2024-03-09_07-05-01.lst")
        );
    }

    #[test]
    fn test_expand_escapes_and_unknown() {
        let path = expand_log_name(Path::new("a%%b%xc%"), 1, fixed_time());
        assert_eq!(path, PathBuf::from("a%b%xc%"));
    }

    #[test]
    fn test_strip_widths_match_schemes() {
        assert_eq!(ManifestConfig::FILE_SCHEME.len(), ManifestConfig::POSIX_STRIP);
        assert_eq!(ManifestConfig::DRIVE_LETTER_STRIP, ManifestConfig::POSIX_STRIP + 1);
    }
}
