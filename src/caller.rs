//! Call-site attribution for log records.
//!
//! Every public logging entry point and every wrapper `call` in this crate
//! is `#[track_caller]`, so `Location::caller()` already resolves past the
//! instrumentation frames to the first frame outside them. The exclusion
//! set below guards the remaining case of a location that still points
//! into this crate's instrumentation sources (for example a log emitted
//! from inside a closure); such locations report the sentinel frame.

use serde::Serialize;
use std::fmt;
use std::panic::Location;
use std::path::Path;

/// File name reported when no caller outside the instrumentation layer is known.
pub const UNKNOWN_FILENAME: &str = "Unknown";

/// Instrumentation sources, relative to this crate's `src/` directory.
const INTERNAL_FILES: &[&str] = &[
    "caller.rs",
    "init.rs",
    "layer.rs",
    "logger.rs",
    "wrap/mod.rs",
    "wrap/log.rs",
    "wrap/retry.rs",
    "wrap/rate_limit.rs",
    "wrap/to_json.rs",
    "wrap/env_gate.rs",
];

/// Source location a log record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerFrame {
    /// Base name of the source file.
    pub filename: String,
    pub line: u32,
}

impl CallerFrame {
    pub fn unknown() -> Self {
        CallerFrame {
            filename: UNKNOWN_FILENAME.to_string(),
            line: 0,
        }
    }

    /// Frame of whoever called into the current `#[track_caller]` chain.
    #[track_caller]
    pub fn current() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self::attribute(location.file(), location.line())
    }

    pub(crate) fn attribute(file: &str, line: u32) -> Self {
        if is_internal(file) {
            return Self::unknown();
        }
        let filename = Path::new(file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(file);
        CallerFrame {
            filename: filename.to_string(),
            line,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.filename == UNKNOWN_FILENAME
    }
}

impl fmt::Display for CallerFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

fn source_root() -> &'static Path {
    Path::new(file!()).parent().unwrap_or_else(|| Path::new(""))
}

pub(crate) fn is_internal(file: &str) -> bool {
    let Ok(relative) = Path::new(file).strip_prefix(source_root()) else {
        return false;
    };
    INTERNAL_FILES
        .iter()
        .any(|internal| relative == Path::new(internal))
}
