use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The engine refused a program image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine rejected program image: {reason}")]
pub struct LoadRejected {
    pub reason: String,
}

impl LoadRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Why an attempted program load did not start a new run.
///
/// None of these are fatal; each one ends that single attempt and the user
/// has to pick a file again.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no program file selected")]
    NoFileSelected,
    #[error("program file {} is empty or unreadable", display_path(.path))]
    EmptyOrUnreadableFile {
        path: Option<PathBuf>,
        #[source]
        source: Option<io::Error>,
    },
    #[error(transparent)]
    LoadRejected(#[from] LoadRejected),
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!("'{}'", path.display()),
        None => "<memory>".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("steps per frame must be at least 1")]
    ZeroStepsPerFrame,
    #[error("scale factor must be at least 1")]
    ZeroScale,
}
