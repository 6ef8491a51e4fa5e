//! Error type shared by every wrapper

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, WrapperError>;

#[derive(thiserror::Error, Debug)]
pub enum WrapperError {
    #[error("specified {label} {} does not exist or is not accessible!", .path.display())]
    MissingInput { label: &'static str, path: PathBuf },

    #[error("specified output dir {} does not exist or is not accessible!", .0.display())]
    MissingOutputDir(PathBuf),

    #[error("{0} is needed!")]
    MissingArgument(&'static str),

    #[error("invalid format for input file {}, need {expected}", .path.display())]
    InvalidExtension { path: PathBuf, expected: String },

    #[error("unable to get version info for {tool}: {reason}")]
    VersionUnavailable { tool: String, reason: String },

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("'{command}' failed with {status}.\nStdout: {stdout}\nStderr: {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("could not split extra options \"{options}\": {source}")]
    ExtraOptions {
        options: String,
        source: shell_words::ParseError,
    },

    #[error("expected metric '{metric}' was not found in {}", .source_file.display())]
    MissingMetric {
        metric: &'static str,
        source_file: PathBuf,
    },

    #[error("could not parse \"{value}\" as a value for '{metric}'")]
    InvalidValue { metric: String, value: String },

    #[error("'{metric}' is undefined because '{denominator}' is zero")]
    UndefinedRatio {
        metric: &'static str,
        denominator: &'static str,
    },

    #[error("two files would be archived as \"{0}\"")]
    DuplicateMember(String),

    #[error("error reading or writing \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl WrapperError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WrapperError::Io {
            path: path.into(),
            source,
        }
    }
}
