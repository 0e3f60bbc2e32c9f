//! Driver errors.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised outside the analysis itself.
#[derive(Error, Debug, Diagnostic)]
pub enum DriverError {
    /// Reading the configuration file failed
    #[error("failed to read `{}`", path.display())]
    #[diagnostic(code(driver::io))]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`Config`](crate::Config)
    #[error("invalid configuration")]
    #[diagnostic(code(driver::config), help("see the `[analysis]` and `[output]` tables"))]
    Toml(#[from] toml::de::Error),

    /// A report could not be serialized
    #[error("failed to serialize report")]
    #[diagnostic(code(driver::json))]
    Json(#[from] serde_json::Error),

    /// A diagnostic could not be rendered against its source
    #[error("failed to render diagnostic")]
    #[diagnostic(code(driver::render))]
    Render(#[from] codespan_reporting::files::Error),

    /// Rendered output was not UTF-8
    #[error("rendered diagnostic is not UTF-8")]
    #[diagnostic(code(driver::render))]
    Utf8(#[from] std::string::FromUtf8Error),
}
