use std::path::PathBuf;
use thiserror::Error;

/// A crate-specific error enum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The autoescape setting is not a boolean.
    #[error("invalid autoescape value (expected true, false, 1, or 0): {0}")]
    InvalidAutoescape(String),

    /// The undefined behavior name is not one MiniJinja knows.
    #[error(
        "invalid undefined_behavior value (expected lenient, chainable, semistrict, or strict): {0}"
    )]
    InvalidUndefinedBehavior(String),

    /// [serde_json::Error]
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// [minijinja::Error]
    #[error(transparent)]
    Minijinja(#[from] minijinja::Error),

    /// A named template was rendered without a configured template path.
    #[error("no template_path is set")]
    NoTemplatePath,

    /// Rendered output contained a NUL byte and cannot cross the string boundary.
    #[error("rendered output contains a NUL byte")]
    NulByte,

    /// The template path does not exist on the filesystem.
    #[error("template_path does not exist: {}", .0.display())]
    TemplatePathDoesNotExist(PathBuf),

    /// Unknown setting key.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
}
