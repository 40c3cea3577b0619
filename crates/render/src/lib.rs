//! Render [MiniJinja](https://github.com/mitsuhiko/minijinja) templates against JSON contexts.
//!
//! This is the engine behind the `duckdb-minijinja` extension: session
//! settings, environment construction, and rendering, with no DuckDB
//! dependency.

#![warn(unused_crate_dependencies)]

mod error;
mod renderer;
mod settings;

pub use {
    error::Error,
    renderer::Renderer,
    settings::{Setting, Settings},
};

/// Renders an inline template with default settings.
///
/// # Examples
///
/// ```
/// let rendered = minijinja_render::render("Hello {{ name }}!", r#"{"name": "World"}"#).unwrap();
/// assert_eq!(rendered, "Hello World!");
/// ```
pub fn render(template: &str, context: &str) -> Result<String> {
    Renderer::new().render_str(template, context)
}

/// A crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
