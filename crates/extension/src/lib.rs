//! A DuckDB extension that renders [MiniJinja](https://github.com/mitsuhiko/minijinja)
//! templates from SQL.
//!
//! ```sql
//! LOAD minijinja;
//! SELECT minijinja_render('Hello {{ name }}!', '{"name": "World"}');
//! -- Hello World!
//! ```
//!
//! Session settings (`template_path`, `autoescape`, `autoescape_extensions`,
//! `undefined_behavior`) travel through `minijinja_set` and `minijinja_get`.

#![warn(unused_crate_dependencies)]

extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

mod scalar;
mod session;

use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use libduckdb_sys as ffi;
use std::error::Error;

/// The stable extension name.
///
/// # Examples
///
/// ```
/// assert_eq!(duckdb_minijinja::name(), "minijinja");
/// ```
pub fn name() -> &'static str {
    "minijinja"
}

/// Return this crate's version.
///
/// # Examples
///
/// ```
/// assert!(!duckdb_minijinja::version().is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// The extension entry point: registers every minijinja scalar function. A
/// registration failure fails the whole load.
#[duckdb_entrypoint_c_api(ext_name = "minijinja", min_duckdb_version = "v0.0.1")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    scalar::register_all(&con)?;
    Ok(())
}
