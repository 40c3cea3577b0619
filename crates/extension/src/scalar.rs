use crate::session;
use duckdb::{
    Connection,
    core::{DataChunkHandle, FlatVector, Inserter, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};
use libduckdb_sys as ffi;
use minijinja_render::{Error, Renderer};
use std::error::Error as StdError;
use std::{slice, str};

type BoxError = Box<dyn StdError>;

// The 1-arg overloads and NULL contexts render against this.
const EMPTY_CONTEXT: &str = "{}";

/// Registers every minijinja scalar function on the connection.
pub fn register_all(con: &Connection) -> duckdb::Result<()> {
    log::debug!("registering minijinja scalar functions");
    con.register_scalar_function::<RenderScalar>("minijinja_render")?;
    con.register_scalar_function::<RenderFileScalar>("minijinja_render_file")?;
    con.register_scalar_function::<SetScalar>("minijinja_set")?;
    con.register_scalar_function::<GetScalar>("minijinja_get")?;
    con.register_scalar_function::<VersionScalar>("minijinja_version")?;
    Ok(())
}

/// `minijinja_render(template[, context])`: renders an inline template.
pub struct RenderScalar;

impl VScalar for RenderScalar {
    type State = ();

    unsafe fn invoke(
        _: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), BoxError> {
        unsafe { render_chunk(input, output, Renderer::render_str) }
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        template_signatures()
    }
}

/// `minijinja_render_file(name[, context])`: renders a template file resolved
/// against the `template_path` setting.
pub struct RenderFileScalar;

impl VScalar for RenderFileScalar {
    type State = ();

    unsafe fn invoke(
        _: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), BoxError> {
        unsafe { render_chunk(input, output, Renderer::render_template) }
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        template_signatures()
    }
}

/// `minijinja_set(key, value)`: updates one session setting and returns the
/// canonical value now in effect. A NULL (or empty) value resets the key to
/// its default and returns NULL.
pub struct SetScalar;

impl VScalar for SetScalar {
    type State = ();

    unsafe fn invoke(
        _: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), BoxError> {
        let len = input.len();
        let keys = input.flat_vector(0);
        let values = input.flat_vector(1);
        let mut output = output.flat_vector();
        for row in 0..len {
            if keys.row_is_null(row as u64) {
                output.set_null(row);
                continue;
            }
            let key = unsafe { string_at(&keys, len, row) };
            let value = if values.row_is_null(row as u64) {
                None
            } else {
                Some(unsafe { string_at(&values, len, row) })
            };
            match session::set(key, value)? {
                Some(canonical) => insert_string(&output, row, canonical)?,
                None => output.set_null(row),
            }
        }
        Ok(())
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![
                LogicalTypeId::Varchar.into(),
                LogicalTypeId::Varchar.into(),
            ],
            LogicalTypeId::Varchar.into(),
        )]
    }
}

/// `minijinja_get(key)`: returns the canonical current value of one session
/// setting, NULL for an unset `template_path`.
pub struct GetScalar;

impl VScalar for GetScalar {
    type State = ();

    unsafe fn invoke(
        _: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), BoxError> {
        let len = input.len();
        let keys = input.flat_vector(0);
        let mut output = output.flat_vector();
        for row in 0..len {
            if keys.row_is_null(row as u64) {
                output.set_null(row);
                continue;
            }
            let key = unsafe { string_at(&keys, len, row) };
            match session::get(key)? {
                Some(value) => insert_string(&output, row, value)?,
                None => output.set_null(row),
            }
        }
        Ok(())
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeId::Varchar.into()],
            LogicalTypeId::Varchar.into(),
        )]
    }
}

/// `minijinja_version()`: returns this extension's version.
pub struct VersionScalar;

impl VScalar for VersionScalar {
    type State = ();

    unsafe fn invoke(
        _: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), BoxError> {
        let len = input.len();
        let output = output.flat_vector();
        for row in 0..len {
            output.insert(row, crate::version());
        }
        Ok(())
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![],
            LogicalTypeId::Varchar.into(),
        )]
    }
}

fn template_signatures() -> Vec<ScalarFunctionSignature> {
    vec![
        ScalarFunctionSignature::exact(
            vec![LogicalTypeId::Varchar.into()],
            LogicalTypeId::Varchar.into(),
        ),
        ScalarFunctionSignature::exact(
            vec![
                LogicalTypeId::Varchar.into(),
                LogicalTypeId::Varchar.into(),
            ],
            LogicalTypeId::Varchar.into(),
        ),
    ]
}

/// Renders one chunk of templates, one environment per chunk.
unsafe fn render_chunk(
    input: &mut DataChunkHandle,
    output: &mut dyn WritableVector,
    render: fn(&Renderer, &str, &str) -> minijinja_render::Result<String>,
) -> Result<(), BoxError> {
    let len = input.len();
    let templates = input.flat_vector(0);
    let contexts = (input.num_columns() > 1).then(|| input.flat_vector(1));
    let renderer = Renderer::with_settings(&session::snapshot());
    let mut output = output.flat_vector();
    for row in 0..len {
        if templates.row_is_null(row as u64) {
            output.set_null(row);
            continue;
        }
        let template = unsafe { string_at(&templates, len, row) };
        let context = match &contexts {
            Some(contexts) if !contexts.row_is_null(row as u64) => unsafe {
                string_at(contexts, len, row)
            },
            _ => EMPTY_CONTEXT,
        };
        let rendered = render(&renderer, template, context).map_err(render_error)?;
        insert_string(&output, row, rendered)?;
    }
    Ok(())
}

/// Reads one varchar value out of a flat vector.
///
/// # Safety
///
/// `vector` must hold varchar data with at least `len` rows, and the row must
/// not be NULL.
unsafe fn string_at(vector: &FlatVector, len: usize, row: usize) -> &str {
    unsafe {
        let value = &vector.as_slice_with_len::<ffi::duckdb_string_t>(len)[row];
        let value = value as *const ffi::duckdb_string_t as *mut ffi::duckdb_string_t;
        let data = ffi::duckdb_string_t_data(value);
        let length = ffi::duckdb_string_t_length(*value);
        str::from_utf8_unchecked(slice::from_raw_parts(data as *const u8, length as usize))
    }
}

fn insert_string(vector: &FlatVector, row: usize, value: String) -> Result<(), BoxError> {
    check_no_nul(&value)?;
    vector.insert(row, value.as_str());
    Ok(())
}

// The inserter goes through a C string, so interior NULs can't cross.
fn check_no_nul(value: &str) -> Result<(), Error> {
    if value.contains('\0') {
        Err(Error::NulByte)
    } else {
        Ok(())
    }
}

fn render_error(error: Error) -> BoxError {
    match &error {
        Error::Minijinja(err) => {
            let mut message = format!("MiniJinja render error: {err:?}\n");
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(&format!("Caused by: {cause}\n"));
                source = cause.source();
            }
            message.into()
        }
        _ => Box::new(error),
    }
}

#[cfg(test)]
mod tests {
    use minijinja_render::{Error, Renderer};

    #[test]
    fn rendered_nul_bytes_cannot_cross_the_string_boundary() {
        let rendered = Renderer::new()
            .render_str("{{ c }}", r#"{"c": "a\u0000b"}"#)
            .unwrap();
        assert!(matches!(
            super::check_no_nul(&rendered).unwrap_err(),
            Error::NulByte
        ));
        assert!(super::check_no_nul("plain").is_ok());
    }

    #[test]
    fn render_errors_keep_the_minijinja_diagnostics() {
        let error = Renderer::new()
            .render_str("{% bogus %}", "{}")
            .unwrap_err();
        let message = super::render_error(error).to_string();
        assert!(message.starts_with("MiniJinja render error: "));
    }

    #[test]
    fn non_render_errors_use_display() {
        let error = Renderer::new().render_str("ok", "not json").unwrap_err();
        let message = super::render_error(error).to_string();
        assert!(message.starts_with("invalid JSON: "));
    }
}
