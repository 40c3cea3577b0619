use crate::{Error, Result, Settings};
use minijinja::{AutoEscape, Environment, Value};

/// Renders MiniJinja templates with an environment built from [Settings].
///
/// The environment is configured once at construction; the settings are
/// validated before they get here (see [Settings::set]).
///
/// # Examples
///
/// ```
/// use minijinja_render::Renderer;
///
/// let renderer = Renderer::new();
/// let rendered = renderer.render_str("Hello {{ name }}!", r#"{"name": "World"}"#).unwrap();
/// assert_eq!(rendered, "Hello World!");
/// ```
#[derive(Debug)]
pub struct Renderer {
    environment: Environment<'static>,
    has_loader: bool,
}

impl Renderer {
    /// Creates a new renderer with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use minijinja_render::Renderer;
    ///
    /// let renderer = Renderer::new();
    /// ```
    pub fn new() -> Renderer {
        Renderer::with_settings(&Settings::default())
    }

    /// Creates a new renderer from the given settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use minijinja_render::{Renderer, Settings};
    ///
    /// let mut settings = Settings::default();
    /// settings.set("undefined_behavior", Some("strict")).unwrap();
    /// let renderer = Renderer::with_settings(&settings);
    /// assert!(renderer.render_str("{{ missing }}", "{}").is_err());
    /// ```
    pub fn with_settings(settings: &Settings) -> Renderer {
        let mut environment = Environment::new();
        environment.set_undefined_behavior(settings.undefined_behavior);
        let mut has_loader = false;
        if let Some(path) = settings.template_path.as_deref() {
            if path.is_dir() {
                environment.set_loader(minijinja::path_loader(path));
                has_loader = true;
            } else if let Some(parent) = path.parent() {
                // A file path means "templates live next to this file".
                environment.set_loader(minijinja::path_loader(parent));
                has_loader = true;
            }
        }
        if settings.autoescape_extensions.is_empty() {
            let auto_escape = if settings.autoescape {
                AutoEscape::Html
            } else {
                AutoEscape::None
            };
            environment.set_auto_escape_callback(move |_| auto_escape);
        } else {
            let extensions = settings.autoescape_extensions.clone();
            environment.set_auto_escape_callback(move |name| {
                if extensions.iter().any(|extension| name.ends_with(extension)) {
                    AutoEscape::Html
                } else {
                    AutoEscape::None
                }
            });
        }
        Renderer {
            environment,
            has_loader,
        }
    }

    /// Renders an inline template string against a JSON context.
    ///
    /// # Examples
    ///
    /// ```
    /// use minijinja_render::Renderer;
    ///
    /// let renderer = Renderer::new();
    /// let rendered = renderer.render_str("{{ numbers | length }}", r#"{"numbers": [1, 2, 3]}"#).unwrap();
    /// assert_eq!(rendered, "3");
    /// ```
    pub fn render_str(&self, template: &str, context: &str) -> Result<String> {
        log::debug!("rendering inline template ({} bytes)", template.len());
        let context = parse_context(context)?;
        self.environment
            .render_str(template, context)
            .map_err(Error::from)
    }

    /// Renders a named template resolved through the configured template path.
    ///
    /// Errors with [Error::NoTemplatePath] when no template path is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use minijinja_render::{Renderer, Settings};
    ///
    /// let mut settings = Settings::default();
    /// settings.set("template_path", Some("templates")).unwrap();
    /// let renderer = Renderer::with_settings(&settings);
    /// let rendered = renderer.render_template("hello.txt", r#"{"name": "World"}"#).unwrap();
    /// assert_eq!(rendered, "Hello World!");
    /// ```
    pub fn render_template(&self, name: &str, context: &str) -> Result<String> {
        if !self.has_loader {
            return Err(Error::NoTemplatePath);
        }
        log::debug!("rendering template file: {name}");
        let context = parse_context(context)?;
        let template = self.environment.get_template(name)?;
        template.render(context).map_err(Error::from)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

fn parse_context(context: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(context)?;
    Ok(Value::from_serialize(&json))
}
