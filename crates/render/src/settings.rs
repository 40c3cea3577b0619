use crate::{Error, Result};
use minijinja::UndefinedBehavior;
use std::{fmt::Display, path::PathBuf, str::FromStr};

/// A session setting key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Setting {
    /// Root directory for file templates.
    TemplatePath,

    /// Blanket HTML autoescaping.
    Autoescape,

    /// Template-name suffixes that turn HTML autoescaping on.
    AutoescapeExtensions,

    /// MiniJinja undefined behavior.
    UndefinedBehavior,
}

/// Settings consulted when building a MiniJinja environment.
///
/// # Examples
///
/// ```
/// use minijinja_render::Settings;
///
/// let mut settings = Settings::default();
/// settings.set("undefined_behavior", Some("strict")).unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Root directory for file templates.
    ///
    /// If this points at a file, its parent directory is used.
    pub template_path: Option<PathBuf>,

    /// Whether to HTML-autoescape every template.
    pub autoescape: bool,

    /// Template-name suffixes that turn HTML autoescaping on, matched with
    /// [str::ends_with] (so conventionally `.html`, `.j2`, ...).
    pub autoescape_extensions: Vec<String>,

    /// What MiniJinja does with undefined template variables.
    pub undefined_behavior: UndefinedBehavior,
}

impl Settings {
    /// Parses and applies one setting.
    ///
    /// A `None` or empty value resets the key to its default. Values are
    /// validated here, not at render time.
    ///
    /// # Examples
    ///
    /// ```
    /// use minijinja_render::Settings;
    ///
    /// let mut settings = Settings::default();
    /// settings.set("autoescape", Some("true")).unwrap();
    /// assert!(settings.autoescape);
    /// settings.set("autoescape", None).unwrap();
    /// assert!(!settings.autoescape);
    /// ```
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        let setting: Setting = key.parse()?;
        let value = value.filter(|value| !value.is_empty());
        match setting {
            Setting::TemplatePath => {
                self.template_path = match value {
                    Some(value) => {
                        let path = PathBuf::from(value);
                        if !path.exists() {
                            return Err(Error::TemplatePathDoesNotExist(path));
                        }
                        Some(path)
                    }
                    None => None,
                };
            }
            Setting::Autoescape => {
                self.autoescape = match value {
                    Some(value) => parse_bool(value)?,
                    None => false,
                };
            }
            Setting::AutoescapeExtensions => {
                self.autoescape_extensions = value
                    .map(|value| {
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|extension| !extension.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
            }
            Setting::UndefinedBehavior => {
                self.undefined_behavior = match value {
                    Some(value) => parse_undefined_behavior(value)?,
                    None => UndefinedBehavior::default(),
                };
            }
        }
        Ok(())
    }

    /// Returns the canonical textual value of one setting.
    ///
    /// Only an unset `template_path` is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use minijinja_render::Settings;
    ///
    /// let settings = Settings::default();
    /// assert_eq!(settings.get("autoescape").unwrap().unwrap(), "false");
    /// assert_eq!(settings.get("template_path").unwrap(), None);
    /// ```
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let setting: Setting = key.parse()?;
        Ok(match setting {
            Setting::TemplatePath => self
                .template_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            Setting::Autoescape => Some(self.autoescape.to_string()),
            Setting::AutoescapeExtensions => Some(self.autoescape_extensions.join(",")),
            Setting::UndefinedBehavior => {
                Some(undefined_behavior_name(self.undefined_behavior).to_string())
            }
        })
    }
}

impl FromStr for Setting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Setting> {
        match s.to_ascii_lowercase().as_str() {
            "template_path" => Ok(Self::TemplatePath),
            "autoescape" => Ok(Self::Autoescape),
            "autoescape_extensions" => Ok(Self::AutoescapeExtensions),
            "undefined_behavior" => Ok(Self::UndefinedBehavior),
            _ => Err(Error::UnknownSetting(s.to_string())),
        }
    }
}

impl Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TemplatePath => f.write_str("template_path"),
            Self::Autoescape => f.write_str("autoescape"),
            Self::AutoescapeExtensions => f.write_str("autoescape_extensions"),
            Self::UndefinedBehavior => f.write_str("undefined_behavior"),
        }
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::InvalidAutoescape(s.to_string())),
    }
}

fn parse_undefined_behavior(s: &str) -> Result<UndefinedBehavior> {
    match s.to_ascii_lowercase().as_str() {
        "lenient" => Ok(UndefinedBehavior::Lenient),
        "chainable" => Ok(UndefinedBehavior::Chainable),
        "semistrict" => Ok(UndefinedBehavior::SemiStrict),
        "strict" => Ok(UndefinedBehavior::Strict),
        _ => Err(Error::InvalidUndefinedBehavior(s.to_string())),
    }
}

fn undefined_behavior_name(undefined_behavior: UndefinedBehavior) -> &'static str {
    match undefined_behavior {
        UndefinedBehavior::Chainable => "chainable",
        UndefinedBehavior::SemiStrict => "semistrict",
        UndefinedBehavior::Strict => "strict",
        _ => "lenient",
    }
}

#[cfg(test)]
mod tests {
    use super::{Setting, Settings};
    use crate::Error;
    use minijinja::UndefinedBehavior;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.template_path, None);
        assert!(!settings.autoescape);
        assert!(settings.autoescape_extensions.is_empty());
        assert_eq!(settings.undefined_behavior, UndefinedBehavior::Lenient);
    }

    #[test]
    fn unknown_setting() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("not_a_setting", Some("value")).unwrap_err(),
            Error::UnknownSetting(_)
        ));
        assert!(matches!(
            settings.get("not_a_setting").unwrap_err(),
            Error::UnknownSetting(_)
        ));
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("0", false)]
    fn autoescape(#[case] value: &str, #[case] expected: bool) {
        let mut settings = Settings::default();
        settings.set("autoescape", Some(value)).unwrap();
        assert_eq!(settings.autoescape, expected);
    }

    #[test]
    fn autoescape_rejects_non_booleans() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("autoescape", Some("yes")).unwrap_err(),
            Error::InvalidAutoescape(_)
        ));
        assert!(!settings.autoescape);
    }

    #[rstest]
    #[case("lenient", UndefinedBehavior::Lenient)]
    #[case("chainable", UndefinedBehavior::Chainable)]
    #[case("semistrict", UndefinedBehavior::SemiStrict)]
    #[case("Strict", UndefinedBehavior::Strict)]
    fn undefined_behavior(#[case] value: &str, #[case] expected: UndefinedBehavior) {
        let mut settings = Settings::default();
        settings.set("undefined_behavior", Some(value)).unwrap();
        assert_eq!(settings.undefined_behavior, expected);
        assert_eq!(
            settings.get("undefined_behavior").unwrap().unwrap(),
            value.to_ascii_lowercase()
        );
    }

    #[test]
    fn undefined_behavior_rejects_unknown_names() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("undefined_behavior", Some("forgiving")).unwrap_err(),
            Error::InvalidUndefinedBehavior(_)
        ));
        assert_eq!(settings.undefined_behavior, UndefinedBehavior::Lenient);
    }

    #[test]
    fn autoescape_extensions_are_trimmed() {
        let mut settings = Settings::default();
        settings
            .set("autoescape_extensions", Some(".html, .j2 ,,"))
            .unwrap();
        assert_eq!(settings.autoescape_extensions, vec![".html", ".j2"]);
        assert_eq!(
            settings.get("autoescape_extensions").unwrap().unwrap(),
            ".html,.j2"
        );
    }

    #[test]
    fn template_path_must_exist() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings
                .set("template_path", Some("/no/such/directory"))
                .unwrap_err(),
            Error::TemplatePathDoesNotExist(_)
        ));
        assert_eq!(settings.template_path, None);
    }

    #[test]
    fn template_path_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings
            .set("template_path", Some(&directory.path().to_string_lossy()))
            .unwrap();
        assert_eq!(settings.template_path.as_deref(), Some(directory.path()));
        settings.set("template_path", None).unwrap();
        assert_eq!(settings.get("template_path").unwrap(), None);
    }

    #[rstest]
    #[case("undefined_behavior", Some("strict"))]
    #[case("autoescape", Some("true"))]
    #[case("autoescape_extensions", Some(".html"))]
    fn empty_value_resets(#[case] key: &str, #[case] value: Option<&str>) {
        let mut settings = Settings::default();
        settings.set(key, value).unwrap();
        settings.set(key, Some("")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn setting_display_round_trip() {
        for setting in [
            Setting::TemplatePath,
            Setting::Autoescape,
            Setting::AutoescapeExtensions,
            Setting::UndefinedBehavior,
        ] {
            assert_eq!(setting.to_string().parse::<Setting>().unwrap(), setting);
        }
    }
}
