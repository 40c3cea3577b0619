use minijinja_render::{Result, Settings};
use std::sync::{LazyLock, Mutex};

// One settings instance per process. DuckDB's C extension API has no
// extension-option registration, so session state lives here and travels
// through the minijinja_set/minijinja_get scalar functions.
static SETTINGS: LazyLock<Mutex<Settings>> = LazyLock::new(Mutex::default);

/// Validates and applies one session setting.
///
/// Returns the canonical value now in effect, or `None` when the value was a
/// reset (`None` or empty). A failed set leaves the stored settings
/// unchanged.
pub fn set(key: &str, value: Option<&str>) -> Result<Option<String>> {
    let value = value.filter(|value| !value.is_empty());
    let mut settings = SETTINGS.lock().expect("session settings mutex is poisoned");
    let mut updated = settings.clone();
    updated.set(key, value)?;
    let canonical = if value.is_some() {
        updated.get(key)?
    } else {
        None
    };
    *settings = updated;
    Ok(canonical)
}

/// Returns the canonical current value of one session setting.
pub fn get(key: &str) -> Result<Option<String>> {
    SETTINGS
        .lock()
        .expect("session settings mutex is poisoned")
        .get(key)
}

/// Clones the current settings for render-time use.
pub fn snapshot() -> Settings {
    SETTINGS
        .lock()
        .expect("session settings mutex is poisoned")
        .clone()
}

#[cfg(test)]
mod tests {
    // These tests share one process-global settings instance, so each test
    // sticks to its own key.
    use minijinja_render::Error;

    #[test]
    fn set_get_reset_autoescape() {
        assert_eq!(super::get("autoescape").unwrap().unwrap(), "false");
        assert_eq!(
            super::set("autoescape", Some("1")).unwrap().unwrap(),
            "true"
        );
        assert_eq!(super::get("autoescape").unwrap().unwrap(), "true");
        assert!(matches!(
            super::set("autoescape", Some("maybe")).unwrap_err(),
            Error::InvalidAutoescape(_)
        ));
        assert_eq!(super::get("autoescape").unwrap().unwrap(), "true");
        assert_eq!(super::set("autoescape", None).unwrap(), None);
        assert_eq!(super::get("autoescape").unwrap().unwrap(), "false");
    }

    #[test]
    fn set_undefined_behavior_canonicalizes() {
        assert_eq!(
            super::set("undefined_behavior", Some("SemiStrict"))
                .unwrap()
                .unwrap(),
            "semistrict"
        );
        assert_eq!(super::set("undefined_behavior", Some("")).unwrap(), None);
        assert_eq!(
            super::get("undefined_behavior").unwrap().unwrap(),
            "lenient"
        );
    }

    #[test]
    fn set_template_path() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().to_string_lossy().into_owned();
        assert_eq!(
            super::set("template_path", Some(&path)).unwrap().unwrap(),
            path
        );
        assert_eq!(
            super::snapshot().template_path.as_deref(),
            Some(directory.path())
        );
        assert_eq!(super::set("template_path", None).unwrap(), None);
        assert_eq!(super::get("template_path").unwrap(), None);
    }

    #[test]
    fn invalid_template_path_leaves_settings_unchanged() {
        assert!(matches!(
            super::set("autoescape_extensions", Some(".html")).unwrap(),
            Some(_)
        ));
        assert!(matches!(
            super::set("template_path", Some("/no/such/directory")).unwrap_err(),
            Error::TemplatePathDoesNotExist(_)
        ));
        assert_eq!(
            super::get("autoescape_extensions").unwrap().unwrap(),
            ".html"
        );
        assert_eq!(super::set("autoescape_extensions", None).unwrap(), None);
    }

    #[test]
    fn unknown_key() {
        assert!(matches!(
            super::set("jinja_mode", Some("on")).unwrap_err(),
            Error::UnknownSetting(_)
        ));
        assert!(matches!(
            super::get("jinja_mode").unwrap_err(),
            Error::UnknownSetting(_)
        ));
    }
}
