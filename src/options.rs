//! Configuration options for the extraction pipeline.

use std::path::PathBuf;

use crate::locale::Locale;

/// Where templates live and how dates are read.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use calendar_extract::{Locale, Options};
///
/// let options = Options {
///     templates_dir: "config/sites".into(),
///     locale: Locale::english(),
/// };
/// assert!(options.template_path("praha").ends_with("config/sites/praha.json"));
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory holding one `<site>.json` template per site.
    ///
    /// Default: `resources/parsers`
    pub templates_dir: PathBuf,

    /// Month and weekday names used by the datetime normalizer.
    ///
    /// Default: Czech
    pub locale: Locale,
}

impl Options {
    /// Default templates directory.
    pub const DEFAULT_TEMPLATES_DIR: &'static str = "resources/parsers";

    /// Path of the template file for `name`.
    #[must_use]
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir.join(format!("{name}.json"))
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(Self::DEFAULT_TEMPLATES_DIR),
            locale: Locale::default(),
        }
    }
}
