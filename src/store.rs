//! Template lookup by site name.
//!
//! A crawl loads each site's template once and hands the same `Arc` to
//! every worker that processes that site.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::options::Options;
use crate::parser::Parser;
use crate::template::Template;

/// Loads `<templates_dir>/<name>.json` on first use and caches the result.
#[derive(Debug, Default)]
pub struct TemplateStore {
    options: Options,
    cache: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateStore {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The template of site `name`, loading it if needed.
    pub fn get(&self, name: &str) -> Result<Arc<Template>> {
        if let Some(template) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(name) {
            return Ok(Arc::clone(template));
        }

        let template = Arc::new(self.load(name)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another worker may have loaded it meanwhile; keep the first copy.
        Ok(Arc::clone(cache.entry(name.to_string()).or_insert(template)))
    }

    /// Register a template built in code, replacing any cached one.
    pub fn insert(&self, template: Template) -> Arc<Template> {
        let template = Arc::new(template);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template.name.clone(), Arc::clone(&template));
        template
    }

    /// An extraction engine for site `name`, using the store's locale.
    pub fn parser(&self, name: &str) -> Result<Parser> {
        Ok(Parser::new(self.get(name)?).with_locale(self.options.locale.clone()))
    }

    fn load(&self, name: &str) -> Result<Template> {
        let path = self.options.template_path(name);
        if !is_plain_name(name) || !path.is_file() {
            return Err(Error::TemplateNotFound {
                name: name.to_string(),
                path,
            });
        }

        let json = fs::read_to_string(&path).map_err(|source| Error::TemplateIo {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(template = name, path = %path.display(), "loaded template");
        Template::from_json(name, &json)
    }
}

/// Site names are file stems, never paths.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().is_some_and(|stem| stem == name) && name != ".."
}
