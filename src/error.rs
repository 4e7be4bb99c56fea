//! Error types for calendar-extract.
//!
//! Only configuration problems are errors. Everything that can go wrong while
//! reading a page (missing elements, surplus values, unparseable dates) is a
//! non-fatal diagnostic, see [`crate::Diagnostics`].

use std::path::PathBuf;

/// Error type for engine and template operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The template has no definition for the requested page.
    #[error("Page '{page}' is not defined for '{template}' template")]
    UnknownPage {
        /// Requested page name.
        page: String,
        /// Template the page was looked up in.
        template: String,
    },

    /// A root-dependent call was made before a document was supplied.
    #[error("No document to search, call Parser::set_document first")]
    MissingDocument,

    /// No template file exists for the requested site.
    #[error("Template '{name}' not found at {}", path.display())]
    TemplateNotFound {
        /// Template name as requested.
        name: String,
        /// Path that was probed.
        path: PathBuf,
    },

    /// The template file could not be read.
    #[error("Failed to read template {}: {source}", path.display())]
    TemplateIo {
        /// Path of the template file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The template file is not a valid template document.
    #[error("Malformed template '{name}': {source}")]
    TemplateParse {
        /// Template name.
        name: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The template parsed but declares something the engine cannot run.
    #[error("Invalid template '{name}': {reason}")]
    TemplateInvalid {
        /// Template name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The calendar page URL used to resolve event links is invalid.
    #[error("Invalid calendar URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
