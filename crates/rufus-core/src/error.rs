//! Error types for the Rufus service.

use thiserror::Error;

/// A shared error type for the whole service.
///
/// Each variant corresponds to one failure class the web layer knows how to
/// map to an HTTP status; everything else collapses into `Internal`.
#[derive(Error, Debug, Clone)]
pub enum RufusError {
    /// No live conversation is registered under the given session id.
    #[error("Session not found: '{0}'")]
    SessionNotFound(String),

    /// The catalog source file does not exist.
    #[error("Catalog source not found: {path}")]
    CatalogNotFound { path: String },

    /// The catalog source exists but could not be parsed.
    #[error("Catalog data malformed: {0}")]
    CatalogMalformed(String),

    /// A stored catalog record could not be materialized into a product.
    #[error("Invalid product record '{id}': {message}")]
    Validation { id: String, message: String },

    /// The upstream model service rejected our credentials.
    #[error("Upstream auth failure: {0}")]
    UpstreamAuth(String),

    /// Any other upstream model service failure.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// The client sent an empty file upload.
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RufusError {
    /// Creates a SessionNotFound error
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound(id.into())
    }

    /// Creates a CatalogNotFound error
    pub fn catalog_not_found(path: impl Into<String>) -> Self {
        Self::CatalogNotFound { path: path.into() }
    }

    /// Creates a CatalogMalformed error
    pub fn catalog_malformed(message: impl Into<String>) -> Self {
        Self::CatalogMalformed(message.into())
    }

    /// Creates a Validation error
    pub fn validation(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates an UpstreamAuth error
    pub fn upstream_auth(message: impl Into<String>) -> Self {
        Self::UpstreamAuth(message.into())
    }

    /// Creates an Upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a SessionNotFound error
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }

    /// Check if this is an UpstreamAuth error
    pub fn is_upstream_auth(&self) -> bool {
        matches!(self, Self::UpstreamAuth(_))
    }

    /// Check if this is a catalog load failure (missing or malformed source)
    pub fn is_catalog_load(&self) -> bool {
        matches!(self, Self::CatalogNotFound { .. } | Self::CatalogMalformed(_))
    }
}

/// Conversion from String (for error messages)
impl From<String> for RufusError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, RufusError>`.
pub type Result<T> = std::result::Result<T, RufusError>;
