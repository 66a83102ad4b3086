//! Error taxonomy for map operations and render jobs.
//!
//! Every failure surfaced by the library is a [`MapError`]. Callers that need
//! to branch on the category rather than the message use [`MapError::kind`],
//! which maps each variant onto the closed [`ErrorKind`] enumeration.

use std::fmt;
use thiserror::Error;

/// Message used when a render job fails for a reason that carries no detail.
pub const INTERNAL_FAILURE_MESSAGE: &str =
    "unknown failure while rendering the map, please submit a bug report";

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad argument supplied by the caller, reported synchronously.
    Validation,
    /// Stylesheet or configuration problem.
    Config,
    /// Datasource could not be created or queried.
    Datasource,
    /// Spatial reference could not be parsed or transformed.
    Projection,
    /// Failure inside the rendering pipeline.
    Runtime,
    /// Image or document encoding failed.
    Codec,
    /// Layer selector did not resolve.
    NotFound,
    /// Output format could not be inferred.
    UnknownFormat,
    /// Unexpected failure with no further detail.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Config => "config",
            ErrorKind::Datasource => "datasource",
            ErrorKind::Projection => "projection",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Codec => "codec",
            ErrorKind::NotFound => "not-found",
            ErrorKind::UnknownFormat => "unknown-format",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors produced by map mutation, rendering and grid encoding.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapError {
    /// Invalid argument; never scheduled.
    #[error("{0}")]
    Validation(String),

    /// Stylesheet could not be loaded or saved.
    #[error("{0}")]
    Config(String),

    /// Datasource creation or query failure.
    #[error("{0}")]
    Datasource(String),

    /// Projection failure.
    #[error("{0}")]
    Projection(String),

    /// Rendering pipeline failure.
    #[error("{0}")]
    Runtime(String),

    /// Encoder failure or unsupported output format.
    #[error("{0}")]
    Codec(String),

    /// Zero-based layer index beyond the layer list.
    #[error("Zero-based layer index '{index}' not valid, only '{count}' layers are in map")]
    LayerIndexOutOfRange { index: usize, count: usize },

    /// No layer carries the requested name.
    #[error("Layer name '{0}' not found")]
    LayerNotFound(String),

    /// Output format not inferable from a path.
    #[error("unknown output extension for: {0}")]
    UnknownFormat(String),

    /// Unexpected failure.
    #[error("{0}")]
    Internal(String),
}

impl MapError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::Validation(_) => ErrorKind::Validation,
            MapError::Config(_) => ErrorKind::Config,
            MapError::Datasource(_) => ErrorKind::Datasource,
            MapError::Projection(_) => ErrorKind::Projection,
            MapError::Runtime(_) => ErrorKind::Runtime,
            MapError::Codec(_) => ErrorKind::Codec,
            MapError::LayerIndexOutOfRange { .. } | MapError::LayerNotFound(_) => {
                ErrorKind::NotFound
            }
            MapError::UnknownFormat(_) => ErrorKind::UnknownFormat,
            MapError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Builds an [`MapError::Internal`] from a panic payload, falling back to
    /// the generic message when the payload carries no text.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        match crate::panic::panic_message(payload) {
            Some(msg) if !msg.is_empty() => {
                MapError::Internal(format!("{}: {}", INTERNAL_FAILURE_MESSAGE, msg))
            }
            _ => MapError::Internal(INTERNAL_FAILURE_MESSAGE.to_string()),
        }
    }

    /// Whether this error was reported before any work was scheduled.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Convenience alias used throughout the crate.
pub type MapResult<T> = Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_errors_are_not_found() {
        let by_index = MapError::LayerIndexOutOfRange { index: 3, count: 1 };
        let by_name = MapError::LayerNotFound("roads".into());

        assert_eq!(by_index.kind(), ErrorKind::NotFound);
        assert_eq!(by_name.kind(), ErrorKind::NotFound);
        assert_eq!(
            by_index.to_string(),
            "Zero-based layer index '3' not valid, only '1' layers are in map"
        );
        assert_eq!(by_name.to_string(), "Layer name 'roads' not found");
    }

    #[test]
    fn test_unknown_format_message() {
        let err = MapError::UnknownFormat("out.xyz".into());
        assert_eq!(err.kind(), ErrorKind::UnknownFormat);
        assert_eq!(err.to_string(), "unknown output extension for: out.xyz");
    }

    #[test]
    fn test_from_panic_with_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = MapError::from_panic(payload.as_ref());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().ends_with("boom"));
    }

    #[test]
    fn test_from_panic_without_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        let err = MapError::from_panic(payload.as_ref());
        assert_eq!(err.to_string(), INTERNAL_FAILURE_MESSAGE);
    }

    #[test]
    fn test_is_validation() {
        assert!(MapError::Validation("bad".into()).is_validation());
        assert!(!MapError::Runtime("bad".into()).is_validation());
    }
}
