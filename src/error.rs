//! Error types for template loading and substitution

use std::path::PathBuf;

use thiserror::Error;

use crate::template::MarkerKind;

/// Errors that can occur while loading a template or substituting markers
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The caller broke an argument contract; raised before any mutation
    #[error("invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    /// A marker was placed on an element kind that cannot be substituted
    #[error("can only substitute <rect>, <tspan>, <text> and <g> elements, found <{tag}> (marker '{marker}'): {reason}")]
    TemplateParse {
        tag: String,
        marker: String,
        reason: String,
    },

    /// The marker id is unknown for this kind, or was already consumed
    #[error("no {kind} marker named '{id}'")]
    MarkerNotFound { kind: MarkerKind, id: String },

    /// The same marker id was declared twice for one kind
    #[error("duplicate {kind} marker '{id}'")]
    DuplicateMarker { kind: MarkerKind, id: String },

    /// A document has no top-level group to act as its primary layer
    #[error("the {document} has no top-level <g> layer")]
    MissingLayer { document: &'static str },

    /// A required geometry attribute is absent
    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute { element: String, attribute: String },

    /// A geometry attribute could not be read as a number
    #[error("attribute '{attribute}' is not a number: '{value}'")]
    InvalidNumber { attribute: String, value: String },

    /// Markup is not a well-formed XML document
    #[error("malformed XML at byte {position}: {message}")]
    Parse { position: u64, message: String },

    /// Error reported by the XML reader or writer
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute inside a start tag
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Content was not valid UTF-8
    #[error("invalid UTF-8 in {context}")]
    Encoding { context: &'static str },

    /// A file source could not be opened or read
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a stream or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration cannot be used
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A content source exceeded the configured size limit
    #[error("source exceeds the {limit} byte limit")]
    SourceTooLarge { limit: u64 },
}

impl TemplateError {
    /// Create an invalid arguments error
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }

    /// Create a template parse error for a marker on an unsupported element
    pub fn unsupported_element(tag: impl Into<String>, marker: impl Into<String>) -> Self {
        Self::TemplateParse {
            tag: tag.into(),
            marker: marker.into(),
            reason: "unsupported element".to_string(),
        }
    }

    /// Create a template parse error for a malformed but supported element
    pub fn template_parse(
        tag: impl Into<String>,
        marker: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TemplateParse {
            tag: tag.into(),
            marker: marker.into(),
            reason: reason.into(),
        }
    }

    /// Create a marker not found error
    pub fn marker_not_found(kind: MarkerKind, id: impl Into<String>) -> Self {
        Self::MarkerNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a malformed XML error
    pub fn parse(position: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a missing attribute error
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// The offending tag of a template parse error
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::TemplateParse { tag, .. } => Some(tag),
            _ => None,
        }
    }
}
