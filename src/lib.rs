//! SVG Stencil - fill marked placeholders in SVG templates
//!
//! Template authors tag elements with a marker attribute; callers then swap in
//! text, raster images (linked or embedded) or whole SVG fragments, and
//! serialize the result.
//!
//! # Example
//!
//! ```rust
//! use svg_stencil::{load, Source};
//!
//! let mut doc = load(Source::text(
//!     r#"<svg xmlns="http://www.w3.org/2000/svg"><text><tspan template-id="name">?</tspan></text></svg>"#,
//! ))
//! .unwrap();
//! doc.set_text("name", "Ada").unwrap();
//!
//! let svg = doc.serialize().unwrap();
//! assert!(svg.contains("<tspan>Ada</tspan>"));
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod template;

pub use config::{ConfigError, TemplateConfig};
pub use error::TemplateError;
pub use template::{
    IdGenerator, MarkerKind, Placement, SequentialIds, Source, TemplateDocument, UuidGenerator,
};

/// Load a template with the default configuration
///
/// This is the main entry point for the library.
///
/// # Example
///
/// ```rust
/// use svg_stencil::{load, MarkerKind, Source};
///
/// let doc = load(Source::text(r#"<svg><g template-id="legend"/></svg>"#)).unwrap();
/// assert_eq!(doc.markers(MarkerKind::Group), vec!["legend"]);
/// ```
pub fn load(source: Source<'_>) -> Result<TemplateDocument, TemplateError> {
    TemplateDocument::load(source)
}

/// Load a template with a custom configuration
///
/// # Example
///
/// ```rust
/// use svg_stencil::{load_with_config, MarkerKind, Source, TemplateConfig};
///
/// let config = TemplateConfig::new().with_marker_attribute("data-slot");
/// let doc = load_with_config(Source::text(r#"<svg><rect data-slot="logo"/></svg>"#), config).unwrap();
/// assert!(doc.has_marker(MarkerKind::Rect, "logo"));
/// ```
pub fn load_with_config(
    source: Source<'_>,
    config: TemplateConfig,
) -> Result<TemplateDocument, TemplateError> {
    TemplateDocument::load_with_config(source, config)
}
