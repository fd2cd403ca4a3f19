//! Template markers and placeholder substitution
//!
//! A template is an SVG document in which placeholder elements carry a marker
//! attribute (`template-id` by default). Loading strips the markers and
//! indexes the elements; substitutions then rewrite them in place.
//!
//! | Marked element | Kind | Operations |
//! |----------------|------|------------|
//! | `<rect>` | [`MarkerKind::Rect`] | image, embedded SVG, removal |
//! | `<tspan>`, `<text>` | [`MarkerKind::Span`] | text |
//! | `<g>` | [`MarkerKind::Group`] | removal |
//!
//! # Example
//!
//! ```rust
//! use svg_stencil::{MarkerKind, Placement, Source, TemplateDocument};
//!
//! let mut doc = TemplateDocument::parse(r#"<svg xmlns="http://www.w3.org/2000/svg">
//!   <g id="layer1"><rect template-id="pin" x="5" y="20" width="4" height="4"/></g>
//! </svg>"#).unwrap();
//!
//! let pin = r#"<svg xmlns="http://www.w3.org/2000/svg" height="10"><g><path d="M0 0"/></g></svg>"#;
//! doc.set_svg("pin", Source::text(pin), Placement::new().with_scale_x(2.0)).unwrap();
//!
//! let svg = doc.serialize().unwrap();
//! assert!(svg.contains("scale (2, 1) translate(10.0, 10.0)"));
//! assert!(!doc.has_marker(MarkerKind::Rect, "pin"));
//! ```

mod document;
mod ids;
mod placement;
mod registry;
mod source;

pub use document::TemplateDocument;
pub use ids::{regenerate_ids, IdGenerator, SequentialIds, UuidGenerator};
pub use placement::{parse_length, Placement};
pub use registry::{MarkerKind, MarkerRegistry};
pub use source::Source;

/// The SVG namespace
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// The XLink namespace used for image references
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Attributes a placeholder rect keeps when it becomes an image
pub const IMAGE_ATTRIBUTES: [&str; 5] = ["x", "y", "width", "height", "style"];
