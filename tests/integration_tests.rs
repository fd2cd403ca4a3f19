//! Integration tests for template loading and substitution

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Cursor, Write};

use pretty_assertions::assert_eq;

use svg_stencil::dom::{self, Document};
use svg_stencil::{
    load, load_with_config, MarkerKind, Placement, SequentialIds, Source, TemplateConfig,
    TemplateDocument, TemplateError,
};

const BADGE: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" width="200" height="100">
  <g inkscape:label="Layer 1" inkscape:groupmode="layer" id="layer1">
    <rect template-id="logo" id="rect1" x="10" y="10" width="50" height="40" fill="#ccc" style="stroke:none"/>
    <text x="70" y="30"><tspan template-id="title" id="tspan1">Title</tspan></text>
    <text template-id="subtitle" x="70" y="50"><tspan id="tspan2">Subtitle</tspan></text>
    <g template-id="watermark" id="g1"><path d="M0 0 L10 10"/></g>
    <rect template-id="marker" id="rect2" x="100" y="80" width="5" height="5"/>
  </g>
</svg>
"##;

const PIN: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" width="8" height="12">
  <sodipodi:namedview id="base"/>
  <g inkscape:label="Pin" id="layer1" transform="translate(0,-1040)">
    <path id="path1" sodipodi:nodetypes="ccc" d="M4 12 L0 4 L8 4 Z"/>
    <circle id="circle1" cx="4" cy="4" r="3"/>
  </g>
</svg>
"##;

const ILLUSTRATOR: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<!-- Generator: Adobe Illustrator 16.0.0, SVG Export Plug-In . SVG Version: 6.00 Build 0)  -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
	<!ENTITY ns_extend "http://ns.adobe.com/Extensibility/1.0/">
	<!ENTITY ns_svg "http://www.w3.org/2000/svg">
	<!ENTITY ns_xlink "http://www.w3.org/1999/xlink">
]>
<svg version="1.1" xmlns:x="&ns_extend;" xmlns="&ns_svg;" xmlns:xlink="&ns_xlink;" width="100" height="50">
<g id="Layer_1"><rect template-id="logo" x="0" y="0" width="10" height="10"/><text><tspan template-id="name">?</tspan></text></g>
</svg>
"##;

fn ids_in(markup: &str) -> Vec<String> {
    let doc = dom::parse(markup).expect("Should parse");
    doc.descendants(Document::ROOT)
        .into_iter()
        .filter_map(|n| doc.element(n).and_then(|el| el.attribute("id")).map(str::to_string))
        .collect()
}

#[test]
fn test_indexes_every_marker_kind() {
    let doc = load(Source::text(BADGE)).expect("Should load");
    assert_eq!(doc.markers(MarkerKind::Rect), vec!["logo", "marker"]);
    assert_eq!(doc.markers(MarkerKind::Span), vec!["subtitle", "title"]);
    assert_eq!(doc.markers(MarkerKind::Group), vec!["watermark"]);
    assert!(!doc.serialize().expect("serialize").contains("template-id"));
}

#[test]
fn test_set_text_on_tspan_and_text() {
    let mut doc = load(Source::text(BADGE)).expect("Should load");
    doc.set_text("title", "Hello").expect("set title");
    doc.set_text("subtitle", "World & more").expect("set subtitle");

    let out = doc.serialize().expect("serialize");
    assert!(out.contains(r#"<tspan id="tspan1">Hello</tspan>"#));
    assert!(out.contains(r#"<tspan id="tspan2">World &amp; more</tspan>"#));
    assert!(out.contains(r#"<text x="70" y="50">"#));
}

#[test]
fn test_set_image_link_keeps_geometry_only() {
    let mut doc = load(Source::text(BADGE)).expect("Should load");
    doc.set_image("logo", Source::path("assets/logo.png"), None)
        .expect("set image");

    let out = doc.serialize().expect("serialize");
    assert!(out.contains(
        r#"<image x="10" y="10" width="50" height="40" style="stroke:none" preserveAspectRatio="none" xlink:href="assets/logo.png"/>"#
    ));
    assert!(!out.contains("rect1"));
}

#[test]
fn test_set_image_embeds_file_and_stream() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("logo.png");
    File::create(&path)
        .and_then(|mut f| f.write_all(b"\x89PNG\r\n\x1a\n"))
        .expect("write png");

    let mut doc = load(Source::text(BADGE)).expect("Should load");
    doc.set_image("logo", Source::path(&path), Some("image/png"))
        .expect("embed from path");
    let file = File::open(&path).expect("open");
    doc.set_image("marker", Source::stream(file), Some("image/png"))
        .expect("embed from stream");

    let out = doc.serialize().expect("serialize");
    assert_eq!(
        out.matches(r#"xlink:href="data:image/png;base64,iVBORw0KGgo=""#).count(),
        2
    );
}

#[test]
fn test_set_image_missing_file() {
    let mut doc = load(Source::text(BADGE)).expect("Should load");
    let err = doc
        .set_image("logo", Source::path("/no/such/logo.png"), Some("image/png"))
        .expect_err("missing file");
    assert!(matches!(err, TemplateError::ReadFile { .. }));
    assert!(doc.has_marker(MarkerKind::Rect, "logo"));
}

#[test]
fn test_set_svg_splices_pin() {
    let mut doc = load(Source::text(BADGE))
        .expect("Should load")
        .with_id_generator(SequentialIds::new("pin-"));
    doc.set_svg("marker", Source::text(PIN), Placement::new().with_scale_x(2.0))
        .expect("set svg");

    let out = doc.serialize().expect("serialize");
    assert!(out.contains(
        r#"<g inkscape:label="Pin" id="pin-1" transform="scale (2, 1) translate(200.0, 68.0)" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd">"#
    ));
    assert!(out.contains(r#"<path id="pin-2" sodipodi:nodetypes="ccc""#));
    assert!(out.contains(r#"<circle id="pin-3""#));
    assert!(!out.contains("rect2"));
    assert!(!out.contains("namedview"));

    // appended as the last child of the host layer
    assert!(out.ends_with("<circle id=\"pin-3\" cx=\"4\" cy=\"4\" r=\"3\"/>\n  </g></g>\n</svg>\n"));
    assert!(matches!(
        doc.set_svg("marker", Source::text(PIN), Placement::default()),
        Err(TemplateError::MarkerNotFound { .. })
    ));
}

#[test]
fn test_set_svg_ids_are_fresh() {
    let mut doc = load(Source::text(BADGE)).expect("Should load");
    let before: HashSet<String> = ids_in(&doc.serialize().expect("serialize")).into_iter().collect();

    doc.set_svg("marker", Source::text(PIN), Placement::default())
        .expect("set svg");
    let after = ids_in(&doc.serialize().expect("serialize"));

    let fresh: Vec<&String> = after.iter().filter(|id| !before.contains(*id)).collect();
    assert_eq!(fresh.len(), 3);
    assert!(fresh.iter().all(|id| id.len() == 36));
    let unique: HashSet<&&String> = fresh.iter().collect();
    assert_eq!(unique.len(), 3);
    // The host's own layer1 is still there exactly once.
    assert_eq!(after.iter().filter(|id| id.as_str() == "layer1").count(), 1);
}

#[test]
fn test_set_svg_offsets() {
    let mut doc = load(Source::text(BADGE))
        .expect("Should load")
        .with_id_generator(SequentialIds::new("p"));
    doc.set_svg(
        "marker",
        Source::text(PIN),
        Placement::new().with_offset(1.5, -2.0),
    )
    .expect("set svg");
    assert!(doc
        .serialize()
        .expect("serialize")
        .contains(r#"transform="scale (1, 1) translate(101.5, 66.0)""#));
}

#[test]
fn test_remove_group_twice() {
    let mut doc = load(Source::text(BADGE)).expect("Should load");
    doc.remove_group("watermark").expect("first removal");
    assert!(!doc.serialize().expect("serialize").contains("M0 0 L10 10"));

    let err = doc.remove_group("watermark").expect_err("second removal");
    assert!(matches!(
        err,
        TemplateError::MarkerNotFound {
            kind: MarkerKind::Group,
            ..
        }
    ));
}

#[test]
fn test_remove_rect_then_set_image_fails() {
    let mut doc = load(Source::text(BADGE)).expect("Should load");
    doc.remove_rect("logo").expect("remove");
    assert!(matches!(
        doc.set_image("logo", Source::path("a.png"), None),
        Err(TemplateError::MarkerNotFound { .. })
    ));
}

#[test]
fn test_unsupported_marker_names_tag() {
    let err = TemplateDocument::parse(
        r#"<svg xmlns="http://www.w3.org/2000/svg"><g><polygon template-id="shape"/></g></svg>"#,
    )
    .expect_err("polygon marker");
    assert_eq!(err.tag(), Some("polygon"));
}

#[test]
fn test_prefixed_svg_document() {
    let mut doc = TemplateDocument::parse(
        r#"<s:svg xmlns:s="http://www.w3.org/2000/svg"><s:g><s:rect template-id="r" x="1"/></s:g></s:svg>"#,
    )
    .expect("Should load");
    doc.set_image("r", Source::path("a.png"), None).expect("set image");
    assert_eq!(
        doc.serialize().expect("serialize"),
        r#"<s:svg xmlns:s="http://www.w3.org/2000/svg"><s:defs/><s:g><s:image x="1" xmlns:xlink="http://www.w3.org/1999/xlink" preserveAspectRatio="none" xlink:href="a.png"/></s:g></s:svg>"#
    );
}

#[test]
fn test_small_template_snapshot() {
    let mut doc = TemplateDocument::parse(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><g><rect template-id="r1" id="a" x="1" y="2" width="3" height="4" fill="red"/><text><tspan template-id="t1">x</tspan></text></g></svg>"#,
    )
    .expect("Should load");
    doc.set_image("r1", Source::path("logo.png"), None).expect("set image");
    doc.set_text("t1", "Hello").expect("set text");

    insta::assert_snapshot!(doc.serialize().expect("serialize"), @r###"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><defs/><g><image x="1" y="2" width="3" height="4" preserveAspectRatio="none" xlink:href="logo.png"/><text><tspan>Hello</tspan></text></g></svg>"###);
}

#[test]
fn test_load_from_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("badge.svg");
    fs::write(&path, BADGE).expect("write template");

    let from_path = load(Source::path(&path)).expect("Should load");
    let from_text = load(Source::text(BADGE)).expect("Should load");
    assert_eq!(
        from_path.serialize().expect("serialize"),
        from_text.serialize().expect("serialize")
    );
    assert_eq!(from_path.markers(MarkerKind::Rect), vec!["logo", "marker"]);

    let config = TemplateConfig::new().with_base_path(dir.path());
    let relative = load_with_config(Source::path("badge.svg"), config).expect("Should load");
    assert!(relative.has_marker(MarkerKind::Group, "watermark"));
}

#[test]
fn test_load_from_stream() {
    let mut doc = load(Source::stream(Cursor::new(BADGE.as_bytes()))).expect("Should load");
    assert_eq!(doc.markers(MarkerKind::Span), vec!["subtitle", "title"]);

    doc.set_text("title", "Streamed").expect("set text");
    assert!(doc
        .serialize()
        .expect("serialize")
        .contains(r#"<tspan id="tspan1">Streamed</tspan>"#));
}

#[test]
fn test_illustrator_entities_resolve() {
    let mut doc = load(Source::text(ILLUSTRATOR)).expect("Should load");
    assert!(doc.has_marker(MarkerKind::Rect, "logo"));
    doc.set_image("logo", Source::path("logo.png"), None)
        .expect("set image");
    doc.set_text("name", "Acme").expect("set text");

    let out = doc.serialize().expect("serialize");
    assert!(out.contains("<!ENTITY ns_svg \"http://www.w3.org/2000/svg\">"));
    assert!(out.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    assert!(out.contains(
        r#"<image x="0" y="0" width="10" height="10" preserveAspectRatio="none" xlink:href="logo.png"/>"#
    ));
    assert!(out.contains("<tspan>Acme</tspan>"));
    assert_eq!(load(Source::text(&out)).expect("Should reload").serialize().expect("serialize"), out);
}

#[test]
fn test_deeply_nested_template() {
    let depth = 3000;
    let template = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg"><g>{}<rect template-id="slot" x="1" y="9"/>{}</g></svg>"#,
        "<g>".repeat(depth),
        "</g>".repeat(depth)
    );
    let fragment = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" height="4"><g>{}<path/>{}</g></svg>"#,
        "<g>".repeat(depth),
        "</g>".repeat(depth)
    );

    let mut doc = load(Source::text(&template))
        .expect("Should load")
        .with_id_generator(SequentialIds::new("d"));
    doc.set_svg("slot", Source::text(&fragment), Placement::default())
        .expect("set svg");

    let out = doc.serialize().expect("serialize");
    assert!(out.contains(r#"<g id="d1" transform="scale (1, 1) translate(1.0, 5.0)">"#));
    assert!(out.contains(&format!(r#"<path id="d{}"/>"#, depth + 2)));
    assert!(!out.contains("<rect"));
}
