//! Standalone SVG and Markdown export of a canvas.

use cn_core::geometry::{Point, Rect};
use cn_core::model::{DiagramElement, Document, ElementKind};
use std::fmt::Write;

const FONT_IMPORT: &str =
    "@import url('https://fonts.googleapis.com/css2?family=Inter:wght@400;700&display=swap');";
const STROKE: &str = "#1F2937";
const FILL: &str = "#FFFFFF";
const CORNER_RADIUS: f32 = 8.0;
const STICKY_TILT_DEG: f32 = -2.0;

/// A file ready to hand to the host for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

/// The notes, verbatim, as `<name>-notes.md`.
pub fn export_notes(doc: &Document) -> ExportFile {
    ExportFile {
        file_name: format!("{}-notes.md", doc.name),
        mime_type: "text/markdown",
        contents: doc.notes.clone(),
    }
}

/// The diagram as `<name>-diagram.svg`, viewed through the document's
/// current transform.
pub fn export_diagram(doc: &Document) -> ExportFile {
    log::debug!(
        "exporting {} element(s), {} connection(s) as SVG",
        doc.elements().len(),
        doc.connections().len()
    );
    ExportFile {
        file_name: format!("{}-diagram.svg", doc.name),
        mime_type: "image/svg+xml",
        contents: render_svg(doc),
    }
}

pub fn render_svg(doc: &Document) -> String {
    let t = doc.transform;
    let mut svg = String::new();
    svg.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100%\" height=\"100%\">\n");
    svg.push_str("<defs>\n");
    let _ = writeln!(
        svg,
        "  <style>{FONT_IMPORT} text {{ font-family: Inter, sans-serif; }}</style>"
    );
    let _ = writeln!(
        svg,
        "  <marker id=\"arrowhead\" markerWidth=\"10\" markerHeight=\"7\" refX=\"8\" refY=\"3.5\" orient=\"auto\" markerUnits=\"strokeWidth\"><path d=\"M0,0 L0,7 L9,3.5 z\" fill=\"{STROKE}\" /></marker>"
    );
    svg.push_str("</defs>\n");
    let _ = writeln!(
        svg,
        "<g transform=\"translate({}, {}) scale({})\">",
        t.dx, t.dy, t.scale
    );

    let stroke_width = 2.0 / t.scale;
    for conn in doc.connections() {
        let (Some(a), Some(b)) = (
            doc.element(conn.source.element_id),
            doc.element(conn.target.element_id),
        ) else {
            continue;
        };
        let (p, q) = (a.bounds().center(), b.bounds().center());
        let _ = writeln!(
            svg,
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{STROKE}\" stroke-width=\"{stroke_width}\" marker-end=\"url(#arrowhead)\" />",
            p.x, p.y, q.x, q.y
        );
    }

    for el in doc.elements() {
        render_element(&mut svg, el, stroke_width);
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

fn render_element(out: &mut String, el: &DiagramElement, stroke_width: f32) {
    let style = format!("fill=\"{FILL}\" stroke=\"{STROKE}\" stroke-width=\"{stroke_width}\"");
    let Some(r) = el.rect() else {
        if let Some(points) = el.points() {
            let _ = writeln!(
                out,
                "  <polyline points=\"{}\" fill=\"none\" stroke=\"{STROKE}\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\" stroke-linejoin=\"round\" />",
                point_list(points)
            );
        }
        return;
    };
    let c = r.center();

    match el.kind() {
        ElementKind::Rectangle => {
            let _ = writeln!(
                out,
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{CORNER_RADIUS}\" ry=\"{CORNER_RADIUS}\" {style} />",
                r.x, r.y, r.width, r.height
            );
        }
        ElementKind::Circle => {
            let _ = writeln!(
                out,
                "  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {style} />",
                c.x,
                c.y,
                r.width / 2.0,
                r.height / 2.0
            );
        }
        ElementKind::Diamond => {
            let pts = [
                Point::new(c.x, r.y),
                Point::new(r.right(), c.y),
                Point::new(c.x, r.bottom()),
                Point::new(r.x, c.y),
            ];
            let _ = writeln!(out, "  <polygon points=\"{}\" {style} />", point_list(&pts));
        }
        ElementKind::Triangle => {
            let pts = [
                Point::new(c.x, r.y),
                Point::new(r.right(), r.bottom()),
                Point::new(r.x, r.bottom()),
            ];
            let _ = writeln!(out, "  <polygon points=\"{}\" {style} />", point_list(&pts));
        }
        ElementKind::Cylinder => {
            let _ = writeln!(out, "  <path d=\"{}\" {style} />", cylinder_path(&r));
            let cap = cylinder_cap(&r);
            let _ = writeln!(
                out,
                "  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {style} />",
                c.x,
                r.y + cap / 2.0,
                r.width / 2.0,
                cap / 2.0
            );
        }
        ElementKind::StickyNote => {
            let fill = el.background_color.as_deref().unwrap_or(FILL);
            let _ = writeln!(
                out,
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"none\" transform=\"rotate({STICKY_TILT_DEG} {} {})\" />",
                r.x,
                r.y,
                r.width,
                r.height,
                escape(fill),
                c.x,
                c.y
            );
        }
        ElementKind::Text | ElementKind::FreehandDrawing => {}
    }

    if !el.content.is_empty() {
        let tilt = if el.kind() == ElementKind::StickyNote {
            format!(" transform=\"rotate({STICKY_TILT_DEG} {} {})\"", c.x, c.y)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-size=\"14\" fill=\"{STROKE}\"{tilt}>{}</text>",
            c.x,
            c.y,
            escape(&el.content)
        );
    }
}

fn cylinder_cap(r: &Rect) -> f32 {
    (r.height * 0.3).min(20.0)
}

fn cylinder_path(r: &Rect) -> String {
    let (x, y, w, h) = (r.x, r.y, r.width, r.height);
    let e = cylinder_cap(r) / 2.0;
    format!(
        "M{x},{} C{x},{} {},{} {},{} L{},{} C{},{} {x},{} {x},{} Z",
        y + e,
        y - e,
        x + w,
        y - e,
        x + w,
        y + e,
        x + w,
        y + h - e,
        x + w,
        y + h + e,
        y + h + e,
        y + h - e,
    )
}

fn point_list(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
