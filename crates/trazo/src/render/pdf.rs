//! Single-page PDF encoding of a [`Scene`].
//!
//! The document is written directly: a catalog, one page sized to the
//! canvas, one content stream and the two standard Helvetica fonts, so no
//! font files are embedded. PDF puts the origin bottom left, so every y
//! coordinate is flipped against the page height.

use std::fmt::Write;

use log::debug;

use trazo_core::{color::Color, geometry::Point, style::StrokeDefinition};

use super::{
    RenderError,
    scene::{Item, Label, Line, Rect, Scene},
};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Serializes `scene` as a one-page PDF document.
///
/// # Errors
///
/// Returns [`RenderError::Pdf`] if formatting the document fails.
pub fn encode(scene: &Scene) -> Result<Vec<u8>, RenderError> {
    let size = scene.size();
    let content = content_stream(scene)?;

    let mut objects = Vec::with_capacity(6);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push("<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string());
    objects.push(format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
         /Resources << /Font << /{REGULAR_FONT} 5 0 R /{BOLD_FONT} 6 0 R >> >> /Contents 4 0 R >>",
        number(size.width()),
        number(size.height()),
    ));
    objects.push(format!(
        "<< /Length {} >>\nstream\n{content}\nendstream",
        content.len()
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{body}\nendobj\n", index + 1)?;
    }

    let xref = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF",
        objects.len() + 1
    )?;

    debug!(bytes = out.len(), items = scene.items().len(); "Serialized PDF");
    Ok(out.into_bytes())
}

/// Drawing operators for every item, in painting order.
fn content_stream(scene: &Scene) -> Result<String, RenderError> {
    let height = scene.size().height();
    let flip = |p: Point| Point::new(p.x(), height - p.y());
    let mut ops = String::new();

    if let Some(background) = scene.background() {
        writeln!(
            ops,
            "{} rg 0 0 {} {} re f",
            rgb(background),
            number(scene.size().width()),
            number(height)
        )?;
    }

    for item in scene.items() {
        match item {
            Item::Rect(rect) => write_rect(&mut ops, rect, &flip)?,
            Item::Line(line) => write_line(&mut ops, line, &flip)?,
            Item::Text(label) => write_label(&mut ops, label, &flip)?,
        }
    }
    Ok(ops)
}

fn write_rect(ops: &mut String, rect: &Rect, flip: &impl Fn(Point) -> Point) -> Result<(), RenderError> {
    let bottom_left = flip(rect.top_left().with_y(rect.top_left().y() + rect.size().height()));
    let paint = match (rect.fill(), rect.stroke()) {
        (None, None) => return Ok(()),
        (Some(_), None) => "f",
        (None, Some(_)) => "S",
        (Some(_), Some(_)) => "B",
    };

    if let Some(fill) = rect.fill() {
        write!(ops, "{} rg ", rgb(fill))?;
    }
    if let Some(stroke) = rect.stroke() {
        write_stroke_state(ops, stroke)?;
    }
    writeln!(
        ops,
        "{} {} {} {} re {paint}",
        number(bottom_left.x()),
        number(bottom_left.y()),
        number(rect.size().width()),
        number(rect.size().height()),
    )?;
    Ok(())
}

fn write_line(ops: &mut String, line: &Line, flip: &impl Fn(Point) -> Point) -> Result<(), RenderError> {
    let Some((first, rest)) = line.points().split_first() else {
        return Ok(());
    };
    write_stroke_state(ops, line.stroke())?;

    let start = flip(*first);
    write!(ops, "{} {} m", number(start.x()), number(start.y()))?;
    for point in rest {
        let point = flip(*point);
        write!(ops, " {} {} l", number(point.x()), number(point.y()))?;
    }
    writeln!(ops, " S")?;

    let heads = [line.start_arrowhead(), line.end_arrowhead()];
    for [tip, left, right] in heads.into_iter().flatten() {
        let (tip, left, right) = (flip(tip), flip(left), flip(right));
        writeln!(
            ops,
            "{} rg [] 0 d {} {} m {} {} l {} {} l h f",
            rgb(line.stroke().color()),
            number(tip.x()),
            number(tip.y()),
            number(left.x()),
            number(left.y()),
            number(right.x()),
            number(right.y()),
        )?;
    }
    Ok(())
}

fn write_label(ops: &mut String, label: &Label, flip: &impl Fn(Point) -> Point) -> Result<(), RenderError> {
    let origin = flip(Point::new(label.left(), label.baseline().y()));
    let font = if label.is_bold() { BOLD_FONT } else { REGULAR_FONT };
    writeln!(
        ops,
        "BT /{font} {} Tf {} rg {} {} Td ({}) Tj ET",
        label.text().font_size(),
        rgb(label.text().color()),
        number(origin.x()),
        number(origin.y()),
        escape(label.content()),
    )?;
    Ok(())
}

/// Sets stroke color, width and dash pattern.
fn write_stroke_state(ops: &mut String, stroke: &StrokeDefinition) -> Result<(), RenderError> {
    let dashes: Vec<String> = stroke
        .style()
        .dash_array()
        .into_iter()
        .map(number)
        .collect();
    write!(
        ops,
        "{} RG {} w [{}] 0 d ",
        rgb(stroke.color()),
        number(stroke.width()),
        dashes.join(" ")
    )?;
    Ok(())
}

/// Color as the three operands of `rg`/`RG`.
fn rgb(color: Color) -> String {
    let [r, g, b, _] = color.to_srgb_components();
    format!("{} {} {}", number(r), number(g), number(b))
}

/// Number with at most two decimals and no trailing zeros.
fn number(value: f32) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Escapes a string literal. Characters outside printable ASCII become `?`.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}
