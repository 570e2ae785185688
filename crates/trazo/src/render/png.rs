//! PNG encoding: the scene's SVG rasterized with `resvg`.

use log::debug;
use resvg::{tiny_skia, usvg};

use super::{RenderError, scene::Scene, svg};

/// Rasterizes `scene` at one pixel per canvas unit.
///
/// # Errors
///
/// Returns [`RenderError::Raster`] if the generated SVG cannot be parsed,
/// the canvas cannot be allocated, or PNG encoding fails.
pub fn encode(scene: &Scene) -> Result<Vec<u8>, RenderError> {
    let document = svg::to_document(scene).to_string();

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(&document, &options)
        .map_err(|err| RenderError::Raster(format!("failed to parse generated SVG: {err}")))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        RenderError::Raster(format!(
            "failed to allocate {}x{} surface",
            size.width(),
            size.height()
        ))
    })?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    debug!(width = size.width(), height = size.height(); "Rasterized scene");

    pixmap
        .encode_png()
        .map_err(|err| RenderError::Raster(format!("failed to encode PNG: {err}")))
}
