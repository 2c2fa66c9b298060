use std::io::{BufWriter, Write};
use std::path::Path;

use bc_core::frame::GrayCanvas;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tempfile::NamedTempFile;

use crate::error::RenderError;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Écrit `canvas` en PNG niveaux de gris à `path`, de façon atomique.
///
/// The image is encoded into a temp file in the destination directory, then
/// renamed over `path`. A concurrent reader never sees a partial file; on
/// failure the temp file is removed and `path` is untouched.
///
/// # Errors
/// Returns [`RenderError::Io`] on filesystem failure, [`RenderError::Encode`] on encoding failure.
///
/// # Example
/// ```
/// use bc_core::frame::GrayCanvas;
/// use bc_render::persist::write_png_atomic;
/// let dir = std::env::temp_dir().join("bc_persist_doc");
/// std::fs::create_dir_all(&dir).unwrap();
/// write_png_atomic(&GrayCanvas::new(4, 4, 255), &dir.join("x.png")).unwrap();
/// assert!(dir.join("x.png").exists());
/// ```
pub fn write_png_atomic(canvas: &GrayCanvas, path: &Path) -> Result<(), RenderError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err(dir))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        PngEncoder::new(&mut writer).write_image(
            &canvas.data,
            canvas.width,
            canvas.height,
            ExtendedColorType::L8,
        )?;
        writer.flush().map_err(io_err(path))?;
    }

    tmp.persist(path).map_err(|e| RenderError::Io {
        path: path.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}
