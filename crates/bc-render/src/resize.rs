use bc_core::frame::GrayCanvas;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};

use crate::error::RenderError;

/// Resizer de luminance réutilisable wrappant fast_image_resize (Catmull-Rom).
///
/// Un resizer par tâche : le buffer source est réutilisé d'un beat à l'autre.
///
/// # Example
/// ```
/// use bc_render::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Scratch copy of the source (the API wants `&mut` on the source slice).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new()
                .resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom)),
            src_buf: Vec::new(),
        }
    }

    /// Redimensionne `src` vers `width`×`height`.
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidDimensions`] for a zero target size and
    /// [`RenderError::Resize`] if resampling fails.
    ///
    /// # Example
    /// ```
    /// use bc_render::resize::Resizer;
    /// use bc_core::frame::GrayCanvas;
    /// let mut r = Resizer::new();
    /// let src = GrayCanvas::new(800, 600, 255);
    /// let dst = r.resize(&src, 224, 224).unwrap();
    /// assert_eq!(dst.data.len(), 224 * 224);
    /// assert!(dst.data.iter().all(|&v| v == 255));
    /// ```
    pub fn resize(&mut self, src: &GrayCanvas, width: u32, height: u32) -> Result<GrayCanvas, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        if src.width == width && src.height == height {
            return Ok(src.clone());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image = Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8)
            .map_err(|e| RenderError::Resize(e.to_string()))?;

        let mut dst = GrayCanvas::new(width, height, 0);
        let mut dst_image = Image::from_slice_u8(width, height, &mut dst.data, PixelType::U8)
            .map_err(|e| RenderError::Resize(e.to_string()))?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| RenderError::Resize(e.to_string()))?;

        Ok(dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_size_is_a_copy() {
        let src = GrayCanvas::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(Resizer::new().resize(&src, 2, 2).unwrap(), src);
    }

    #[test]
    fn dark_band_survives_downscale() {
        let mut src = GrayCanvas::new(800, 600, 255);
        for y in 295..305 {
            src.row_mut(y).fill(100);
        }
        let dst = Resizer::new().resize(&src, 224, 224).unwrap();
        let center = dst.pixel(112, 112);
        assert!(center < 200, "center {center}");
        assert_eq!(dst.pixel(112, 10), 255);
    }

    #[test]
    fn zero_size_rejected() {
        let src = GrayCanvas::new(4, 4, 0);
        assert!(matches!(
            Resizer::new().resize(&src, 0, 4),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }
}
