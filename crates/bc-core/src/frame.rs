/// Buffer de luminance réutilisable, un octet par pixel, row-major.
///
/// Surface de dessin du renderer et format des images du corpus.
///
/// # Example
/// ```
/// use bc_core::frame::GrayCanvas;
/// let c = GrayCanvas::new(10, 10, 255);
/// assert_eq!(c.data.len(), 100);
/// assert_eq!(c.pixel(3, 3), 255);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayCanvas {
    /// Luminance values, row-major.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl GrayCanvas {
    /// Crée un canvas rempli avec `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: u8) -> Self {
        Self {
            data: vec![fill; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wrap an existing buffer. Returns `None` if the length does not match.
    ///
    /// # Example
    /// ```
    /// use bc_core::frame::GrayCanvas;
    /// assert!(GrayCanvas::from_raw(2, 2, vec![0; 4]).is_some());
    /// assert!(GrayCanvas::from_raw(2, 2, vec![0; 3]).is_none());
    /// ```
    #[must_use]
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            data,
            width,
            height,
        })
    }

    /// Luminance au pixel (x, y). Hors-limites → 0.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Mutable row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.data[start..start + w]
    }

    /// Pixels normalisés dans `[0, 1]`, dans l'ordre row-major.
    ///
    /// # Example
    /// ```
    /// use bc_core::frame::GrayCanvas;
    /// let c = GrayCanvas::from_raw(2, 1, vec![0, 255]).unwrap();
    /// assert_eq!(c.normalized(), vec![0.0, 1.0]);
    /// ```
    #[must_use]
    pub fn normalized(&self) -> Vec<f32> {
        self.data.iter().map(|&v| f32::from(v) / 255.0).collect()
    }
}
