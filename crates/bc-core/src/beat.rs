use crate::error::CoreError;
use crate::record::Record;

/// Fenêtre appliquée quand le début ET la fin calculés sont négatifs.
pub const FALLBACK_WINDOW: BeatWindow = BeatWindow { start: 0, end: 60 };

/// Demi-intervalle `[start, end)` en indices d'échantillons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeatWindow {
    /// First sample (inclusive).
    pub start: usize,
    /// Last sample (exclusive).
    pub end: usize,
}

impl BeatWindow {
    /// Realize a window from raw, possibly negative bounds.
    ///
    /// Both bounds negative → [`FALLBACK_WINDOW`]. Only `start` negative →
    /// `start` clamped to 0, `end` kept. The asymmetry is observed behavior of
    /// the reference dataset tooling and is kept as is.
    ///
    /// # Example
    /// ```
    /// use bc_core::beat::{BeatWindow, FALLBACK_WINDOW};
    /// assert_eq!(BeatWindow::from_bounds(-40, -5), FALLBACK_WINDOW);
    /// assert_eq!(BeatWindow::from_bounds(-40, 80), BeatWindow { start: 0, end: 80 });
    /// ```
    #[must_use]
    pub fn from_bounds(start: i64, end: i64) -> Self {
        if start < 0 && end < 0 {
            return FALLBACK_WINDOW;
        }
        Self {
            start: start.max(0) as usize,
            end: end.max(0) as usize,
        }
    }

    /// Number of samples covered. Zero for inverted windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// `true` when the window covers no sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Un battement extrait, dérivé de deux annotations successives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Beat {
    /// Owning record.
    pub record_id: String,
    /// Position of the beat within its record (0-based).
    pub index: usize,
    /// Realized sample window.
    pub window: BeatWindow,
    /// Class label, taken from the *current* annotation.
    pub label: String,
}

/// Offsets retranchés aux deux annotations encadrant un beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowOffsets {
    /// Subtracted from `annotations[i]` to get the window start.
    pub start: u32,
    /// Subtracted from `annotations[i + 1]` to get the window end.
    pub end: u32,
}

impl Default for WindowOffsets {
    fn default() -> Self {
        Self {
            start: 100,
            end: 100,
        }
    }
}

/// Découpe un record en `len(annotations) - 1` beats.
///
/// Beat `i` spans `annotations[i] - start` .. `annotations[i + 1] - end` and
/// carries `annotations[i].symbol`: the end is governed by the next marker,
/// the label by the current one. The last annotation is only a boundary.
///
/// # Errors
/// Returns [`CoreError::InsufficientAnnotations`] when the record has fewer
/// than two annotations.
///
/// # Example
/// ```
/// use bc_core::beat::{window_beats, WindowOffsets};
/// use bc_core::record::{Annotation, Record};
/// let record = Record {
///     id: "100".into(),
///     samples: vec![0.0; 1000],
///     annotations: vec![
///         Annotation::new(200, "N"),
///         Annotation::new(360, "N"),
///         Annotation::new(520, "V"),
///     ],
/// };
/// let beats = window_beats(&record, WindowOffsets::default()).unwrap();
/// assert_eq!(beats.len(), 2);
/// assert_eq!((beats[0].window.start, beats[0].window.end), (100, 260));
/// assert_eq!(beats[1].label, "N");
/// ```
pub fn window_beats(record: &Record, offsets: WindowOffsets) -> Result<Vec<Beat>, CoreError> {
    let anns = &record.annotations;
    if anns.len() < 2 {
        return Err(CoreError::InsufficientAnnotations {
            record: record.id.clone(),
            count: anns.len(),
        });
    }

    let beats = anns
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let start = pair[0].sample - i64::from(offsets.start);
            let end = pair[1].sample - i64::from(offsets.end);
            Beat {
                record_id: record.id.clone(),
                index,
                window: BeatWindow::from_bounds(start, end),
                label: pair[0].symbol.clone(),
            }
        })
        .collect();

    Ok(beats)
}
