//! Monotonic time base for cell timestamps.

use std::time::Instant;

/// Monotonic seconds source anchored at a base instant.
///
/// `last_update` values are stored in f32 raster bands; absolute epoch
/// seconds (~1.7e9) would lose all sub-second precision there, so
/// timestamps are kept relative to a base set when the map is created.
#[derive(Clone, Copy, Debug)]
pub struct TimeBase {
    base: Instant,
}

impl TimeBase {
    /// Anchor a new time base at the current instant.
    pub fn now() -> Self {
        Self {
            base: Instant::now(),
        }
    }

    /// Seconds elapsed since the base.
    #[inline]
    pub fn seconds(&self) -> f32 {
        self.base.elapsed().as_secs_f32()
    }

    /// Re-anchor the base at the current instant. Subsequent stamps
    /// restart near zero; existing cell timestamps are not rewritten.
    pub fn rebase(&mut self) {
        self.base = Instant::now();
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::now()
    }
}
