//! View scale (zoom) state

use tracing::debug;

/// Zoom level of the page view, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewScale {
    percent: u16,
    min: u16,
    max: u16,
    step: u16,
}

impl ViewScale {
    pub fn new(min: u16, max: u16, step: u16) -> Self {
        Self {
            percent: 100.clamp(min, max),
            min,
            max,
            step,
        }
    }

    pub fn percent(&self) -> u16 {
        self.percent
    }

    /// Scale factor applied to the page (1.0 = unzoomed)
    pub fn factor(&self) -> f32 {
        f32::from(self.percent) / 100.0
    }

    /// Set the zoom, clamped to the configured bounds
    pub fn set(&mut self, percent: u16) -> u16 {
        self.percent = percent.clamp(self.min, self.max);
        debug!("Zoom set to {}%", self.percent);
        self.percent
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.set(self.percent.saturating_add(self.step))
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.set(self.percent.saturating_sub(self.step))
    }

    /// Reset to 100% until the returned guard is dropped
    pub fn reset_scoped(&mut self) -> ScaleGuard<'_> {
        let previous = self.percent;
        self.percent = 100;
        ScaleGuard { scale: self, previous }
    }
}

impl Default for ViewScale {
    fn default() -> Self {
        Self::new(50, 200, 10)
    }
}

/// Restores the previous zoom when dropped, whatever the outcome
pub struct ScaleGuard<'a> {
    scale: &'a mut ViewScale,
    previous: u16,
}

impl ScaleGuard<'_> {
    /// Scale in effect while the guard is alive
    pub fn factor(&self) -> f32 {
        self.scale.factor()
    }
}

impl Drop for ScaleGuard<'_> {
    fn drop(&mut self) {
        self.scale.percent = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_bounds() {
        let mut scale = ViewScale::default();
        assert_eq!(scale.zoom_in(), 110);
        assert_eq!(scale.set(500), 200);
        assert_eq!(scale.set(10), 50);
        assert_eq!(scale.zoom_out(), 50);
    }

    #[test]
    fn test_scoped_reset_restores() {
        let mut scale = ViewScale::default();
        scale.set(150);
        {
            let guard = scale.reset_scoped();
            assert_eq!(guard.factor(), 1.0);
        }
        assert_eq!(scale.percent(), 150);
    }
}
