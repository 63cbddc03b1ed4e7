use serde::{Deserialize, Serialize};

use crate::network::simulation::Bounds;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 4.0;

/// Zoom/pan state: screen = world * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            k: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl ViewTransform {
    #[cfg(test)]
    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        (point.0 * self.k + self.x, point.1 * self.k + self.y)
    }

    pub fn invert(&self, point: (f64, f64)) -> (f64, f64) {
        ((point.0 - self.x) / self.k, (point.1 - self.y) / self.k)
    }

    pub fn pan(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Scales by `factor` keeping the world point under `anchor` (screen coords) fixed.
    pub fn zoom_at(self, anchor: (f64, f64), factor: f64) -> Self {
        let k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
        let world = self.invert(anchor);
        Self {
            k,
            x: anchor.0 - world.0 * k,
            y: anchor.1 - world.1 * k,
        }
    }

    /// Transform that fits `bounds` into a `width`×`height` canvas with `margin`
    /// on every side. Never zooms in past 1:1.
    pub fn fit(bounds: Bounds, width: f64, height: f64, margin: f64) -> Self {
        let bw = (bounds.max_x - bounds.min_x).max(1.0);
        let bh = (bounds.max_y - bounds.min_y).max(1.0);
        let avail_w = (width - 2.0 * margin).max(1.0);
        let avail_h = (height - 2.0 * margin).max(1.0);
        let k = (avail_w / bw).min(avail_h / bh).clamp(MIN_SCALE, 1.0);
        let cx = (bounds.min_x + bounds.max_x) / 2.0;
        let cy = (bounds.min_y + bounds.max_y) / 2.0;
        Self {
            k,
            x: width / 2.0 - cx * k,
            y: height / 2.0 - cy * k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let t = ViewTransform::default().pan(30.0, -10.0);
        let anchor = (200.0, 150.0);
        let world = t.invert(anchor);
        let zoomed = t.zoom_at(anchor, 2.0);
        let (sx, sy) = zoomed.apply(world);
        assert!((sx - anchor.0).abs() < 1e-9 && (sy - anchor.1).abs() < 1e-9);
        assert_eq!(zoomed.k, 2.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let t = ViewTransform::default().zoom_at((0.0, 0.0), 100.0);
        assert_eq!(t.k, MAX_SCALE);
        let t = ViewTransform::default().zoom_at((0.0, 0.0), 0.0001);
        assert_eq!(t.k, MIN_SCALE);
    }

    #[test]
    fn test_fit_centres_bounds() {
        let bounds = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2000.0,
            max_y: 1000.0,
        };
        let t = ViewTransform::fit(bounds, 1000.0, 600.0, 50.0);
        assert!((t.k - 0.45).abs() < 1e-9);
        let (cx, cy) = t.apply((1000.0, 500.0));
        assert!((cx - 500.0).abs() < 1e-9 && (cy - 300.0).abs() < 1e-9);
    }
}
