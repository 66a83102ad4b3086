//! Axis-aligned bounding boxes.

use std::fmt;

use crate::error::{MapError, MapResult};

/// Axis-aligned rectangle `minx, miny, maxx, maxy` in map units.
///
/// Constructors normalize the corners so `minx <= maxx` and `miny <= maxy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BBox {
    /// Creates a box from two corners, normalizing their order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            minx: x0.min(x1),
            miny: y0.min(y1),
            maxx: x0.max(x1),
            maxy: y0.max(y1),
        }
    }

    /// The "no extent" marker: inverted, so any expansion replaces it.
    pub fn empty() -> Self {
        Self {
            minx: f64::INFINITY,
            miny: f64::INFINITY,
            maxx: f64::NEG_INFINITY,
            maxy: f64::NEG_INFINITY,
        }
    }

    /// Parses an extent given as exactly four finite numbers.
    pub fn from_slice(values: &[f64]) -> MapResult<Self> {
        if values.len() != 4 {
            return Err(MapError::Validation(format!(
                "extent must contain exactly four numbers [minx,miny,maxx,maxy], got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(MapError::Validation(format!(
                "extent values must be finite numbers, got {}",
                bad
            )));
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.minx + self.maxx) / 2.0,
            (self.miny + self.maxy) / 2.0,
        )
    }

    /// A box is valid when its corners are finite and ordered.
    pub fn is_valid(&self) -> bool {
        [self.minx, self.miny, self.maxx, self.maxy]
            .iter()
            .all(|v| v.is_finite())
            && self.minx <= self.maxx
            && self.miny <= self.maxy
    }

    /// Valid with a strictly positive area.
    pub fn has_area(&self) -> bool {
        self.is_valid() && self.width() > 0.0 && self.height() > 0.0
    }

    /// Grows this box to cover `other`.
    pub fn expand_to_include(&mut self, other: &BBox) {
        self.minx = self.minx.min(other.minx);
        self.miny = self.miny.min(other.miny);
        self.maxx = self.maxx.max(other.maxx);
        self.maxy = self.maxy.max(other.maxy);
    }

    /// Grows this box to cover a point.
    pub fn expand_to_point(&mut self, x: f64, y: f64) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    /// Returns a copy padded by `dx`/`dy` on each side.
    pub fn padded(&self, dx: f64, dy: f64) -> Self {
        Self {
            minx: self.minx - dx,
            miny: self.miny - dy,
            maxx: self.maxx + dx,
            maxy: self.maxy + dy,
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        !(other.minx > self.maxx
            || other.maxx < self.minx
            || other.miny > self.maxy
            || other.maxy < self.miny)
    }

    /// Sets the width keeping the centre fixed.
    pub fn set_width(&mut self, width: f64) {
        let (cx, _) = self.center();
        self.minx = cx - width / 2.0;
        self.maxx = cx + width / 2.0;
    }

    /// Sets the height keeping the centre fixed.
    pub fn set_height(&mut self, height: f64) {
        let (_, cy) = self.center();
        self.miny = cy - height / 2.0;
        self.maxy = cy + height / 2.0;
    }

    /// Grows the shorter side so the box matches `width / height`.
    pub fn grow_to_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || !self.is_valid() {
            return;
        }
        let target = width as f64 / height as f64;
        if self.height() == 0.0 {
            if self.width() > 0.0 {
                self.set_height(self.width() / target);
            }
            return;
        }
        let current = self.width() / self.height();
        if current == target {
            return;
        }
        if current > target {
            self.set_height(self.width() / target);
        } else {
            self.set_width(self.height() * target);
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.minx, self.miny, self.maxx, self.maxy]
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.minx, self.miny, self.maxx, self.maxy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_normalizes_corners() {
        let b = BBox::new(10.0, 5.0, -10.0, -5.0);
        assert_eq!(b.to_array(), [-10.0, -5.0, 10.0, 5.0]);
    }

    #[test]
    fn test_from_slice_requires_four_values() {
        let err = BBox::from_slice(&[0.0, 0.0, 1.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_from_slice_rejects_non_finite() {
        let err = BBox::from_slice(&[0.0, f64::NAN, 1.0, 1.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(BBox::from_slice(&[0.0, 0.0, f64::INFINITY, 1.0]).is_err());
    }

    #[test]
    fn test_empty_is_invalid_until_expanded() {
        let mut b = BBox::empty();
        assert!(!b.is_valid());
        b.expand_to_point(1.0, 2.0);
        assert!(b.is_valid());
        assert!(!b.has_area());
        b.expand_to_point(3.0, 4.0);
        assert!(b.has_area());
    }

    #[test]
    fn test_grow_to_aspect_wide_box() {
        // 2:1 box into a square map grows the height
        let mut b = BBox::new(0.0, 0.0, 20.0, 10.0);
        b.grow_to_aspect(256, 256);
        assert_eq!(b.to_array(), [0.0, -5.0, 20.0, 15.0]);
    }

    #[test]
    fn test_grow_to_aspect_tall_box() {
        let mut b = BBox::new(0.0, 0.0, 10.0, 10.0);
        b.grow_to_aspect(200, 100);
        assert_eq!(b.to_array(), [-5.0, 0.0, 15.0, 10.0]);
    }

    #[test]
    fn test_grow_to_aspect_flat_line() {
        let mut b = BBox::new(0.0, 3.0, 10.0, 3.0);
        b.grow_to_aspect(100, 100);
        assert_eq!(b.to_array(), [0.0, -2.0, 10.0, 8.0]);
    }

    #[test]
    fn test_intersects() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&BBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(a.intersects(&BBox::new(10.0, 10.0, 10.0, 10.0)));
        assert!(!a.intersects(&BBox::new(11.0, 0.0, 12.0, 1.0)));
    }
}
