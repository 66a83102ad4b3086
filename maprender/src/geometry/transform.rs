//! Extent-to-pixel mapping.

use super::{BBox, Coord};

/// Maps map coordinates onto a pixel raster of `width × height`.
///
/// The y axis flips: `extent.maxy` lands on pixel row 0.
#[derive(Debug, Clone, Copy)]
pub struct ViewTransform {
    extent: BBox,
    sx: f64,
    sy: f64,
}

impl ViewTransform {
    pub fn new(width: u32, height: u32, extent: BBox) -> Self {
        let sx = if extent.width() > 0.0 {
            width as f64 / extent.width()
        } else {
            1.0
        };
        let sy = if extent.height() > 0.0 {
            height as f64 / extent.height()
        } else {
            1.0
        };
        Self { extent, sx, sy }
    }

    /// Forward transform into pixel space.
    pub fn forward(&self, c: Coord) -> (f32, f32) {
        let x = (c.x - self.extent.minx) * self.sx;
        let y = (self.extent.maxy - c.y) * self.sy;
        (x as f32, y as f32)
    }

    /// Inverse transform from pixel space.
    pub fn backward(&self, px: f64, py: f64) -> Coord {
        Coord {
            x: self.extent.minx + px / self.sx,
            y: self.extent.maxy - py / self.sy,
        }
    }

    /// Map units per pixel along x.
    pub fn units_per_pixel(&self) -> f64 {
        1.0 / self.sx
    }

    pub fn extent(&self) -> &BBox {
        &self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_corners() {
        let t = ViewTransform::new(256, 256, BBox::new(-10.0, -10.0, 10.0, 10.0));
        assert_eq!(t.forward(Coord { x: -10.0, y: 10.0 }), (0.0, 0.0));
        assert_eq!(t.forward(Coord { x: 10.0, y: -10.0 }), (256.0, 256.0));
        assert_eq!(t.forward(Coord { x: 0.0, y: 0.0 }), (128.0, 128.0));
    }

    #[test]
    fn test_backward_inverts_forward() {
        let t = ViewTransform::new(100, 50, BBox::new(0.0, 0.0, 200.0, 100.0));
        let c = t.backward(50.0, 25.0);
        assert_eq!(c, Coord { x: 100.0, y: 50.0 });
        assert_eq!(t.units_per_pixel(), 2.0);
    }
}
