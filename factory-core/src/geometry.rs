use serde::{Deserialize, Serialize};

/// Lower bound of the safe area a dragged node may be committed to (percent).
pub const SAFE_MIN_PERCENT: f64 = 5.0;
/// Upper bound of the safe area a dragged node may be committed to (percent).
pub const SAFE_MAX_PERCENT: f64 = 95.0;

/// Canvas-relative coordinate, both axes in the 0-100 range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        PercentPoint { x, y }
    }

    /// Both coordinates finite and inside `[0, 100]`.
    pub fn is_valid(&self) -> bool {
        let ok = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        ok(self.x) && ok(self.y)
    }

    pub fn clamp_to_safe_area(self) -> Self {
        PercentPoint {
            x: self.x.clamp(SAFE_MIN_PERCENT, SAFE_MAX_PERCENT),
            y: self.y.clamp(SAFE_MIN_PERCENT, SAFE_MAX_PERCENT),
        }
    }
}

/// Pixel coordinate in the space of one container element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        PixelPoint { x, y }
    }
}

impl From<(f64, f64)> for PixelPoint {
    fn from(v: (f64, f64)) -> Self {
        PixelPoint { x: v.0, y: v.1 }
    }
}

/// Axis-aligned rectangle as reported by a layout engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }

    /// Center of `self` expressed relative to the top-left corner of `origin`.
    pub fn center_within(&self, origin: &Rect) -> PixelPoint {
        let c = self.center();
        PixelPoint {
            x: c.x - origin.left,
            y: c.y - origin.top,
        }
    }

    pub fn size(&self) -> ContainerSize {
        ContainerSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Measured size of the container percentages are relative to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub const fn new(width: f64, height: f64) -> Self {
        ContainerSize { width, height }
    }

    /// A zero or negative extent cannot anchor a percentage conversion.
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn to_pixels(&self, p: PercentPoint) -> PixelPoint {
        PixelPoint {
            x: p.x / 100.0 * self.width,
            y: p.y / 100.0 * self.height,
        }
    }

    pub fn to_percent(&self, p: PixelPoint) -> Option<PercentPoint> {
        if !self.is_measurable() {
            return None;
        }
        Some(PercentPoint {
            x: p.x / self.width * 100.0,
            y: p.y / self.height * 100.0,
        })
    }

    /// Convert a pixel delta into a percentage delta.
    pub fn offset_to_percent(&self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        self.to_percent(PixelPoint { x: dx, y: dy }).map(|p| (p.x, p.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_rejects_out_of_range_and_nan() {
        assert!(PercentPoint::new(0.0, 100.0).is_valid());
        assert!(!PercentPoint::new(150.0, 10.0).is_valid());
        assert!(!PercentPoint::new(10.0, -0.1).is_valid());
        assert!(!PercentPoint::new(f64::NAN, 10.0).is_valid());
        assert!(!PercentPoint::new(10.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn rect_center_is_relative_to_origin() {
        let container = Rect::new(100.0, 50.0, 800.0, 600.0);
        let el = Rect::new(140.0, 70.0, 20.0, 10.0);
        assert_eq!(el.center_within(&container), PixelPoint::new(50.0, 25.0));
    }

    #[test]
    fn percent_and_pixel_conversion_agree() {
        let size = ContainerSize::new(400.0, 200.0);
        let px = size.to_pixels(PercentPoint::new(25.0, 50.0));
        assert_eq!(px, PixelPoint::new(100.0, 100.0));
        assert_eq!(size.to_percent(px), Some(PercentPoint::new(25.0, 50.0)));
        assert_eq!(size.offset_to_percent(40.0, -20.0), Some((10.0, -10.0)));
    }

    #[test]
    fn empty_container_has_no_percent_space() {
        let size = ContainerSize::new(0.0, 200.0);
        assert!(size.offset_to_percent(10.0, 10.0).is_none());
    }
}
