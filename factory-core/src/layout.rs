/// Sidebar width in percent of the page.
pub const DEFAULT_SIDEBAR_PERCENT: f64 = 25.0;
pub const MIN_SIDEBAR_PERCENT: f64 = 20.0;
pub const MAX_SIDEBAR_PERCENT: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SidebarLayout {
    width_percent: f64,
}

impl Default for SidebarLayout {
    fn default() -> Self {
        SidebarLayout {
            width_percent: DEFAULT_SIDEBAR_PERCENT,
        }
    }
}

impl SidebarLayout {
    pub fn width_percent(&self) -> f64 {
        self.width_percent
    }

    /// Map pane width, the remainder of the page.
    pub fn map_percent(&self) -> f64 {
        100.0 - self.width_percent
    }

    /// Apply a resizer drag at `pointer_x` over a page `page_width` wide.
    /// Proposals outside the bounds are ignored rather than clamped.
    pub fn resize(&mut self, pointer_x: f64, page_width: f64) -> bool {
        if page_width.is_nan() || page_width <= 0.0 || !pointer_x.is_finite() {
            return false;
        }
        let proposed = pointer_x / page_width * 100.0;
        if !(MIN_SIDEBAR_PERCENT..=MAX_SIDEBAR_PERCENT).contains(&proposed) {
            return false;
        }
        self.width_percent = proposed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_within_bounds() {
        let mut l = SidebarLayout::default();
        assert_eq!(l.width_percent(), 25.0);
        assert!(l.resize(300.0, 1000.0));
        assert_eq!(l.width_percent(), 30.0);
        assert_eq!(l.map_percent(), 70.0);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut l = SidebarLayout::default();
        assert!(!l.resize(100.0, 1000.0));
        assert!(!l.resize(600.0, 1000.0));
        assert!(!l.resize(300.0, 0.0));
        assert!(!l.resize(300.0, -5.0));
        assert_eq!(l.width_percent(), DEFAULT_SIDEBAR_PERCENT);
    }
}
