//! Pointer-driven repositioning of a single map node.

use crate::geometry::{ContainerSize, PercentPoint, PixelPoint};

/// Cumulative movement (px) below which a press/release pair counts as a click.
pub const CLICK_SLOP_PX: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveDrag {
    pub id: String,
    /// Committed position when the press happened.
    pub origin: PercentPoint,
    pub pointer_start: PixelPoint,
    /// Live pixel offset from `pointer_start`, only used for the visual transform.
    pub offset: PixelPoint,
}

impl ActiveDrag {
    fn moved(&self) -> bool {
        self.offset.x.hypot(self.offset.y) >= CLICK_SLOP_PX
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Outcome of leaving the `Dragging` state.
#[derive(Clone, Debug, PartialEq)]
pub enum DragRelease {
    /// No motion: treat as a click on `id`.
    Click { id: String },
    /// Position to commit for `id`, already clamped to the safe area.
    Moved { id: String, position: PercentPoint },
}

#[derive(Clone, Debug, Default)]
pub struct DragController {
    phase: DragPhase,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    /// Id of the node being dragged, if any.
    pub fn active_id(&self) -> Option<&str> {
        match &self.phase {
            DragPhase::Dragging(d) => Some(&d.id),
            DragPhase::Idle => None,
        }
    }

    /// Current live offset, zero when idle.
    pub fn offset(&self) -> PixelPoint {
        match &self.phase {
            DragPhase::Dragging(d) => d.offset,
            DragPhase::Idle => PixelPoint::default(),
        }
    }

    /// `Idle -> Dragging`. A second press while already dragging is ignored.
    pub fn pointer_down(&mut self, id: &str, origin: PercentPoint, pointer: PixelPoint) -> bool {
        if let DragPhase::Dragging(d) = &self.phase {
            log::debug!("ignoring press on `{id}` while `{}` is dragging", d.id);
            return false;
        }
        log::debug!("drag start `{id}` at ({:.1}, {:.1})", pointer.x, pointer.y);
        self.phase = DragPhase::Dragging(ActiveDrag {
            id: id.to_string(),
            origin,
            pointer_start: pointer,
            offset: PixelPoint::default(),
        });
        true
    }

    /// Track the pointer. Returns the updated offset, `None` when idle.
    pub fn pointer_move(&mut self, pointer: PixelPoint) -> Option<PixelPoint> {
        let DragPhase::Dragging(d) = &mut self.phase else {
            return None;
        };
        d.offset = PixelPoint::new(pointer.x - d.pointer_start.x, pointer.y - d.pointer_start.y);
        Some(d.offset)
    }

    /// `Dragging -> Idle`, converting the offset with the container size measured now.
    pub fn pointer_up(&mut self, container: ContainerSize) -> Option<DragRelease> {
        let DragPhase::Dragging(d) = std::mem::take(&mut self.phase) else {
            return None;
        };
        if !d.moved() {
            log::debug!("drag on `{}` resolved as click", d.id);
            return Some(DragRelease::Click { id: d.id });
        }
        let position = release_position(&d, container);
        log::debug!(
            "drag end `{}` at ({:.2}, {:.2})",
            d.id,
            position.x,
            position.y
        );
        Some(DragRelease::Moved { id: d.id, position })
    }

    /// Capture was lost mid-drag. Resolves like a release with the last known
    /// offset but never produces a click.
    pub fn cancel(&mut self, container: ContainerSize) -> Option<DragRelease> {
        let DragPhase::Dragging(d) = std::mem::take(&mut self.phase) else {
            return None;
        };
        log::debug!("drag on `{}` cancelled", d.id);
        let position = release_position(&d, container);
        Some(DragRelease::Moved { id: d.id, position })
    }
}

fn release_position(d: &ActiveDrag, container: ContainerSize) -> PercentPoint {
    let target = match container.offset_to_percent(d.offset.x, d.offset.y) {
        Some((dx, dy)) => PercentPoint::new(d.origin.x + dx, d.origin.y + dy),
        None => {
            log::warn!("container not measurable on release; keeping `{}` in place", d.id);
            d.origin
        }
    };
    target.clamp_to_safe_area()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SAFE_MAX_PERCENT, SAFE_MIN_PERCENT};

    const SIZE: ContainerSize = ContainerSize::new(1000.0, 500.0);

    fn press(c: &mut DragController, origin: PercentPoint) {
        assert!(c.pointer_down("mes_01", origin, PixelPoint::new(100.0, 100.0)));
    }

    #[test]
    fn offset_converts_with_release_size() {
        let mut c = DragController::new();
        press(&mut c, PercentPoint::new(50.0, 50.0));
        assert_eq!(c.pointer_move(PixelPoint::new(200.0, 150.0)), Some(PixelPoint::new(100.0, 50.0)));
        assert!(c.is_dragging());
        let r = c.pointer_up(SIZE).unwrap();
        assert_eq!(
            r,
            DragRelease::Moved {
                id: "mes_01".into(),
                position: PercentPoint::new(60.0, 60.0)
            }
        );
        assert!(!c.is_dragging());
        assert_eq!(c.offset(), PixelPoint::default());
    }

    #[test]
    fn committed_position_is_clamped() {
        let cases = [
            (PercentPoint::new(90.0, 90.0), PixelPoint::new(5000.0, 5000.0)),
            (PercentPoint::new(10.0, 10.0), PixelPoint::new(-5000.0, -5000.0)),
            (PercentPoint::new(0.0, 100.0), PixelPoint::new(100.0, 101.0)),
            (PercentPoint::new(50.0, 50.0), PixelPoint::new(123.0, -77.0)),
        ];
        for (origin, to) in cases {
            let mut c = DragController::new();
            press(&mut c, origin);
            c.pointer_move(to);
            let Some(DragRelease::Moved { position, .. }) = c.pointer_up(SIZE) else {
                panic!("expected a move");
            };
            assert!((SAFE_MIN_PERCENT..=SAFE_MAX_PERCENT).contains(&position.x));
            assert!((SAFE_MIN_PERCENT..=SAFE_MAX_PERCENT).contains(&position.y));
        }
    }

    #[test]
    fn no_motion_is_a_click() {
        let mut c = DragController::new();
        press(&mut c, PercentPoint::new(50.0, 50.0));
        c.pointer_move(PixelPoint::new(100.2, 100.1));
        assert_eq!(c.pointer_up(SIZE), Some(DragRelease::Click { id: "mes_01".into() }));
    }

    #[test]
    fn lost_capture_commits_last_offset() {
        let mut c = DragController::new();
        press(&mut c, PercentPoint::new(20.0, 20.0));
        c.pointer_move(PixelPoint::new(300.0, 100.0));
        let r = c.cancel(SIZE).unwrap();
        assert_eq!(
            r,
            DragRelease::Moved {
                id: "mes_01".into(),
                position: PercentPoint::new(40.0, 20.0)
            }
        );
        assert_eq!(c.phase(), &DragPhase::Idle);
        assert_eq!(c.cancel(SIZE), None);
    }

    #[test]
    fn unmeasurable_container_keeps_origin() {
        let mut c = DragController::new();
        press(&mut c, PercentPoint::new(30.0, 40.0));
        c.pointer_move(PixelPoint::new(400.0, 400.0));
        let r = c.pointer_up(ContainerSize::new(0.0, 0.0));
        assert_eq!(
            r,
            Some(DragRelease::Moved {
                id: "mes_01".into(),
                position: PercentPoint::new(30.0, 40.0)
            })
        );
    }

    #[test]
    fn idle_events_are_noops() {
        let mut c = DragController::new();
        assert_eq!(c.pointer_move(PixelPoint::new(1.0, 1.0)), None);
        assert_eq!(c.pointer_up(SIZE), None);
        press(&mut c, PercentPoint::new(50.0, 50.0));
        assert!(!c.pointer_down("wms_02", PercentPoint::new(1.0, 1.0), PixelPoint::default()));
        assert_eq!(c.active_id(), Some("mes_01"));
    }
}
