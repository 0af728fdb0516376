use crate::anchors::{AnchorKey, AnchorMap};
use crate::geometry::PixelPoint;
use crate::registry::{LinkMode, ModuleRecord, ModuleRegistry};

/// Base animation delay of spine-to-linked segments (ms).
pub const SPINE_FAN_DELAY_MS: u32 = 300;
/// Extra delay per position in the linked list (ms).
pub const STAGGER_MS: u32 = 100;

/// Which view the segments are drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Map view: hovered node to the spine, then the spine to every linked node.
    Spine,
    /// Sidebar view: tag rows of the hovered module to tag rows of linked modules.
    TagPairing,
}

/// A renderable line between two measured anchors.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub from: AnchorKey,
    pub to: AnchorKey,
    pub start: PixelPoint,
    pub end: PixelPoint,
    /// Position in the emitted sequence.
    pub index: usize,
    pub delay_ms: u32,
}

/// How a module relates to the hovered one, for styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Hovered,
    Linked,
    Plain,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionResolver {
    pub link_mode: LinkMode,
}

impl ConnectionResolver {
    pub fn new(link_mode: LinkMode) -> Self {
        ConnectionResolver { link_mode }
    }

    /// Records linked to `hovered`, resolved and ordered.
    pub fn linked<'r>(&self, hovered: Option<&str>, registry: &'r ModuleRegistry) -> Vec<&'r ModuleRecord> {
        hovered
            .and_then(|id| registry.get(id))
            .map(|h| registry.linked(h, self.link_mode))
            .unwrap_or_default()
    }

    pub fn emphasis(&self, id: &str, hovered: Option<&str>, registry: &ModuleRegistry) -> Emphasis {
        if hovered == Some(id) {
            return Emphasis::Hovered;
        }
        if self.linked(hovered, registry).iter().any(|m| m.id == id) {
            Emphasis::Linked
        } else {
            Emphasis::Plain
        }
    }

    /// Segments to draw for `hovered`. Pairs with an unmeasured endpoint are
    /// left out; nothing here is an error.
    pub fn resolve(
        &self,
        hovered: Option<&str>,
        registry: &ModuleRegistry,
        anchors: &AnchorMap,
        mode: ConnectionMode,
    ) -> Vec<Segment> {
        let Some(h) = hovered.and_then(|id| registry.get(id)) else {
            return Vec::new();
        };
        let linked = registry.linked(h, self.link_mode);
        if linked.is_empty() {
            return Vec::new();
        }
        let mut out = SegmentSink {
            anchors,
            segments: Vec::new(),
        };
        match mode {
            ConnectionMode::Spine => {
                out.push(AnchorKey::module(&h.id), AnchorKey::Spine, 0);
                for (i, m) in linked.iter().enumerate() {
                    out.push(
                        AnchorKey::Spine,
                        AnchorKey::module(&m.id),
                        SPINE_FAN_DELAY_MS + i as u32 * STAGGER_MS,
                    );
                }
            }
            ConnectionMode::TagPairing => {
                for (i, tag) in h.tags.iter().enumerate() {
                    for m in &linked {
                        let Some(other) = m.tags.get(i).or_else(|| m.tags.first()) else {
                            continue;
                        };
                        let delay = out.segments.len() as u32 * STAGGER_MS;
                        out.push(
                            AnchorKey::tag(&h.id, &tag.name),
                            AnchorKey::tag(&m.id, &other.name),
                            delay,
                        );
                    }
                }
            }
        }
        out.segments
    }
}

struct SegmentSink<'a> {
    anchors: &'a AnchorMap,
    segments: Vec<Segment>,
}

impl SegmentSink<'_> {
    fn push(&mut self, from: AnchorKey, to: AnchorKey, delay_ms: u32) {
        let (Some(&start), Some(&end)) = (self.anchors.get(&from), self.anchors.get(&to)) else {
            log::debug!("skipping {from} -> {to}: anchor not measured");
            return;
        };
        let index = self.segments.len();
        self.segments.push(Segment {
            from,
            to,
            start,
            end,
            index,
            delay_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PercentPoint;
    use crate::registry::tests::record;

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new(
            vec![
                record("a", "S/A", &["b", "c"], &["t0", "t1"]),
                record("b", "S/B", &["a"], &["u0", "u1"]),
                record("c", "S/C", &[], &["v0"]),
                record("d", "S/D", &["a"], &[]),
            ],
            PercentPoint::new(50.0, 50.0),
        )
        .unwrap()
    }

    fn anchors(keys: &[AnchorKey]) -> AnchorMap {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), PixelPoint::new(i as f64 * 10.0, i as f64)))
            .collect()
    }

    #[test]
    fn spine_mode_hops_through_spine_in_link_order() {
        let r = registry();
        let a = anchors(&[
            AnchorKey::module("a"),
            AnchorKey::Spine,
            AnchorKey::module("b"),
            AnchorKey::module("c"),
        ]);
        let segs = ConnectionResolver::default().resolve(Some("a"), &r, &a, ConnectionMode::Spine);
        let pairs: Vec<_> = segs.iter().map(|s| (s.from.to_string(), s.to.to_string())).collect();
        assert_eq!(
            pairs,
            [
                ("a".to_string(), "spine".to_string()),
                ("spine".to_string(), "b".to_string()),
                ("spine".to_string(), "c".to_string()),
            ]
        );
        let delays: Vec<_> = segs.iter().map(|s| s.delay_ms).collect();
        assert_eq!(delays, [0, 300, 400]);
        assert_eq!(segs[1].start, a[&AnchorKey::Spine]);
        assert_eq!(segs[1].end, a[&AnchorKey::module("b")]);
    }

    #[test]
    fn tag_pairing_matches_by_index() {
        let r = ModuleRegistry::new(
            vec![
                record("a", "S/A", &["b"], &["t0", "t1"]),
                record("b", "S/B", &[], &["u0", "u1"]),
            ],
            PercentPoint::new(50.0, 50.0),
        )
        .unwrap();
        let a = anchors(&[
            AnchorKey::tag("a", "t0"),
            AnchorKey::tag("a", "t1"),
            AnchorKey::tag("b", "u0"),
            AnchorKey::tag("b", "u1"),
        ]);
        let segs =
            ConnectionResolver::default().resolve(Some("a"), &r, &a, ConnectionMode::TagPairing);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].from, AnchorKey::tag("a", "t0"));
        assert_eq!(segs[0].to, AnchorKey::tag("b", "u0"));
        assert_eq!(segs[1].from, AnchorKey::tag("a", "t1"));
        assert_eq!(segs[1].to, AnchorKey::tag("b", "u1"));
    }

    #[test]
    fn missing_tag_anchor_drops_only_that_pair() {
        let r = ModuleRegistry::new(
            vec![
                record("a", "S/A", &["b"], &["t0", "t1"]),
                record("b", "S/B", &[], &["u0", "u1"]),
            ],
            PercentPoint::new(50.0, 50.0),
        )
        .unwrap();
        let a = anchors(&[
            AnchorKey::tag("a", "t0"),
            AnchorKey::tag("a", "t1"),
            AnchorKey::tag("b", "u0"),
        ]);
        let segs =
            ConnectionResolver::default().resolve(Some("a"), &r, &a, ConnectionMode::TagPairing);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].to, AnchorKey::tag("b", "u0"));
    }

    #[test]
    fn shorter_tag_list_falls_back_to_first_tag() {
        let r = registry();
        let a = anchors(&[
            AnchorKey::tag("a", "t0"),
            AnchorKey::tag("a", "t1"),
            AnchorKey::tag("b", "u0"),
            AnchorKey::tag("b", "u1"),
            AnchorKey::tag("c", "v0"),
        ]);
        let segs =
            ConnectionResolver::default().resolve(Some("a"), &r, &a, ConnectionMode::TagPairing);
        let pairs: Vec<_> = segs.iter().map(|s| s.to.to_string()).collect();
        assert_eq!(pairs, ["b-u0", "c-v0", "b-u1", "c-v0"]);
        let delays: Vec<_> = segs.iter().map(|s| s.delay_ms).collect();
        assert_eq!(delays, [0, 100, 200, 300]);
    }

    #[test]
    fn nothing_for_absent_or_unknown_hover() {
        let r = registry();
        let a = anchors(&[AnchorKey::module("a"), AnchorKey::Spine]);
        let res = ConnectionResolver::default();
        assert!(res.resolve(None, &r, &a, ConnectionMode::Spine).is_empty());
        assert!(res.resolve(Some("zz"), &r, &a, ConnectionMode::Spine).is_empty());
    }

    #[test]
    fn no_links_or_no_tags_is_empty() {
        let r = registry();
        let a = anchors(&[
            AnchorKey::module("c"),
            AnchorKey::Spine,
            AnchorKey::module("d"),
            AnchorKey::module("a"),
        ]);
        let res = ConnectionResolver::default();
        assert!(res.resolve(Some("c"), &r, &a, ConnectionMode::Spine).is_empty());
        assert!(res.resolve(Some("d"), &r, &a, ConnectionMode::TagPairing).is_empty());
    }

    #[test]
    fn unknown_link_is_omitted() {
        let r = ModuleRegistry::new(
            vec![
                record("a", "S/A", &["ghost", "b"], &[]),
                record("b", "S/B", &[], &[]),
            ],
            PercentPoint::new(50.0, 50.0),
        )
        .unwrap();
        let a = anchors(&[AnchorKey::module("a"), AnchorKey::Spine, AnchorKey::module("b")]);
        let segs = ConnectionResolver::default().resolve(Some("a"), &r, &a, ConnectionMode::Spine);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].to, AnchorKey::module("b"));
    }

    #[test]
    fn symmetric_mode_draws_reverse_links() {
        let r = registry();
        let a = anchors(&[
            AnchorKey::module("c"),
            AnchorKey::Spine,
            AnchorKey::module("a"),
            AnchorKey::module("d"),
        ]);
        let directed = ConnectionResolver::new(LinkMode::Directed);
        let symmetric = ConnectionResolver::new(LinkMode::Symmetric);
        assert!(directed.resolve(Some("c"), &r, &a, ConnectionMode::Spine).is_empty());
        let segs = symmetric.resolve(Some("c"), &r, &a, ConnectionMode::Spine);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].to, AnchorKey::module("a"));
    }

    #[test]
    fn emphasis_classification() {
        let r = registry();
        let res = ConnectionResolver::default();
        assert_eq!(res.emphasis("a", Some("a"), &r), Emphasis::Hovered);
        assert_eq!(res.emphasis("b", Some("a"), &r), Emphasis::Linked);
        assert_eq!(res.emphasis("d", Some("a"), &r), Emphasis::Plain);
        assert_eq!(res.emphasis("d", None, &r), Emphasis::Plain);
    }
}
