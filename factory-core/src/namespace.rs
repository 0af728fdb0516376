//! Hierarchical view of the flat namespace paths carried by module records.

use crate::registry::{ModuleRecord, PATH_SEPARATOR, split_path};

/// One path segment of the namespace tree. Children keep first-seen order.
#[derive(Clone, Debug, PartialEq)]
pub struct NamespaceNode<'a> {
    pub segment: String,
    pub label: String,
    pub full_path: String,
    pub depth: usize,
    pub children: Vec<NamespaceNode<'a>>,
    pub modules: Vec<&'a ModuleRecord>,
}

impl<'a> NamespaceNode<'a> {
    fn new(segment: &str, label: String, full_path: String, depth: usize) -> Self {
        NamespaceNode {
            segment: segment.to_string(),
            label,
            full_path,
            depth,
            children: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn child(&self, segment: &str) -> Option<&NamespaceNode<'a>> {
        self.children.iter().find(|c| c.segment == segment)
    }

    pub fn has_module(&self, id: &str) -> bool {
        self.modules.iter().any(|m| m.id == id)
    }
}

fn child_entry<'n, 'a>(
    siblings: &'n mut Vec<NamespaceNode<'a>>,
    segment: &str,
    make: impl FnOnce() -> NamespaceNode<'a>,
) -> &'n mut NamespaceNode<'a> {
    let idx = match siblings.iter().position(|c| c.segment == segment) {
        Some(i) => i,
        None => {
            siblings.push(make());
            siblings.len() - 1
        }
    };
    &mut siblings[idx]
}

/// Forest of top-level segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NamespaceTree<'a> {
    pub roots: Vec<NamespaceNode<'a>>,
}

impl<'a> NamespaceTree<'a> {
    /// Build the tree in record order. `label` maps a raw segment to its display label.
    pub fn build<I, F>(records: I, label: F) -> Self
    where
        I: IntoIterator<Item = &'a ModuleRecord>,
        F: Fn(&str) -> String,
    {
        let mut roots: Vec<NamespaceNode<'a>> = Vec::new();
        for record in records {
            let segments = &record.namespace_path;
            if segments.is_empty() {
                continue;
            }
            let mut siblings = &mut roots;
            let mut full_path = String::new();
            for (depth, seg) in segments.iter().enumerate() {
                if depth > 0 {
                    full_path.push(PATH_SEPARATOR);
                }
                full_path.push_str(seg);
                let node = child_entry(siblings, seg, || {
                    NamespaceNode::new(seg, label(seg), full_path.clone(), depth)
                });
                if depth == segments.len() - 1 {
                    node.modules.push(record);
                    break;
                }
                siblings = &mut node.children;
            }
        }
        NamespaceTree { roots }
    }

    /// Depth-first, pre-order walk.
    pub fn walk(&self) -> Vec<&NamespaceNode<'a>> {
        fn visit<'t, 'a>(n: &'t NamespaceNode<'a>, out: &mut Vec<&'t NamespaceNode<'a>>) {
            out.push(n);
            for c in &n.children {
                visit(c, out);
            }
        }
        let mut out = Vec::new();
        for r in &self.roots {
            visit(r, &mut out);
        }
        out
    }

    pub fn find(&self, path: &str) -> Option<&NamespaceNode<'a>> {
        let segments = split_path(path);
        let (first, rest) = segments.split_first()?;
        let mut node = self.roots.iter().find(|r| r.segment == *first)?;
        for seg in rest {
            node = node.child(seg)?;
        }
        Some(node)
    }
}

/// True when `path` is a segment-boundary prefix of the hovered module's path.
pub fn is_highlighted(path: &str, hovered: Option<&ModuleRecord>) -> bool {
    let Some(hovered) = hovered else {
        return false;
    };
    let prefix = split_path(path);
    !prefix.is_empty() && hovered.namespace_path.starts_with(&prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::record;

    fn sample() -> Vec<ModuleRecord> {
        vec![
            record("mes", "Site/Area/Production/MES", &[], &[]),
            record("wms", "Site/Area/Warehouse/WMS", &[], &[]),
            record("mes2", "Site/Area/Production/MES", &[], &[]),
            record("pack", "Site/Area/Production", &[], &[]),
            record("hq", "HQ/Office", &[], &[]),
        ]
    }

    #[test]
    fn segments_are_shared_and_modules_attach_at_leaf() {
        let records = sample();
        let tree = NamespaceTree::build(&records, |s| s.to_string());
        assert_eq!(tree.roots.len(), 2);
        let site = &tree.roots[0];
        assert_eq!(site.segment, "Site");
        let area = site.child("Area").unwrap();
        let order: Vec<_> = area.children.iter().map(|c| c.segment.as_str()).collect();
        assert_eq!(order, ["Production", "Warehouse"]);

        let production = area.child("Production").unwrap();
        assert_eq!(production.full_path, "Site/Area/Production");
        assert_eq!(production.depth, 2);
        assert!(production.has_module("pack"));
        let mes = production.child("MES").unwrap();
        let ids: Vec<_> = mes.modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["mes", "mes2"]);
    }

    #[test]
    fn building_twice_is_identical() {
        let records = sample();
        let a = NamespaceTree::build(&records, |s| s.to_lowercase());
        let b = NamespaceTree::build(&records, |s| s.to_lowercase());
        assert_eq!(a, b);
        let walk_a: Vec<_> = a.walk().iter().map(|n| n.full_path.clone()).collect();
        let walk_b: Vec<_> = b.walk().iter().map(|n| n.full_path.clone()).collect();
        assert_eq!(walk_a, walk_b);
    }

    #[test]
    fn labels_come_from_translator() {
        let records = sample();
        let tree = NamespaceTree::build(&records, |s| format!("<{s}>"));
        let node = tree.find("Site/Area/Warehouse").unwrap();
        assert_eq!(node.label, "<Warehouse>");
        assert_eq!(node.segment, "Warehouse");
    }

    #[test]
    fn highlight_matches_on_segment_boundaries() {
        let mes = record("mes", "Site/Area/Production/MES", &[], &[]);
        assert!(is_highlighted("Site", Some(&mes)));
        assert!(is_highlighted("Site/Area/Production", Some(&mes)));
        assert!(is_highlighted("Site/Area/Production/MES", Some(&mes)));
        assert!(!is_highlighted("Site/Ar", Some(&mes)));
        assert!(!is_highlighted("Site/Area/Prod", Some(&mes)));
        assert!(!is_highlighted("Site/Area/Warehouse", Some(&mes)));
        assert!(!is_highlighted("Site", None));
        assert!(!is_highlighted("", Some(&mes)));
    }
}
