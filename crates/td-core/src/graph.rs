//! Read-only structural queries over a set of tab records.
//!
//! Every traversal keeps a visited set, so corrupted snapshots (cycles,
//! duplicate children) terminate instead of looping. Ids listed as children
//! but missing from the snapshot are tolerated.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::format::domain_of;
use crate::record::{TabRecord, TabSnapshot};
use crate::session::Session;
use crate::tabs::TabStore;
use crate::types::{TabId, Timestamp};

/// Deepest hierarchy [`build_hierarchy`] will materialize.
pub const MAX_HIERARCHY_DEPTH: usize = 1_000;

/// Anything that maps tab ids to records.
pub trait TabLookup {
    fn lookup(&self, id: TabId) -> Option<&TabRecord>;

    fn tab_records(&self) -> impl Iterator<Item = &TabRecord>;
}

impl TabLookup for BTreeMap<TabId, TabRecord> {
    fn lookup(&self, id: TabId) -> Option<&TabRecord> {
        self.get(&id)
    }

    fn tab_records(&self) -> impl Iterator<Item = &TabRecord> {
        self.values()
    }
}

impl<H: std::hash::BuildHasher> TabLookup for HashMap<TabId, TabRecord, H> {
    fn lookup(&self, id: TabId) -> Option<&TabRecord> {
        self.get(&id)
    }

    fn tab_records(&self) -> impl Iterator<Item = &TabRecord> {
        self.values()
    }
}

impl TabLookup for BTreeMap<TabId, TabSnapshot> {
    fn lookup(&self, id: TabId) -> Option<&TabRecord> {
        self.get(&id).map(|s| &s.record)
    }

    fn tab_records(&self) -> impl Iterator<Item = &TabRecord> {
        self.values().map(|s| &s.record)
    }
}

impl TabLookup for Session {
    fn lookup(&self, id: TabId) -> Option<&TabRecord> {
        self.tabs.lookup(id)
    }

    fn tab_records(&self) -> impl Iterator<Item = &TabRecord> {
        self.tabs.tab_records()
    }
}

impl TabLookup for TabStore {
    fn lookup(&self, id: TabId) -> Option<&TabRecord> {
        self.get(id)
    }

    fn tab_records(&self) -> impl Iterator<Item = &TabRecord> {
        self.records().values()
    }
}

/// One node of a rendered opener tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub creation_time: Timestamp,
    /// Host of `url`, or empty when it has none.
    pub domain: String,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn leaf(record: &TabRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            url: record.url.clone(),
            creation_time: record.creation_time,
            domain: domain_of(&record.url),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Builds the tree rooted at `root_id` by following `children`.
///
/// Returns `None` when `root_id` is not in the snapshot. A node reached a
/// second time is skipped, as is anything below [`MAX_HIERARCHY_DEPTH`].
pub fn build_hierarchy<L: TabLookup>(root_id: TabId, tabs: &L) -> Option<HierarchyNode> {
    let root = tabs.lookup(root_id)?;
    let mut visited = HashSet::from([root_id]);
    Some(build_node(root, tabs, &mut visited, 0))
}

fn build_node<L: TabLookup>(
    record: &TabRecord,
    tabs: &L,
    visited: &mut HashSet<TabId>,
    depth: usize,
) -> HierarchyNode {
    let mut node = HierarchyNode::leaf(record);
    if depth >= MAX_HIERARCHY_DEPTH {
        if !record.children.is_empty() {
            tracing::warn!(tab_id = %record.id, depth, "hierarchy depth bound reached; truncating");
        }
        return node;
    }
    for child_id in &record.children {
        let Some(child) = tabs.lookup(*child_id) else {
            continue;
        };
        if !visited.insert(*child_id) {
            tracing::warn!(tab_id = %child_id, parent_id = %record.id, "tab revisited while building hierarchy");
            continue;
        }
        node.children.push(build_node(child, tabs, visited, depth + 1));
    }
    node
}

/// Follows `parent_id` upward until a tab without a tracked parent.
///
/// Returns `None` when `id` is not in the snapshot.
pub fn find_root<L: TabLookup>(id: TabId, tabs: &L) -> Option<&TabRecord> {
    let mut current = tabs.lookup(id)?;
    let mut visited = HashSet::from([id]);
    while let Some(parent) = current.parent_id.and_then(|p| tabs.lookup(p)) {
        if !visited.insert(parent.id) {
            tracing::warn!(tab_id = %id, "parent cycle detected while finding root");
            break;
        }
        current = parent;
    }
    Some(current)
}

/// All ids reachable through `children`, parent before its children and
/// siblings in stored order.
///
/// Listed children missing from the snapshot are included but not expanded.
pub fn find_descendants<L: TabLookup>(id: TabId, tabs: &L) -> Vec<TabId> {
    let mut descendants = Vec::new();
    let Some(start) = tabs.lookup(id) else {
        return descendants;
    };

    let mut visited = HashSet::from([id]);
    let mut stack: Vec<TabId> = start.children.iter().rev().copied().collect();
    while let Some(next) = stack.pop() {
        if !visited.insert(next) {
            continue;
        }
        descendants.push(next);
        if let Some(record) = tabs.lookup(next) {
            stack.extend(record.children.iter().rev());
        }
    }
    descendants
}

/// Number of parent hops from `id` to its root. Zero for roots and for ids
/// not in the snapshot.
pub fn depth<L: TabLookup>(id: TabId, tabs: &L) -> usize {
    let Some(mut current) = tabs.lookup(id) else {
        return 0;
    };
    let mut visited = HashSet::from([id]);
    let mut hops = 0;
    while let Some(parent) = current.parent_id.and_then(|p| tabs.lookup(p)) {
        if !visited.insert(parent.id) {
            break;
        }
        hops += 1;
        current = parent;
    }
    hops
}

/// Tabs with no tracked parent, oldest first.
pub fn roots<L: TabLookup>(tabs: &L) -> Vec<&TabRecord> {
    let mut roots: Vec<&TabRecord> = tabs
        .tab_records()
        .filter(|r| r.parent_id.is_none_or(|p| tabs.lookup(p).is_none()))
        .collect();
    roots.sort_by_key(|r| (r.creation_time, r.id));
    roots
}

/// Every root's hierarchy, oldest root first.
pub fn forest<L: TabLookup>(tabs: &L) -> Vec<HierarchyNode> {
    roots(tabs)
        .into_iter()
        .filter_map(|root| build_hierarchy(root.id, tabs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, parent: Option<i64>, children: &[i64]) -> TabRecord {
        TabRecord {
            id: TabId::new(id),
            parent_id: parent.map(TabId::new),
            url: format!("https://site{id}.test/page"),
            title: format!("Tab {id}"),
            creation_time: id * 10,
            children: children.iter().copied().map(TabId::new).collect(),
            transition_type: None,
            referrer: None,
        }
    }

    fn snapshot(records: Vec<TabRecord>) -> BTreeMap<TabId, TabRecord> {
        records.into_iter().map(|r| (r.id, r)).collect()
    }

    fn ids(values: &[i64]) -> Vec<TabId> {
        values.iter().copied().map(TabId::new).collect()
    }

    /// 1 -> (2 -> 3), 4
    fn sample() -> BTreeMap<TabId, TabRecord> {
        snapshot(vec![
            record(1, None, &[2, 4]),
            record(2, Some(1), &[3]),
            record(3, Some(2), &[]),
            record(4, Some(1), &[]),
        ])
    }

    #[test]
    fn chain_descendants_and_depth() {
        let tabs = snapshot(vec![
            record(1, None, &[2]),
            record(2, Some(1), &[3]),
            record(3, Some(2), &[]),
        ]);
        assert_eq!(find_descendants(TabId::new(1), &tabs), ids(&[2, 3]));
        assert_eq!(depth(TabId::new(3), &tabs), 2);
        assert_eq!(depth(TabId::new(1), &tabs), 0);
    }

    #[test]
    fn descendants_are_pre_order() {
        assert_eq!(find_descendants(TabId::new(1), &sample()), ids(&[2, 3, 4]));
    }

    #[test]
    fn descendants_of_missing_or_leaf_are_empty() {
        let tabs = sample();
        assert!(find_descendants(TabId::new(3), &tabs).is_empty());
        assert!(find_descendants(TabId::new(99), &tabs).is_empty());
    }

    #[test]
    fn descendants_include_untracked_children_without_expanding() {
        let tabs = snapshot(vec![record(1, None, &[7, 2]), record(2, Some(1), &[])]);
        assert_eq!(find_descendants(TabId::new(1), &tabs), ids(&[7, 2]));
    }

    #[test]
    fn hierarchy_carries_domain_and_skips_missing_children() {
        let mut tabs = sample();
        tabs.get_mut(&TabId::new(2)).unwrap().children.push(TabId::new(50));
        tabs.get_mut(&TabId::new(4)).unwrap().url = "not a url".into();

        let tree = build_hierarchy(TabId::new(1), &tabs).unwrap();
        assert_eq!(tree.domain, "site1.test");
        assert_eq!(tree.node_count(), 4);
        let child_ids: Vec<_> = tree.children.iter().map(|c| c.id).collect();
        assert_eq!(child_ids, ids(&[2, 4]));
        assert_eq!(tree.children[0].children.len(), 1);
        assert_eq!(tree.children[1].domain, "");
    }

    #[test]
    fn hierarchy_of_missing_root_is_none() {
        assert!(build_hierarchy(TabId::new(9), &sample()).is_none());
    }

    #[test]
    fn traversals_terminate_on_cycles() {
        let tabs = snapshot(vec![record(1, Some(2), &[2]), record(2, Some(1), &[1])]);

        let tree = build_hierarchy(TabId::new(1), &tabs).unwrap();
        assert_eq!(tree.node_count(), 2);
        assert_eq!(find_descendants(TabId::new(1), &tabs), ids(&[2]));
        assert_eq!(depth(TabId::new(1), &tabs), 1);
        assert!(find_root(TabId::new(1), &tabs).is_some());
    }

    #[test]
    fn hierarchy_is_bounded_on_deep_chains() {
        let len = i64::try_from(MAX_HIERARCHY_DEPTH).unwrap() + 10;
        let tabs = snapshot(
            (0..len)
                .map(|i| {
                    let parent = (i > 0).then(|| i - 1);
                    let children: Vec<i64> = if i + 1 < len { vec![i + 1] } else { vec![] };
                    record(i, parent, &children)
                })
                .collect(),
        );
        let tree = build_hierarchy(TabId::new(0), &tabs).unwrap();
        assert_eq!(tree.node_count(), MAX_HIERARCHY_DEPTH + 1);
        assert_eq!(find_root(TabId::new(len - 1), &tabs).unwrap().id, TabId::new(0));
    }

    #[test]
    fn root_of_any_depth_has_no_parent() {
        let tabs = sample();
        for id in [1, 2, 3, 4] {
            let root = find_root(TabId::new(id), &tabs).unwrap();
            assert_eq!(root.id, TabId::new(1));
            assert!(root.is_root());
        }
        assert!(find_root(TabId::new(42), &tabs).is_none());
    }

    #[test]
    fn dangling_parent_makes_tab_its_own_root() {
        let tabs = snapshot(vec![record(2, Some(1), &[])]);
        assert_eq!(find_root(TabId::new(2), &tabs).unwrap().id, TabId::new(2));
        assert_eq!(depth(TabId::new(2), &tabs), 0);
        let root_ids: Vec<_> = roots(&tabs).iter().map(|r| r.id).collect();
        assert_eq!(root_ids, ids(&[2]));
    }

    #[test]
    fn forest_orders_roots_by_creation_time() {
        let mut tabs = sample();
        tabs.insert(TabId::new(9), record(9, None, &[]));
        tabs.get_mut(&TabId::new(9)).unwrap().creation_time = 1;

        let forest = forest(&tabs);
        let root_ids: Vec<_> = forest.iter().map(|n| n.id).collect();
        assert_eq!(root_ids, ids(&[9, 1]));
    }
}
