//! In-memory tab record store.
//!
//! Applies host lifecycle notifications to the opener tree. Every operation
//! tolerates unknown ids as a silent no-op: the host may deliver events for
//! tabs that were created before tracking started or already removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{NewTab, TabRecord};
use crate::transition::TransitionType;
use crate::types::{TabId, Timestamp};

/// Partial update reported by the host. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TabChange {
    pub const fn is_empty(&self) -> bool {
        self.url.is_none() && self.title.is_none()
    }
}

/// A committed navigation in some frame of a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub tab_id: TabId,
    /// Zero for the main frame.
    #[serde(default)]
    pub frame_id: i64,
    pub url: String,
    pub transition_type: TransitionType,
}

impl Navigation {
    /// Only main-frame navigations to web pages are tracked.
    pub fn is_tracked(&self) -> bool {
        self.frame_id == 0 && is_web_url(&self.url)
    }
}

fn is_web_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Map from tab id to its record.
#[derive(Debug, Clone, Default)]
pub struct TabStore {
    records: BTreeMap<TabId, TabRecord>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TabId) -> Option<&TabRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn records(&self) -> &BTreeMap<TabId, TabRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a record for a newly created tab.
    ///
    /// The tab is attached under `opener_id` when that opener is tracked;
    /// otherwise it becomes a root. A reused id replaces the old record.
    pub fn on_tab_created(
        &mut self,
        tab: &NewTab,
        opener_id: Option<TabId>,
        now: Timestamp,
    ) -> &TabRecord {
        let id = tab.id;
        if self.records.contains_key(&id) {
            tracing::warn!(tab_id = %id, "tab id reused while a record still exists; replacing it");
        }

        let parent_id = match opener_id {
            Some(opener) if opener == id => {
                tracing::warn!(tab_id = %id, "tab reported itself as opener; recording as root");
                None
            }
            Some(opener) => match self.records.get_mut(&opener) {
                Some(parent) => {
                    if !parent.children.contains(&id) {
                        parent.children.push(id);
                    }
                    Some(opener)
                }
                None => {
                    tracing::warn!(tab_id = %id, opener_id = %opener, "opener not tracked; recording as root");
                    None
                }
            },
            None => None,
        };

        let record = TabRecord {
            id,
            parent_id,
            url: tab.initial_url(),
            title: tab.initial_title(),
            creation_time: now,
            children: Vec::new(),
            transition_type: None,
            referrer: None,
        };
        self.records.insert(id, record);
        &self.records[&id]
    }

    /// Applies the fields present in `change`. Returns whether `id` is tracked.
    pub fn on_tab_updated(&mut self, id: TabId, change: &TabChange) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        if let Some(url) = &change.url {
            record.url.clone_from(url);
        }
        if let Some(title) = &change.title {
            record.title.clone_from(title);
        }
        true
    }

    /// Records a main-frame web navigation. Returns whether anything changed.
    pub fn on_navigation_committed(&mut self, navigation: &Navigation) -> bool {
        if !navigation.is_tracked() {
            return false;
        }
        let Some(record) = self.records.get_mut(&navigation.tab_id) else {
            return false;
        };
        record.url.clone_from(&navigation.url);
        record.transition_type = Some(navigation.transition_type.clone());
        true
    }

    /// Sets the referrer observed from page context. Returns whether `id` is
    /// tracked; a tab removed before the observation arrived is ignored.
    pub fn set_referrer(&mut self, id: TabId, referrer: impl Into<String>) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        record.referrer = Some(referrer.into());
        true
    }

    /// Detaches `id` from its parent and deletes its record.
    ///
    /// Children keep their `parent_id` pointing at the removed tab.
    pub fn remove(&mut self, id: TabId) -> Option<TabRecord> {
        let record = self.records.remove(&id)?;
        if let Some(parent) = record.parent_id.and_then(|p| self.records.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: i64) -> NewTab {
        NewTab::new(TabId::new(id)).with_url(format!("https://example.com/{id}"))
    }

    fn assert_mutual_inverse(store: &TabStore) {
        for (id, record) in store.records() {
            for child in &record.children {
                if let Some(child_record) = store.get(*child) {
                    assert_eq!(child_record.parent_id, Some(*id), "child {child} of {id}");
                }
            }
            if let Some(parent) = record.parent_id.and_then(|p| store.get(p)) {
                assert!(parent.children.contains(id), "{id} missing from parent");
            }
        }
    }

    #[test]
    fn created_tab_with_tracked_opener_is_attached() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1), None, 0);
        let child = store.on_tab_created(&tab(2), Some(TabId::new(1)), 5);

        assert_eq!(child.parent_id, Some(TabId::new(1)));
        assert_eq!(child.creation_time, 5);
        assert_eq!(store.get(TabId::new(1)).unwrap().children, vec![TabId::new(2)]);
        assert_mutual_inverse(&store);
    }

    #[test]
    fn missing_opener_yields_root() {
        let mut store = TabStore::new();
        let record = store.on_tab_created(&tab(1), Some(TabId::new(999)), 0);
        assert!(record.is_root());
    }

    #[test]
    fn self_opener_yields_root() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1), None, 0);
        let record = store.on_tab_created(&tab(1), Some(TabId::new(1)), 1);
        assert!(record.is_root());
        assert!(record.children.is_empty());
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1).with_title("Start"), None, 0);

        let change = TabChange {
            url: None,
            title: Some("Docs".into()),
        };
        assert!(store.on_tab_updated(TabId::new(1), &change));

        let record = store.get(TabId::new(1)).unwrap();
        assert_eq!(record.title, "Docs");
        assert_eq!(record.url, "https://example.com/1");
    }

    #[test]
    fn empty_update_is_idempotent() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1), None, 0);
        let before = store.get(TabId::new(1)).cloned();

        assert!(store.on_tab_updated(TabId::new(1), &TabChange::default()));
        assert_eq!(store.get(TabId::new(1)).cloned(), before);
    }

    #[test]
    fn update_of_unknown_tab_is_noop() {
        let mut store = TabStore::new();
        let change = TabChange {
            url: Some("https://x.test".into()),
            title: None,
        };
        assert!(!store.on_tab_updated(TabId::new(4), &change));
        assert!(store.is_empty());
    }

    #[test]
    fn navigation_filters_subframes_and_non_web_urls() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1), None, 0);

        let subframe = Navigation {
            tab_id: TabId::new(1),
            frame_id: 3,
            url: "https://ads.test/".into(),
            transition_type: TransitionType::AutoSubframe,
        };
        assert!(!store.on_navigation_committed(&subframe));

        let internal = Navigation {
            tab_id: TabId::new(1),
            frame_id: 0,
            url: "chrome://settings".into(),
            transition_type: TransitionType::Typed,
        };
        assert!(!store.on_navigation_committed(&internal));

        let main = Navigation {
            tab_id: TabId::new(1),
            frame_id: 0,
            url: "HTTPS://rust-lang.org/".into(),
            transition_type: TransitionType::Link,
        };
        assert!(store.on_navigation_committed(&main));

        let record = store.get(TabId::new(1)).unwrap();
        assert_eq!(record.url, "HTTPS://rust-lang.org/");
        assert_eq!(record.transition_type, Some(TransitionType::Link));
    }

    #[test]
    fn referrer_on_removed_tab_is_ignored() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1), None, 0);
        assert!(store.set_referrer(TabId::new(1), "https://search.test/"));
        assert_eq!(
            store.get(TabId::new(1)).unwrap().referrer.as_deref(),
            Some("https://search.test/")
        );

        store.remove(TabId::new(1));
        assert!(!store.set_referrer(TabId::new(1), "https://late.test/"));
    }

    #[test]
    fn remove_detaches_from_parent_and_leaves_children_dangling() {
        let mut store = TabStore::new();
        store.on_tab_created(&tab(1), None, 0);
        store.on_tab_created(&tab(2), Some(TabId::new(1)), 1);
        store.on_tab_created(&tab(3), Some(TabId::new(2)), 2);

        let removed = store.remove(TabId::new(2)).unwrap();
        assert_eq!(removed.children, vec![TabId::new(3)]);
        assert!(store.get(TabId::new(1)).unwrap().children.is_empty());
        assert_eq!(store.get(TabId::new(3)).unwrap().parent_id, Some(TabId::new(2)));
        assert!(store.remove(TabId::new(2)).is_none());
        assert_mutual_inverse(&store);
    }
}
