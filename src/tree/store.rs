//! Client-side materialized view of the remote profile tree.
//!
//! Folder-scoped state lives in four maps keyed by [`FolderKey`]; the
//! flattened `visible_rows` is derived from `expanded` and `children` and is
//! kept in sync on every mutation that can change it.

use std::collections::HashMap;

use super::node::{FolderKey, Node, PageInfo, VisibleRow};

/// State for the profile tree view.
#[derive(Debug, Default)]
pub struct TreeStore {
    expanded: HashMap<FolderKey, bool>,
    loading: HashMap<FolderKey, bool>,
    children: HashMap<FolderKey, Vec<Node>>,
    page_info: HashMap<FolderKey, PageInfo>,
    visible_rows: Vec<VisibleRow>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Mutators ────────────────────────────────────────────────────────────

    /// Set the expansion flag of `key` and update the rows of its subtree.
    pub fn set_expanded(&mut self, key: FolderKey, is_expanded: bool) {
        self.expanded.insert(key.clone(), is_expanded);
        self.refresh_subtree(&key);
    }

    /// Set the loading flag of `key`. Never affects the visible rows.
    pub fn set_loading(&mut self, key: FolderKey, is_loading: bool) {
        self.loading.insert(key, is_loading);
    }

    /// Replace the known children of `key` and update the rows of its subtree.
    pub fn set_children(&mut self, key: FolderKey, nodes: Vec<Node>) {
        self.children.insert(key.clone(), nodes);
        self.refresh_subtree(&key);
    }

    /// Replace the pagination state of `key`.
    pub fn set_page_info(&mut self, key: FolderKey, page_info: PageInfo) {
        self.page_info.insert(key, page_info);
    }

    /// Drop everything, as on sign-out.
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.loading.clear();
        self.children.clear();
        self.page_info.clear();
        self.visible_rows.clear();
    }

    // ── Readers ─────────────────────────────────────────────────────────────

    pub fn expanded(&self) -> &HashMap<FolderKey, bool> {
        &self.expanded
    }

    pub fn loading(&self) -> &HashMap<FolderKey, bool> {
        &self.loading
    }

    pub fn children_by_key(&self) -> &HashMap<FolderKey, Vec<Node>> {
        &self.children
    }

    pub fn page_info_by_key(&self) -> &HashMap<FolderKey, PageInfo> {
        &self.page_info
    }

    /// The flattened tree, in render order.
    pub fn visible_rows(&self) -> &[VisibleRow] {
        &self.visible_rows
    }

    pub fn is_expanded(&self, key: &FolderKey) -> bool {
        self.expanded.get(key).copied().unwrap_or(false)
    }

    pub fn is_loading(&self, key: &FolderKey) -> bool {
        self.loading.get(key).copied().unwrap_or(false)
    }

    pub fn children(&self, key: &FolderKey) -> Option<&[Node]> {
        self.children.get(key).map(Vec::as_slice)
    }

    pub fn page_info(&self, key: &FolderKey) -> Option<&PageInfo> {
        self.page_info.get(key)
    }

    // ── Flattening ──────────────────────────────────────────────────────────

    /// Walk the whole tree from the root and return the rows it produces.
    ///
    /// This is the reference ordering; `visible_rows` always equals it.
    pub fn flatten(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        self.flatten_folder(&FolderKey::Root, 0, &mut Vec::new(), &mut rows);
        rows
    }

    /// Pre-order walk below `key`.
    ///
    /// `path` holds the folders currently being walked; a folder that is
    /// already on it is not descended into again, so cyclic data terminates.
    fn flatten_folder(
        &self,
        key: &FolderKey,
        depth: usize,
        path: &mut Vec<FolderKey>,
        rows: &mut Vec<VisibleRow>,
    ) {
        if !self.is_expanded(key) || path.contains(key) {
            return;
        }
        let Some(children) = self.children.get(key) else {
            return;
        };

        path.push(key.clone());
        for child in children {
            rows.push(VisibleRow {
                node: child.clone(),
                depth,
            });
            self.flatten_folder(&child.folder_key(), depth + 1, path, rows);
        }
        path.pop();
    }

    /// Recompute only the rows that belong to `key`'s subtree.
    ///
    /// Every visible row for node `key` owns the run of deeper rows that
    /// directly follows it; that run is re-walked and spliced in place. A
    /// folder with no visible row cannot contribute rows, so nothing changes.
    fn refresh_subtree(&mut self, key: &FolderKey) {
        let id = match key {
            FolderKey::Root => {
                self.visible_rows = self.flatten();
                return;
            }
            FolderKey::Node(id) => id,
        };

        let positions: Vec<usize> = self
            .visible_rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.node.id == *id)
            .map(|(i, _)| i)
            .collect();

        // Back to front so earlier positions stay valid across splices.
        for &pos in positions.iter().rev() {
            let depth = self.visible_rows[pos].depth;
            let start = pos + 1;
            let end = self.visible_rows[start..]
                .iter()
                .position(|row| row.depth <= depth)
                .map_or(self.visible_rows.len(), |offset| start + offset);

            let mut path = self.ancestor_path(pos);
            let mut rows = Vec::new();
            self.flatten_folder(key, depth + 1, &mut path, &mut rows);
            self.visible_rows.splice(start..end, rows);
        }
    }

    /// Folders the full walk is inside of when it emits the row at `pos`.
    fn ancestor_path(&self, pos: usize) -> Vec<FolderKey> {
        let mut ancestors = Vec::new();
        let mut wanted = self.visible_rows[pos].depth;
        for row in self.visible_rows[..pos].iter().rev() {
            if wanted == 0 {
                break;
            }
            if row.depth == wanted - 1 {
                ancestors.push(row.node.folder_key());
                wanted -= 1;
            }
        }
        ancestors.push(FolderKey::Root);
        ancestors.reverse();
        ancestors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, parent: Option<&str>) -> Node {
        Node {
            id: id.into(),
            name: id.into(),
            kind: "FolderNode".into(),
            parent_node_id: parent.map(String::from),
        }
    }

    fn leaf(id: &str, parent: Option<&str>) -> Node {
        Node {
            id: id.into(),
            name: id.into(),
            kind: "AlarmNode".into(),
            parent_node_id: parent.map(String::from),
        }
    }

    fn key(id: &str) -> FolderKey {
        FolderKey::Node(id.into())
    }

    fn rows(store: &TreeStore) -> Vec<(&str, usize)> {
        store
            .visible_rows()
            .iter()
            .map(|r| (r.node.name.as_str(), r.depth))
            .collect()
    }

    /// Root with A(folder){AA, AB}, B(leaf), C(folder){CA}.
    fn sample_store() -> TreeStore {
        let mut store = TreeStore::new();
        store.set_expanded(FolderKey::Root, true);
        store.set_children(
            FolderKey::Root,
            vec![folder("A", None), leaf("B", None), folder("C", None)],
        );
        store.set_children(key("A"), vec![leaf("AA", Some("A")), leaf("AB", Some("A"))]);
        store.set_children(key("C"), vec![leaf("CA", Some("C"))]);
        store
    }

    fn assert_consistent(store: &TreeStore) {
        assert_eq!(store.visible_rows(), store.flatten().as_slice());
    }

    #[test]
    fn empty_store_has_no_rows() {
        let store = TreeStore::new();
        assert!(store.visible_rows().is_empty());
        assert!(!store.is_expanded(&FolderKey::Root));
        assert!(store.children(&FolderKey::Root).is_none());
    }

    #[test]
    fn collapsed_folder_hides_children() {
        let store = sample_store();
        assert_eq!(rows(&store), vec![("A", 0), ("B", 0), ("C", 0)]);
    }

    #[test]
    fn expanded_folder_shows_children_in_order() {
        let mut store = sample_store();
        store.set_expanded(key("A"), true);
        assert_eq!(
            rows(&store),
            vec![("A", 0), ("AA", 1), ("AB", 1), ("B", 0), ("C", 0)]
        );
        assert_consistent(&store);
    }

    #[test]
    fn root_not_expanded_shows_nothing() {
        let mut store = TreeStore::new();
        store.set_children(FolderKey::Root, vec![folder("A", None)]);
        assert!(store.visible_rows().is_empty());
    }

    #[test]
    fn expanded_folder_without_children_shows_nothing_below() {
        let mut store = sample_store();
        store.set_expanded(key("B"), true);
        assert_eq!(rows(&store), vec![("A", 0), ("B", 0), ("C", 0)]);
    }

    #[test]
    fn scenario_from_empty_store() {
        let mut store = TreeStore::new();
        store.set_expanded(FolderKey::Root, true);
        store.set_children(
            FolderKey::Root,
            vec![folder("FolderA", None), leaf("FileB", None)],
        );
        assert_eq!(rows(&store), vec![("FolderA", 0), ("FileB", 0)]);

        store.set_children(key("FolderA"), vec![leaf("FileAA", Some("FolderA"))]);
        store.set_expanded(key("FolderA"), true);
        assert_eq!(
            rows(&store),
            vec![("FolderA", 0), ("FileAA", 1), ("FileB", 0)]
        );
    }

    #[test]
    fn children_arriving_before_expansion_of_root() {
        let mut store = TreeStore::new();
        store.set_children(FolderKey::Root, vec![folder("A", None)]);
        store.set_children(key("A"), vec![leaf("B", Some("A"))]);
        store.set_expanded(key("A"), true);
        assert!(store.visible_rows().is_empty());

        store.set_expanded(FolderKey::Root, true);
        assert_eq!(rows(&store), vec![("A", 0), ("B", 1)]);
    }

    #[test]
    fn collapse_hides_exactly_the_subtree() {
        let mut store = sample_store();
        store.set_expanded(key("A"), true);
        store.set_expanded(key("C"), true);
        assert_eq!(
            rows(&store),
            vec![("A", 0), ("AA", 1), ("AB", 1), ("B", 0), ("C", 0), ("CA", 1)]
        );

        store.set_expanded(key("A"), false);
        assert_eq!(rows(&store), vec![("A", 0), ("B", 0), ("C", 0), ("CA", 1)]);
        assert_consistent(&store);
    }

    #[test]
    fn nested_expansion_survives_parent_collapse() {
        let mut store = sample_store();
        store.set_children(key("AA"), vec![leaf("AAA", Some("AA"))]);
        store.set_expanded(key("AA"), true);
        store.set_expanded(key("A"), true);
        assert_eq!(
            rows(&store),
            vec![("A", 0), ("AA", 1), ("AAA", 2), ("AB", 1), ("B", 0), ("C", 0)]
        );

        store.set_expanded(key("A"), false);
        store.set_expanded(key("A"), true);
        assert_eq!(
            rows(&store),
            vec![("A", 0), ("AA", 1), ("AAA", 2), ("AB", 1), ("B", 0), ("C", 0)]
        );
    }

    #[test]
    fn redundant_calls_are_idempotent() {
        let mut store = sample_store();
        store.set_expanded(key("A"), true);
        let before = store.visible_rows().to_vec();

        store.set_expanded(key("A"), true);
        assert_eq!(store.visible_rows(), before.as_slice());

        let children = store.children(&key("A")).unwrap().to_vec();
        store.set_children(key("A"), children);
        assert_eq!(store.visible_rows(), before.as_slice());
    }

    #[test]
    fn replacing_children_replaces_rows() {
        let mut store = sample_store();
        store.set_expanded(key("A"), true);
        store.set_children(
            key("A"),
            vec![leaf("AB", Some("A")), leaf("AC", Some("A")), leaf("AD", Some("A"))],
        );
        assert_eq!(
            rows(&store),
            vec![("A", 0), ("AB", 1), ("AC", 1), ("AD", 1), ("B", 0), ("C", 0)]
        );
        assert_consistent(&store);
    }

    #[test]
    fn replacing_root_children_drops_stale_subtrees() {
        let mut store = sample_store();
        store.set_expanded(key("A"), true);
        store.set_children(FolderKey::Root, vec![leaf("B", None), folder("C", None)]);
        assert_eq!(rows(&store), vec![("B", 0), ("C", 0)]);
    }

    #[test]
    fn loading_and_page_info_do_not_touch_rows() {
        let mut store = sample_store();
        let before = store.visible_rows().to_vec();
        store.set_loading(key("A"), true);
        store.set_page_info(
            key("A"),
            PageInfo {
                end_cursor: Some("c".into()),
                has_next_page: true,
            },
        );
        assert_eq!(store.visible_rows(), before.as_slice());
        assert!(store.is_loading(&key("A")));
        assert_eq!(store.page_info(&key("A")).unwrap().end_cursor.as_deref(), Some("c"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = sample_store();
        store.set_loading(FolderKey::Root, true);
        store.set_page_info(FolderKey::Root, PageInfo::default());
        store.reset();
        assert!(store.visible_rows().is_empty());
        assert!(store.expanded().is_empty());
        assert!(store.loading().is_empty());
        assert!(store.children_by_key().is_empty());
        assert!(store.page_info_by_key().is_empty());
    }

    #[test]
    fn cyclic_data_terminates() {
        let mut store = TreeStore::new();
        store.set_expanded(FolderKey::Root, true);
        store.set_children(FolderKey::Root, vec![folder("A", None)]);
        store.set_children(key("A"), vec![folder("B", Some("A"))]);
        store.set_children(key("B"), vec![folder("A", Some("B"))]);
        store.set_expanded(key("A"), true);
        store.set_expanded(key("B"), true);
        assert_eq!(rows(&store), vec![("A", 0), ("B", 1), ("A", 2)]);
        assert_consistent(&store);
    }

    #[test]
    fn deep_descendants_keep_sibling_order() {
        let mut store = TreeStore::new();
        store.set_expanded(FolderKey::Root, true);
        store.set_children(FolderKey::Root, vec![folder("1", None), folder("2", None)]);
        store.set_children(key("1"), vec![folder("1.1", Some("1"))]);
        store.set_children(key("1.1"), vec![leaf("1.1.1", Some("1.1"))]);
        store.set_children(key("2"), vec![leaf("2.1", Some("2"))]);
        for id in ["2", "1.1", "1"] {
            store.set_expanded(key(id), true);
        }
        assert_eq!(
            rows(&store),
            vec![("1", 0), ("1.1", 1), ("1.1.1", 2), ("2", 0), ("2.1", 1)]
        );
    }

    /// Drive a pseudo-random sequence of mutations and check after each step
    /// that the spliced rows match a full walk.
    #[test]
    fn incremental_rows_match_full_walk() {
        let ids = ["1", "2", "3", "1.1", "1.2", "2.1", "1.1.1", "1.1.2", "9"];
        let mut seed: u64 = 0x5eed_1234;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        let mut store = TreeStore::new();
        for _ in 0..500 {
            let target = match next() % (ids.len() + 1) {
                0 => FolderKey::Root,
                n => key(ids[n - 1]),
            };
            if next() % 2 == 0 {
                store.set_expanded(target, next() % 3 != 0);
            } else {
                let count = next() % 4;
                let children = (0..count)
                    .map(|_| folder(ids[next() % ids.len()], None))
                    .collect();
                store.set_children(target, children);
            }
            assert_consistent(&store);
        }
    }
}
