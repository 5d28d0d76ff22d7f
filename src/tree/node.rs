use std::fmt;

use serde::{Deserialize, Serialize};

/// The only node kind that may have children.
pub const FOLDER_KIND: &str = "FolderNode";

/// A profile node as served by the backend.
///
/// Nodes are immutable snapshots: a refetch replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    /// Server-defined kind tag, e.g. `FolderNode`, `AlarmNode`, `VideoChannelNode`.
    pub kind: String,
    pub parent_node_id: Option<String>,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        self.kind == FOLDER_KIND
    }

    /// Key under which this node's own children are stored.
    pub fn folder_key(&self) -> FolderKey {
        FolderKey::Node(self.id.clone())
    }

    /// Key of the folder this node is listed under.
    pub fn parent_key(&self) -> FolderKey {
        FolderKey::from(self.parent_node_id.as_deref())
    }
}

/// Identifies a position in the tree whose children can be listed.
///
/// `Root` stands for the implicit parent of all top-level nodes; the wire
/// representation of it (`parentNodeId: null`) only exists at the transport
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FolderKey {
    Root,
    Node(String),
}

impl FolderKey {
    /// The `parentNodeId` query variable for this key.
    pub fn parent_node_id(&self) -> Option<&str> {
        match self {
            FolderKey::Root => None,
            FolderKey::Node(id) => Some(id),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, FolderKey::Root)
    }
}

impl From<Option<&str>> for FolderKey {
    fn from(parent_node_id: Option<&str>) -> Self {
        match parent_node_id {
            Some(id) => FolderKey::Node(id.to_string()),
            None => FolderKey::Root,
        }
    }
}

impl From<Option<String>> for FolderKey {
    fn from(parent_node_id: Option<String>) -> Self {
        match parent_node_id {
            Some(id) => FolderKey::Node(id),
            None => FolderKey::Root,
        }
    }
}

impl fmt::Display for FolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderKey::Root => f.write_str("<root>"),
            FolderKey::Node(id) => f.write_str(id),
        }
    }
}

/// Pagination state of one folder's children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Cursor of the last fetched edge; absent until a page has been fetched.
    #[serde(default)]
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PageInfo {
    /// The cursor to continue from, if another page exists.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

/// One row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub node: Node,
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: &str, parent: Option<&str>) -> Node {
        Node {
            id: id.into(),
            name: id.to_uppercase(),
            kind: kind.into(),
            parent_node_id: parent.map(String::from),
        }
    }

    #[test]
    fn none_and_root_are_the_same_key() {
        assert_eq!(FolderKey::from(None::<&str>), FolderKey::Root);
        assert_eq!(FolderKey::from(None::<String>), FolderKey::Root);
        assert_eq!(FolderKey::Root.parent_node_id(), None);
    }

    #[test]
    fn node_key_round_trips_parent_id() {
        let key = FolderKey::from(Some("42"));
        assert_eq!(key, FolderKey::Node("42".into()));
        assert_eq!(key.parent_node_id(), Some("42"));
    }

    #[test]
    fn only_folder_kind_is_folder() {
        assert!(node("a", "FolderNode", None).is_folder());
        assert!(!node("b", "AlarmNode", None).is_folder());
        assert!(!node("c", "folder", None).is_folder());
    }

    #[test]
    fn parent_key_of_top_level_node_is_root() {
        assert_eq!(node("a", "FolderNode", None).parent_key(), FolderKey::Root);
        assert_eq!(
            node("b", "AlarmNode", Some("a")).parent_key(),
            FolderKey::Node("a".into())
        );
    }

    #[test]
    fn node_deserializes_from_wire_shape() {
        let json = r#"{"id":"7","kind":"VideoChannelNode","name":"Cam 1","parentNodeId":null}"#;
        let parsed: Node = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, "7");
        assert_eq!(parsed.kind, "VideoChannelNode");
        assert_eq!(parsed.parent_node_id, None);
    }

    #[test]
    fn page_info_accepts_missing_end_cursor() {
        let parsed: PageInfo = serde_json::from_str(r#"{"hasNextPage":false}"#).unwrap();
        assert_eq!(parsed.end_cursor, None);
        assert!(!parsed.has_next_page);
    }

    #[test]
    fn next_cursor_requires_both_flag_and_cursor() {
        let more = PageInfo {
            end_cursor: Some("c1".into()),
            has_next_page: true,
        };
        let done = PageInfo {
            end_cursor: Some("c1".into()),
            has_next_page: false,
        };
        let no_cursor = PageInfo {
            end_cursor: None,
            has_next_page: true,
        };
        assert_eq!(more.next_cursor(), Some("c1"));
        assert_eq!(done.next_cursor(), None);
        assert_eq!(no_cursor.next_cursor(), None);
    }
}
