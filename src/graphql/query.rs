//! Wire shapes of the `ListProfileNodes` query.

use serde::{Deserialize, Serialize};

use crate::tree::node::{FolderKey, Node, PageInfo};

pub const LIST_PROFILE_NODES: &str = r#"
query ListProfileNodes($parentNodeId: String, $first: Int!, $after: String) {
  listProfileNodes(where: {parentNodeId: {eq: $parentNodeId}}, first: $first, after: $after) {
    edges {
      cursor
      node {
        id
        kind
        name
        parentNodeId
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}"#;

/// Default number of children requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Variables of one `ListProfileNodes` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProfileNodesVars {
    pub parent_node_id: Option<String>,
    pub first: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl ListProfileNodesVars {
    /// First page of `key`'s children.
    pub fn first_page(key: &FolderKey, first: usize) -> Self {
        Self {
            parent_node_id: key.parent_node_id().map(String::from),
            first,
            after: None,
        }
    }

    /// The page following `cursor`.
    pub fn next_page(key: &FolderKey, first: usize, cursor: &str) -> Self {
        Self {
            after: Some(cursor.to_string()),
            ..Self::first_page(key, first)
        }
    }

    pub fn folder_key(&self) -> FolderKey {
        FolderKey::from(self.parent_node_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileEdge {
    pub cursor: String,
    pub node: Node,
}

/// One folder's children as the cache holds them: all merged edges plus the
/// page info of the most recent page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNodeConnection {
    #[serde(default)]
    pub edges: Vec<ProfileEdge>,
    pub page_info: PageInfo,
}

impl ProfileNodeConnection {
    pub fn nodes(&self) -> Vec<Node> {
        self.edges.iter().map(|edge| edge.node.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProfileNodesData {
    pub list_profile_nodes: ProfileNodeConnection,
}

/// Request body of a GraphQL POST.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: &'a V,
}

/// Response envelope of a GraphQL POST.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlError {
    /// The `extensions.code` tag, if the server supplied one.
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}
