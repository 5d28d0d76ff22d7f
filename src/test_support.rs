//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::FetchError;
use crate::graphql::client::QueryExecutor;
use crate::graphql::query::{ListProfileNodesVars, ProfileEdge, ProfileNodeConnection};
use crate::tree::node::{Node, PageInfo};

/// A request captured by [`MockServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    /// Header names are lower-cased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

type Handler = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server answering every request through a closure.
pub struct MockServer {
    /// Base URL with a trailing slash, e.g. `http://127.0.0.1:41234/`.
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    serve(stream, recorded, handler).await;
                });
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    handler: Arc<Handler>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let request = RecordedRequest {
        path,
        headers,
        body,
    };
    let (status, response_body) = handler(&request);
    recorded.lock().unwrap().push(request);

    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
        response_body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Serves pages from a fixed table keyed by (parent id, after cursor).
#[derive(Default)]
pub struct FakeExecutor {
    pub pages: Mutex<HashMap<(Option<String>, Option<String>), ProfileNodeConnection>>,
    pub calls: Mutex<Vec<ListProfileNodesVars>>,
    pub count: AtomicUsize,
    pub fail: bool,
    /// Hold every response back this long, so a fetch stays in flight.
    pub delay: Option<Duration>,
}

impl FakeExecutor {
    pub fn serve(&self, parent: Option<&str>, after: Option<&str>, page: ProfileNodeConnection) {
        self.pages
            .lock()
            .unwrap()
            .insert((parent.map(String::from), after.map(String::from)), page);
    }

    pub fn calls(&self) -> Vec<ListProfileNodesVars> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn list_profile_nodes(
        &self,
        vars: &ListProfileNodesVars,
    ) -> Result<ProfileNodeConnection, FetchError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(vars.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(FetchError::Network("offline".into()));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&(vars.parent_node_id.clone(), vars.after.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

pub fn node(id: &str, kind: &str, parent: Option<&str>) -> Node {
    Node {
        id: id.into(),
        name: format!("Node {id}"),
        kind: kind.into(),
        parent_node_id: parent.map(String::from),
    }
}

/// A page whose edge cursors are `c-<id>`.
pub fn page(nodes: Vec<Node>, end_cursor: Option<&str>, has_next_page: bool) -> ProfileNodeConnection {
    ProfileNodeConnection {
        edges: nodes
            .into_iter()
            .map(|node| ProfileEdge {
                cursor: format!("c-{}", node.id),
                node,
            })
            .collect(),
        page_info: PageInfo {
            end_cursor: end_cursor.map(String::from),
            has_next_page,
        },
    }
}
