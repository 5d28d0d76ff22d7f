//! GraphQL transport: network executor plus the page cache it feeds.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::cache::PageCache;
use super::query::{
    GraphQlRequest, GraphQlResponse, ListProfileNodesData, ListProfileNodesVars,
    ProfileNodeConnection, LIST_PROFILE_NODES,
};
use crate::auth::session::SessionService;
use crate::error::FetchError;
use crate::tree::node::FolderKey;

/// GraphQL error code the backend uses for a rejected access token.
pub const AUTH_NOT_AUTHENTICATED: &str = "AUTH_NOT_AUTHENTICATED";

/// Performs one network round trip of the `ListProfileNodes` query.
#[async_trait]
pub trait QueryExecutor: Send + Sync + 'static {
    async fn list_profile_nodes(
        &self,
        vars: &ListProfileNodesVars,
    ) -> Result<ProfileNodeConnection, FetchError>;
}

/// Executes queries over HTTP with the session's bearer token.
pub struct HttpExecutor {
    http: reqwest::Client,
    endpoint: String,
    session: Arc<SessionService>,
}

impl HttpExecutor {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, session: Arc<SessionService>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            session,
        }
    }
}

#[async_trait]
impl QueryExecutor for HttpExecutor {
    async fn list_profile_nodes(
        &self,
        vars: &ListProfileNodesVars,
    ) -> Result<ProfileNodeConnection, FetchError> {
        let token = self.session.access_token().ok_or(FetchError::NotSignedIn)?;
        let request = GraphQlRequest {
            query: LIST_PROFILE_NODES,
            variables: vars,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: raw,
            });
        }

        let envelope: GraphQlResponse<ListProfileNodesData> =
            serde_json::from_str(&raw).map_err(|e| FetchError::Parse(e.to_string()))?;

        if !envelope.errors.is_empty() {
            if envelope
                .errors
                .iter()
                .any(|e| e.code() == Some(AUTH_NOT_AUTHENTICATED))
            {
                warn!("access token rejected, refreshing session");
                // A rejected refresh signs the session out on its own.
                if let Err(e) = self.session.refresh().await {
                    debug!(error = %e, "session refresh failed, request not retried");
                }
                return Err(FetchError::Unauthenticated);
            }
            return Err(FetchError::GraphQl(
                envelope.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        envelope
            .data
            .map(|data| data.list_profile_nodes)
            .ok_or_else(|| FetchError::Parse("response carried no data".into()))
    }
}

/// Query, cache and watch access for the profile node query.
///
/// `query` only requests data; results reach consumers exclusively through
/// the cache and its watch channels.
pub struct GraphQlTransport {
    executor: Arc<dyn QueryExecutor>,
    cache: PageCache,
}

impl GraphQlTransport {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            cache: PageCache::new(),
        }
    }

    /// Fetch a page from the network and merge it into the cache.
    ///
    /// A page that arrives after [`GraphQlTransport::clear_cache`] belongs to
    /// the previous session and is discarded.
    pub async fn query(&self, vars: &ListProfileNodesVars) -> Result<(), FetchError> {
        let key = vars.folder_key();
        let generation = self.cache.generation();
        debug!(folder = %key, after = ?vars.after, first = vars.first, "fetching children");
        let page = self.executor.list_profile_nodes(vars).await?;
        self.cache.write(generation, &key, page, vars.after.as_deref());
        Ok(())
    }

    pub fn read_cached(&self, key: &FolderKey) -> Option<ProfileNodeConnection> {
        self.cache.read(key)
    }

    pub fn watch(&self, key: &FolderKey) -> watch::Receiver<Option<ProfileNodeConnection>> {
        self.cache.watch(key)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
