//! Sign-in, token refresh and sign-out against the auth endpoints.
//!
//! Token expiry is never computed locally: requests use the current access
//! token, an authentication failure triggers [`SessionService::refresh`], and
//! a refresh rejected with HTTP 400 signs the user out.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::api_fetch::api_fetch;
use super::storage::SessionStorage;
use crate::error::FetchError;

const GENERATE_TOKEN_ENDPOINT: &str = "/auth/generate-token";
const REFRESH_TOKEN_ENDPOINT: &str = "/auth/refresh-token";

/// Access/refresh token pair issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    data: SessionInfo,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Owner of the current session.
///
/// The session lives in a watch channel so the UI loop can observe
/// sign-outs that happen inside the transport (a rejected refresh).
#[derive(Debug)]
pub struct SessionService {
    http: reqwest::Client,
    auth_url: String,
    storage: Option<SessionStorage>,
    state: watch::Sender<Option<SessionInfo>>,
}

impl SessionService {
    /// Create the service, restoring any persisted session from `storage`.
    pub fn new(
        http: reqwest::Client,
        auth_url: impl Into<String>,
        storage: Option<SessionStorage>,
    ) -> Self {
        let restored = storage.as_ref().and_then(SessionStorage::load);
        if restored.is_some() {
            info!("restored persisted session");
        }
        Self {
            http,
            auth_url: auth_url.into(),
            storage,
            state: watch::channel(restored).0,
        }
    }

    pub fn session(&self) -> Option<SessionInfo> {
        self.state.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionInfo>> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<(), FetchError> {
        let body = SignInRequest { username, password };
        let response: SessionResponse =
            api_fetch(&self.http, &self.auth_url, GENERATE_TOKEN_ENDPOINT, &body).await?;
        info!(username, "signed in");
        self.set_session(Some(response.data));
        Ok(())
    }

    pub fn sign_out(&self) {
        info!("signing out");
        self.set_session(None);
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// An HTTP 400 means the refresh token is no longer valid and signs the
    /// user out; any other failure leaves the session untouched.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let Some(current) = self.session() else {
            error!("refresh requested while signed out");
            return Err(FetchError::NotSignedIn);
        };

        let body = RefreshRequest {
            refresh_token: &current.refresh_token,
        };
        match api_fetch::<SessionResponse, _>(&self.http, &self.auth_url, REFRESH_TOKEN_ENDPOINT, &body)
            .await
        {
            Ok(response) => {
                info!("access token refreshed");
                self.set_session(Some(response.data));
                Ok(())
            }
            Err(e) if e.is_invalid_refresh_token() => {
                info!("refresh token rejected");
                self.sign_out();
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "token refresh failed");
                Err(e)
            }
        }
    }

    fn set_session(&self, session: Option<SessionInfo>) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(session.as_ref()) {
                warn!(path = %storage.path().display(), error = %e, "failed to persist session");
            }
        }
        self.state.send_replace(session);
    }
}
