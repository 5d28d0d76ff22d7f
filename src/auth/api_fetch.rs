use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FetchError;

/// Resolve `endpoint` against `base_url` the way a browser resolves a link:
/// an absolute path replaces the base path.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> Result<Url, FetchError> {
    let base =
        Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
    base.join(endpoint)
        .map_err(|e| FetchError::InvalidUrl(format!("{endpoint}: {e}")))
}

/// POST `body` as JSON to `endpoint` and parse the JSON response.
///
/// Failures are classified as:
/// - `Network` when no response arrived,
/// - `Http` for non-2xx statuses (the raw body is kept for diagnostics),
/// - `Parse` when the body is not the expected JSON.
pub async fn api_fetch<T, B>(
    client: &reqwest::Client,
    base_url: &str,
    endpoint: &str,
    body: &B,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let url = endpoint_url(base_url, endpoint)?;
    let response = client
        .post(url)
        .header(ACCEPT, "application/json")
        .json(body)
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

    serde_json::from_str(&raw).map_err(|e| FetchError::Parse(e.to_string()))
}
