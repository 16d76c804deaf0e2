use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;

/// Builds the shared `reqwest::Client` with the configured timeout and
/// `User-Agent`.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed (e.g., invalid TLS config).
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ScraperError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// GETs `url` and returns the body as text.
///
/// # Errors
///
/// - [`ScraperError::NotFound`]: HTTP 404.
/// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
/// - [`ScraperError::Http`]: network or TLS failure, or an unreadable body.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, ScraperError> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response.text().await?)
}
