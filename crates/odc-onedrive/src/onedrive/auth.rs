//! Login through the backend proxy.
//!
//! The backend owns the OAuth client registration.  The client only:
//!
//! - asks the backend for the identity-provider login URL;
//! - hands the authorization code from the redirect back to the backend,
//!   which exchanges it and returns a bearer token.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::error::{ConsoleError, ConsoleResult};
use crate::onedrive::types::{LoginUrlResponse, TokenResponse};
use log::{debug, info};
use url::Url;

pub const LOGIN_PATH: &str = "auth/login";
pub const CALLBACK_PATH: &str = "auth/callback";

// ═══════════════════════════════════════════════════════════════════════
//  Public API
// ═══════════════════════════════════════════════════════════════════════

/// Fetch the identity-provider login URL.
pub async fn login_url(client: &BackendClient) -> ConsoleResult<String> {
    let resp: LoginUrlResponse = client.get_json(LOGIN_PATH, &[], None).await?;
    if resp.url.is_empty() {
        return Err(ConsoleError::auth("Backend returned an empty login URL"));
    }
    debug!("Login URL received ({} chars)", resp.url.len());
    Ok(resp.url)
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(client: &BackendClient, code: &str) -> ConsoleResult<String> {
    let resp: TokenResponse = client
        .get_json(CALLBACK_PATH, &[("code", code)], None)
        .await?;
    if resp.access_token.is_empty() {
        return Err(ConsoleError::auth("No accessToken in response"));
    }
    info!("Authorization code exchanged for an access token");
    Ok(resp.access_token)
}

/// Extract the authorization code from whatever the user pasted: a full
/// redirect URL, a bare query string (`?code=...`) or the code itself.
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(input) {
        return code_from_url(&url);
    }

    if let Some(query) = input.strip_prefix('?').or_else(|| {
        input
            .split_once('?')
            .map(|(_, q)| q)
    }) {
        let url = Url::parse(&format!("http://localhost/?{}", query)).ok()?;
        return code_from_url(&url);
    }

    if input.contains('=') || input.contains('&') {
        return None;
    }
    Some(input.to_string())
}

/// The `code` query parameter of a redirect URL, if present and non-empty.
pub fn code_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_code_from_full_url() {
        assert_eq!(
            extract_code("http://localhost:3000/callback?code=XYZ&state=s1"),
            Some("XYZ".into())
        );
    }

    #[test]
    fn test_extract_code_from_query() {
        assert_eq!(extract_code("?code=M.C507_abc"), Some("M.C507_abc".into()));
        assert_eq!(extract_code("/callback?code=abc%2Fdef"), Some("abc/def".into()));
    }

    #[test]
    fn test_extract_bare_code() {
        assert_eq!(extract_code("  XYZ  "), Some("XYZ".into()));
    }

    #[test]
    fn test_extract_code_missing() {
        assert_eq!(extract_code(""), None);
        assert_eq!(extract_code("http://localhost:3000/callback"), None);
        assert_eq!(extract_code("http://localhost:3000/callback?code="), None);
        assert_eq!(extract_code("state=abc"), None);
    }
}
