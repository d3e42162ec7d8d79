//! Client-side routes.
//!
//! The browser lands on `/callback?code=...` after the identity provider
//! redirects; everything else under `/` is the main view.  Any other path
//! resolves to [`Route::NotFound`].

use url::Url;

pub const MAIN_PATH: &str = "/";
pub const CALLBACK_PATH: &str = "/callback";

/// Base used to resolve bare paths such as `/callback?code=x`.
const LOCAL_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Main,
    /// The OAuth redirect.  `code` is `None` when the query carried none.
    Callback { code: Option<String> },
    NotFound(String),
}

impl Route {
    /// Resolve a full URL.
    pub fn resolve(url: &Url) -> Self {
        match url.path() {
            MAIN_PATH | "" => Self::Main,
            CALLBACK_PATH | "/callback/" => Self::Callback {
                code: odc_onedrive::auth::code_from_url(url),
            },
            other => Self::NotFound(other.to_string()),
        }
    }

    /// Resolve a full URL or an origin-relative path.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(LOCAL_BASE)?.join(input)?,
            Err(e) => return Err(e),
        };
        Ok(Self::resolve(&url))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_callback_with_code() {
        let route = Route::parse("http://localhost:3000/callback?code=XYZ").unwrap();
        assert_eq!(
            route,
            Route::Callback {
                code: Some("XYZ".into())
            }
        );
    }

    #[test]
    fn test_resolve_relative_paths() {
        assert_eq!(Route::parse("/").unwrap(), Route::Main);
        assert_eq!(
            Route::parse("/callback").unwrap(),
            Route::Callback { code: None }
        );
        assert_eq!(
            Route::parse("/nowhere?x=1").unwrap(),
            Route::NotFound("/nowhere".into())
        );
    }
}
