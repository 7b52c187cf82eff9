//! HTTP transport and redirect handling.
//!
//! Automatic redirects are disabled on the client so that credentials are only
//! ever sent to the Earthdata login host, never to the data host that
//! redirects there or to whatever host it redirects back to.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::redirect::Policy;
use reqwest::Url;

use crate::error::{LookupError, Result};

/// Host that receives the `Authorization` header.
pub const AUTH_HOST: &str = "urs.earthdata.nasa.gov";

/// Maximum number of redirects followed for one download.
pub const MAX_REDIRECTS: usize = 10;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("srtm-lookup/", env!("CARGO_PKG_VERSION"));

/// The parts of an HTTP response that downloads care about.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// `Location` header, if present.
    pub location: Option<String>,
    /// Response body. Only read for status 200.
    pub body: Vec<u8>,
}

/// Performs a single GET request without following redirects.
pub trait Transport: Send + Sync {
    /// Fetch `url`, sending `Authorization: Basic <credential>` when a
    /// credential is given.
    fn get(&self, url: &str, credential: Option<&str>) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a blocking reqwest client with a cookie store.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(Policy::none())
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, credential: Option<&str>) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, format!("Basic {}", credential));
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = if status == 200 {
            response.bytes()?.to_vec()
        } else {
            Vec::new()
        };

        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

/// Whether requests to `url` should carry the credential.
pub fn is_auth_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.starts_with(AUTH_HOST)))
        .unwrap_or(false)
}

/// GET `url`, following up to [`MAX_REDIRECTS`] 302 responses by hand.
///
/// The credential is attached only to requests addressed to [`AUTH_HOST`].
/// With a credential, any status other than 200 or 302 is reported as
/// [`LookupError::AuthFailed`]; without one it is [`LookupError::HttpStatus`].
pub fn follow_redirects(
    transport: &dyn Transport,
    url: &str,
    credential: Option<&str>,
) -> Result<Vec<u8>> {
    let mut current = url.to_string();

    for _ in 0..MAX_REDIRECTS {
        let auth = credential.filter(|_| is_auth_host(&current));
        tracing::debug!(url = %current, auth = auth.is_some(), "GET");

        let response = transport.get(&current, auth)?;
        match response.status {
            200 => return Ok(response.body),
            302 => {
                current = response
                    .location
                    .as_deref()
                    .and_then(|loc| resolve(&current, loc))
                    .ok_or_else(|| LookupError::MissingRedirectLocation {
                        url: current.clone(),
                    })?;
            }
            status if credential.is_some() => return Err(LookupError::AuthFailed { status }),
            status => {
                return Err(LookupError::HttpStatus {
                    status,
                    url: current,
                })
            }
        }
    }

    Err(LookupError::RedirectLimit {
        url: url.to_string(),
    })
}

/// Resolve a possibly relative `Location` against the URL that returned it.
fn resolve(base: &str, location: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(location).ok().map(String::from)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    const DATA_URL: &str = "https://e4ftl01.cr.usgs.gov/MEASURES/SRTMGL1.003/2000.02.11/N46E007.SRTMGL1.hgt.zip";

    #[test]
    fn test_is_auth_host() {
        assert!(is_auth_host("https://urs.earthdata.nasa.gov/oauth/authorize?x=1"));
        assert!(!is_auth_host(DATA_URL));
        assert!(!is_auth_host("https://example.com/urs.earthdata.nasa.gov"));
        assert!(!is_auth_host("not a url"));
    }

    #[test]
    fn test_plain_download() {
        let transport = ScriptedTransport::new(vec![ok(b"data")]);
        let body = follow_redirects(&transport, DATA_URL, None).unwrap();
        assert_eq!(body, b"data");
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_earthdata_flow_sends_credential_only_to_auth_host() {
        let transport = ScriptedTransport::new(vec![
            redirect("https://urs.earthdata.nasa.gov/oauth/authorize?client_id=abc"),
            redirect("https://e4ftl01.cr.usgs.gov/token?code=xyz"),
            redirect(DATA_URL),
            ok(b"tile"),
        ]);

        let body = follow_redirects(&transport, DATA_URL, Some("dXNlcjpwYXNz")).unwrap();
        assert_eq!(body, b"tile");

        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].credential, None);
        assert_eq!(requests[1].credential.as_deref(), Some("dXNlcjpwYXNz"));
        assert_eq!(requests[2].credential, None);
        assert_eq!(requests[3].credential, None);
    }

    #[test]
    fn test_relative_location() {
        let transport = ScriptedTransport::new(vec![redirect("/other/file.zip"), ok(b"x")]);
        follow_redirects(&transport, "https://host.example/a/b.zip", None).unwrap();
        assert_eq!(
            transport.requests()[1].url,
            "https://host.example/other/file.zip"
        );
    }

    #[test]
    fn test_redirect_limit() {
        let transport = ScriptedTransport::always(redirect(DATA_URL));
        let result = follow_redirects(&transport, DATA_URL, Some("abc"));

        assert!(matches!(result, Err(LookupError::RedirectLimit { .. })));
        assert_eq!(transport.request_count(), MAX_REDIRECTS);
    }

    #[test]
    fn test_missing_location() {
        let transport = ScriptedTransport::new(vec![HttpResponse {
            status: 302,
            location: None,
            body: Vec::new(),
        }]);
        let result = follow_redirects(&transport, DATA_URL, None);
        assert!(matches!(
            result,
            Err(LookupError::MissingRedirectLocation { .. })
        ));
    }

    #[test]
    fn test_error_status_with_credential_is_auth_failure() {
        let transport = ScriptedTransport::new(vec![
            redirect("https://urs.earthdata.nasa.gov/oauth/authorize"),
            status(401),
        ]);
        let result = follow_redirects(&transport, DATA_URL, Some("abc"));
        assert!(matches!(result, Err(LookupError::AuthFailed { status: 401 })));
    }

    #[test]
    fn test_error_status_without_credential() {
        let transport = ScriptedTransport::new(vec![status(404)]);
        match follow_redirects(&transport, DATA_URL, None) {
            Err(LookupError::HttpStatus { status, url }) => {
                assert_eq!(status, 404);
                assert_eq!(url, DATA_URL);
            }
            other => panic!("Expected HttpStatus, got {:?}", other),
        }
    }
}
