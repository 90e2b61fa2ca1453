//! Server addressing: URL trimming, TLS detection, URL building.

use std::time::Duration;

use tracing::debug;

use crate::ApiError;

const SCHEMES: [(&str, bool); 4] = [
    ("https://", true),
    ("wss://", true),
    ("http://", false),
    ("ws://", false),
];

/// Strips the scheme and any trailing slashes from `url`.
///
/// The result is the canonical key a server is known by, e.g. in the
/// session store.
///
/// ```rust
/// assert_eq!(gamelink_api::trim_url("https://games.example.com/"), "games.example.com");
/// assert_eq!(gamelink_api::trim_url("localhost:8080"), "localhost:8080");
/// ```
pub fn trim_url(url: &str) -> String {
    split_scheme(url).0.to_owned()
}

fn split_scheme(url: &str) -> (&str, Option<bool>) {
    let url = url.trim();
    for (prefix, tls) in SCHEMES {
        if let Some(rest) = url.strip_prefix(prefix) {
            return (rest.trim_end_matches('/').trim(), Some(tls));
        }
    }
    (url.trim_end_matches('/').trim(), None)
}

/// A trimmed server address plus whether it speaks TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    tls: bool,
}

impl Endpoint {
    /// Builds an endpoint from an already-known TLS setting. Any scheme on
    /// `url` is stripped.
    pub fn new(url: &str, tls: bool) -> Self {
        Self {
            host: trim_url(url),
            tls,
        }
    }

    /// Resolves `url` into an endpoint.
    ///
    /// An explicit scheme decides TLS. Without one, the server is tried
    /// over HTTPS and TLS is used if it gives any response within
    /// `tls_timeout`.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidUrl`] if nothing is left after trimming.
    pub async fn resolve(url: &str, tls_timeout: Duration) -> Result<Self, ApiError> {
        let (host, explicit) = split_scheme(url);
        if host.is_empty() {
            return Err(ApiError::InvalidUrl(url.to_owned()));
        }

        let tls = match explicit {
            Some(tls) => tls,
            None => detect_tls(host, tls_timeout).await,
        };
        debug!(host, tls, "endpoint resolved");
        Ok(Self {
            host: host.to_owned(),
            tls,
        })
    }

    /// The trimmed address, e.g. `localhost:8080`.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// `http(s)://<host><path>`
    pub fn http_url(&self, path: &str) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}{path}", self.host)
    }

    /// `ws(s)://<host><path>`
    pub fn ws_url(&self, path: &str) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}{path}", self.host)
    }

    /// `ws(s)://<host>/<segments>?<query>`, with every segment and query
    /// value percent-encoded.
    pub fn ws_url_with(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        let invalid = || ApiError::InvalidUrl(self.host.clone());
        let mut url = reqwest::Url::parse(&self.ws_url("/")).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }
}

async fn detect_tls(host: &str, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "tls detection client unavailable");
            return false;
        }
    };
    client
        .get(format!("https://{host}/api/info"))
        .send()
        .await
        .is_ok()
}
