//! Surface preview fetcher
//!
//! Headless rendition of the embedded content surface: fetches the routed
//! destination with auto-redirects off, follows Location hops manually up
//! to the redirect cap, and falls back to the last good path when a chain
//! runs away. Response session cookies land in the persistent jar.

use coopgate_core::config::SurfaceConfig;
use coopgate_store::cookies::{parse_set_cookie, CookieStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewPage {
    pub final_url: String,
    pub status: u16,
    pub redirects: u32,
    /// The redirect cap was hit and the last good path was served instead.
    pub fell_back: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bad destination url: {0}")]
    BadUrl(String),

    #[error("redirect cap exceeded at {last}")]
    TooManyRedirects { last: String },
}

pub struct SurfacePreview {
    client: reqwest::Client,
    cookies: Arc<CookieStore>,
    redirect_cap: u32,
}

impl SurfacePreview {
    pub fn new(cookies: Arc<CookieStore>, surface: &SurfaceConfig) -> Result<Self, PreviewError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_millis(surface.fetch_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            cookies,
            redirect_cap: surface.redirect_cap,
        })
    }

    /// Fetch `url`, following redirects up to the cap. Past the cap, retry
    /// once from `last_good` before giving up.
    pub async fn fetch(
        &self,
        url: &str,
        last_good: Option<&str>,
    ) -> Result<PreviewPage, PreviewError> {
        let start = Url::parse(url).map_err(|e| PreviewError::BadUrl(format!("{}: {}", url, e)))?;
        match self.follow(start).await? {
            Followed::Landed(page) => Ok(page),
            Followed::CapHit { last } => {
                warn!("Redirect cap hit at {}", last);
                let Some(good) = last_good else {
                    return Err(PreviewError::TooManyRedirects { last });
                };
                let good =
                    Url::parse(good).map_err(|e| PreviewError::BadUrl(format!("{}: {}", good, e)))?;
                match self.follow(good).await? {
                    Followed::Landed(mut page) => {
                        page.fell_back = true;
                        Ok(page)
                    }
                    Followed::CapHit { last } => Err(PreviewError::TooManyRedirects { last }),
                }
            }
        }
    }

    async fn follow(&self, start: Url) -> Result<Followed, PreviewError> {
        let mut current = start;
        let mut redirects = 0u32;
        loop {
            let mut request = self.client.get(current.clone());
            if let Some(host) = current.host_str() {
                if let Some(cookie) = self.cookies.header_for(host) {
                    request = request.header(reqwest::header::COOKIE, cookie);
                }
            }
            let response = request.send().await?;

            if let Some(host) = current.host_str() {
                for header in response.headers().get_all(reqwest::header::SET_COOKIE) {
                    if let Some((name, value)) = header.to_str().ok().and_then(parse_set_cookie) {
                        self.cookies.set(host, &name, &value);
                    }
                }
            }

            let status = response.status().as_u16();
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok());
            match next_hop(&current, status, location) {
                Some(next) => {
                    redirects += 1;
                    if redirects > self.redirect_cap {
                        return Ok(Followed::CapHit {
                            last: current.to_string(),
                        });
                    }
                    debug!("Redirect {} -> {}", current, next);
                    current = next;
                }
                None => {
                    return Ok(Followed::Landed(PreviewPage {
                        final_url: current.to_string(),
                        status,
                        redirects,
                        fell_back: false,
                    }));
                }
            }
        }
    }
}

enum Followed {
    Landed(PreviewPage),
    CapHit { last: String },
}

/// Where a response sends us next, if it is a redirect with a usable
/// Location (resolved against the current URL).
fn next_hop(current: &Url, status: u16, location: Option<&str>) -> Option<Url> {
    if !matches!(status, 301 | 302 | 303 | 307 | 308) {
        return None;
    }
    let location = location?;
    current.join(location).ok()
}
