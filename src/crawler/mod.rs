//! Site traversal over an abstract page-rendering capability.
//!
//! The crawler walks a site's internal link graph from a seed URL using a
//! frontier/visited pair, yielding one `(url, visible_text)` page at a time.
//! Rendering is behind the [`PageRenderer`] trait so the traversal can be
//! exercised against an in-memory site in tests; [`HttpRenderer`] is the
//! shipped implementation for server-rendered sites, and a headless-browser
//! renderer slots in behind the same trait for script-rendered ones.

mod http;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::types::RagError;

pub use http::HttpRenderer;

/// Path extensions that identify binary or non-text resources; URLs ending
/// in one of these are never fetched.
pub const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".png", ".jpg", ".jpeg", ".svg", ".zip", ".rar", ".exe", ".dmg",
];

/// A page after client-side rendering has settled: its visible text and the
/// hyperlink targets found in the document.
#[derive(Clone, Debug)]
pub struct RenderedPage {
    pub text: String,
    pub links: Vec<Url>,
}

/// Black-box capability for fetching and fully rendering one page.
///
/// Implementations must only return once dynamic rendering has settled —
/// callers read `text` as the final visible content. A failed fetch or
/// render maps to [`RagError::Crawl`]; the crawl logs it and moves on.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RagError>;
}

/// One crawled page ready for chunking.
#[derive(Clone, Debug)]
pub struct CrawledPage {
    /// Normalized source key: the URL path with query string and fragment
    /// stripped. This is both the crawl's de-duplication unit and the
    /// `source_url` recorded on every chunk from this page.
    pub source_url: String,
    /// Whitespace-collapsed visible text.
    pub text: String,
}

/// Crawl configuration; [`Crawler::start`] produces the actual traversal.
#[derive(Clone)]
pub struct Crawler {
    renderer: Arc<dyn PageRenderer>,
    min_text_chars: usize,
}

impl Crawler {
    pub fn new(renderer: Arc<dyn PageRenderer>, min_text_chars: usize) -> Self {
        Self {
            renderer,
            min_text_chars,
        }
    }

    /// Begins a fresh traversal seeded with `seed`. Each session starts from
    /// scratch; there is no resume.
    pub fn start(&self, seed: Url) -> CrawlSession {
        CrawlSession {
            renderer: Arc::clone(&self.renderer),
            min_text_chars: self.min_text_chars,
            origin: seed.origin(),
            frontier: vec![seed.clone()],
            enqueued: HashSet::from([normalize_url(&seed)]),
            visited: HashSet::new(),
        }
    }
}

/// A lazy, finite crawl: pages surface one at a time as [`next_page`] is
/// polled, and the session ends when the frontier drains.
///
/// [`next_page`]: CrawlSession::next_page
pub struct CrawlSession {
    renderer: Arc<dyn PageRenderer>,
    min_text_chars: usize,
    origin: url::Origin,
    frontier: Vec<Url>,
    enqueued: HashSet<String>,
    visited: HashSet<String>,
}

impl CrawlSession {
    /// Yields the next page with meaningful content, or `None` once the
    /// frontier is empty.
    ///
    /// Fetch/render failures and below-threshold pages are consumed
    /// internally: the URL is logged, stays visited, and the traversal
    /// continues with the rest of the frontier.
    pub async fn next_page(&mut self) -> Option<CrawledPage> {
        while let Some(url) = self.frontier.pop() {
            let key = normalize_url(&url);
            if self.visited.contains(&key) || should_skip(&url) {
                continue;
            }
            // Moved to visited before the fetch, exactly once: a failed page
            // is not retried within this session.
            self.visited.insert(key.clone());

            let page = match self.renderer.render(&url).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "skipping page after fetch failure");
                    continue;
                }
            };

            for link in page.links {
                if link.origin() != self.origin || should_skip(&link) {
                    continue;
                }
                let link_key = normalize_url(&link);
                if !self.visited.contains(&link_key) && self.enqueued.insert(link_key) {
                    self.frontier.push(link);
                }
            }

            if page.text.len() < self.min_text_chars {
                tracing::debug!(url = %url, chars = page.text.len(), "no meaningful content");
                continue;
            }

            return Some(CrawledPage {
                source_url: key,
                text: page.text,
            });
        }
        None
    }

    /// Number of URLs moved to the visited set so far.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Reduces a URL to its path, dropping query string and fragment, so
/// `/about?ref=x` and `/about` are the same crawl unit and metadata key.
pub fn normalize_url(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn should_skip(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
