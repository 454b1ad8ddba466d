//! Plain-HTTP page renderer for server-rendered sites.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{PageRenderer, RenderedPage};
use crate::types::RagError;

/// Fetches a page over HTTP and extracts links and visible text with a
/// static HTML parse.
///
/// This satisfies the [`PageRenderer`] contract for sites whose markup
/// arrives fully rendered from the server. Script-rendered sites need a
/// browser-backed implementation of the same trait; the traversal does not
/// care which one it is handed.
#[derive(Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| RagError::Config(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RagError> {
        let crawl_err = |message: String| RagError::Crawl {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| crawl_err(err.to_string()))?
            .error_for_status()
            .map_err(|err| crawl_err(err.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|err| crawl_err(err.to_string()))?;

        extract_page(url, &body)
    }
}

/// Parses the document, resolving `a[href]` targets against `base` and
/// collapsing the visible text to single-space-separated words.
fn extract_page(base: &Url, html: &str) -> Result<RenderedPage, RagError> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").map_err(|err| RagError::Crawl {
        url: base.to_string(),
        message: format!("bad selector: {err}"),
    })?;

    let mut links = Vec::new();
    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Ok(mut link) = base.join(href) {
            link.set_fragment(None);
            link.set_query(None);
            links.push(link);
        }
    }

    let mut raw = String::new();
    collect_visible_text(document.root_element(), &mut raw);
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    Ok(RenderedPage { text, links })
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            match child_element.value().name() {
                "script" | "style" | "noscript" | "template" | "head" => {}
                _ => collect_visible_text(child_element, out),
            }
        }
    }
}
