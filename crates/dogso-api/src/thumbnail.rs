use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, warn};

/// Page URL -> preview image URL. Implementations never fail: any problem
/// is reported as "no thumbnail".
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    async fn lookup(&self, page_url: &str) -> Option<String>;
}

/// Preview tags live in `<head>`; nothing past this many bytes of a page is read.
const MAX_PAGE_BYTES: usize = 512 * 1024;

/// Fetches the page and reads its Open Graph / Twitter card / image_src tags.
pub struct HttpThumbnails {
    client: reqwest::Client,
}

impl HttpThumbnails {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dogso-thumbnailer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, page_url: &str) -> anyhow::Result<Option<String>> {
        let mut response = self.client.get(page_url).send().await?.error_for_status()?;
        let base = response.url().clone();

        let mut page = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            page.extend_from_slice(&chunk);
            if page.len() >= MAX_PAGE_BYTES {
                page.truncate(MAX_PAGE_BYTES);
                break;
            }
        }

        let html = String::from_utf8_lossy(&page);
        Ok(extract_thumbnail(&html).map(|candidate| resolve(&base, &candidate)))
    }
}

#[async_trait]
impl ThumbnailSource for HttpThumbnails {
    async fn lookup(&self, page_url: &str) -> Option<String> {
        match self.fetch(page_url).await {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                debug!("No preview image found at {}", page_url);
                None
            }
            Err(e) => {
                warn!("Thumbnail lookup for {} failed: {}", page_url, e);
                None
            }
        }
    }
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(meta|link)\b([^>]*)>").expect("valid tag regex"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("valid attr regex")
});

/// Pick the preview image out of an HTML document.
///
/// Preference order: `og:image`, then `twitter:image`, then
/// `<link rel="image_src">`, regardless of where each appears in the page.
pub fn extract_thumbnail(html: &str) -> Option<String> {
    let mut found: [Option<String>; 3] = [None, None, None];

    for tag in TAG_RE.captures_iter(html) {
        let name = tag[1].to_ascii_lowercase();
        let attrs = parse_attrs(&tag[2]);
        let attr = |key: &str| attrs.get(key).map(String::as_str);

        let slot = if name == "meta" {
            let key = attr("property").or_else(|| attr("name")).map(str::to_ascii_lowercase);
            match key.as_deref() {
                Some("og:image") => Some((0, attr("content"))),
                Some("twitter:image") => Some((1, attr("content"))),
                _ => None,
            }
        } else {
            let is_image_src = attr("rel")
                .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("image_src")))
                .unwrap_or(false);
            is_image_src.then(|| (2, attr("href")))
        };

        if let Some((rank, Some(value))) = slot {
            let value = value.trim();
            if found[rank].is_none() && !value.is_empty() {
                found[rank] = Some(value.replace("&amp;", "&"));
            }
        }
    }

    found.into_iter().flatten().next()
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (c[1].to_ascii_lowercase(), value)
        })
        .collect()
}

/// Relative image paths are resolved against the page that served them.
fn resolve(base: &Url, candidate: &str) -> String {
    base.join(candidate)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| candidate.to_string())
}
