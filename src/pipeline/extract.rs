//! Page image discovery: every `<img src>` in a page, in document order.
//!
//! Parsing goes through `scraper` (html5ever underneath), which applies the
//! browser error-recovery rules: unclosed tags, stray `</div>`s and other
//! broken markup never fail, they just produce whatever tree a browser
//! would build.

use crate::pipeline::resolve::resolve_image_src;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::debug;

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("`img` is a valid selector"));

/// One discovered image reference, before any fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateImageRef {
    /// Position among the resolved candidates, 0-based.
    pub index: usize,
    /// The `src` attribute exactly as written in the markup.
    pub raw_src: String,
    /// Absolute URL produced by [`resolve_image_src`].
    pub resolved_url: String,
}

/// A parsed page that can enumerate its image sources.
pub struct PageImages {
    document: Html,
}

impl PageImages {
    /// Parse page markup. Never fails.
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    /// Raw `src` values of all `<img>` elements, in document order,
    /// duplicates included. Elements without `src` are not yielded.
    ///
    /// The iterator is lazy; call again to start over.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.document
            .select(&IMG_SELECTOR)
            .filter_map(|el| el.value().attr("src"))
    }
}

/// Extract and resolve the candidates of one page.
///
/// Sources that resolve to nothing (empty `src`) are dropped; the remaining
/// candidates are numbered consecutively.
pub fn discover_candidates(markup: &str, base: &Url) -> Vec<CandidateImageRef> {
    let page = PageImages::parse(markup);
    let candidates: Vec<CandidateImageRef> = page
        .sources()
        .filter_map(|raw| resolve_image_src(raw, base).map(|url| (raw, url)))
        .enumerate()
        .map(|(index, (raw, resolved_url))| CandidateImageRef {
            index,
            raw_src: raw.to_string(),
            resolved_url,
        })
        .collect();

    debug!("Discovered {} image candidates on {}", candidates.len(), base);
    candidates
}
