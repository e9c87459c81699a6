//! Turn a raw `<img src>` value into an absolute, fetchable URL.
//!
//! This is a deliberately simple join, not RFC 3986 reference resolution:
//! a relative source is always attached to the *origin* of the page
//! (`scheme://host[:port]`). The page's own path and query are ignored, so
//! `photo.jpg` on `https://example.com/blog/post` resolves to
//! `https://example.com/photo.jpg` and not `.../blog/photo.jpg`. Dot
//! segments and protocol-relative `//cdn/...` sources are not interpreted.

use reqwest::Url;

/// Check if the source already carries an absolute HTTP(S) scheme.
pub fn is_absolute_http(src: &str) -> bool {
    let bytes = src.as_bytes();
    let has_prefix = |prefix: &str| {
        bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    };
    has_prefix("http://") || has_prefix("https://")
}

/// The `scheme://host[:port]` part of `base`, or `None` if it has no host.
pub fn origin_of(base: &Url) -> Option<String> {
    let host = base.host_str()?;
    Some(match base.port() {
        Some(port) => format!("{}://{}:{}", base.scheme(), host, port),
        None => format!("{}://{}", base.scheme(), host),
    })
}

/// Resolve `raw_src` against the page URL.
///
/// Returns `None` for an empty source (the candidate is dropped) or when a
/// relative source meets a base without a host.
pub fn resolve_image_src(raw_src: &str, base: &Url) -> Option<String> {
    let src = raw_src.trim();
    if src.is_empty() {
        return None;
    }
    if is_absolute_http(src) {
        return Some(src.to_string());
    }

    let origin = origin_of(base)?;
    if src.starts_with('/') {
        Some(format!("{origin}{src}"))
    } else {
        Some(format!("{origin}/{src}"))
    }
}
