//! Landing view detection
//!
//! The first-paint overlay is always shown on the app's landing views, even
//! when the session has already loaded a page. Paths are compared after
//! stripping query and fragment and normalizing slashes, so `/`, `//`,
//! `/?tab=1` and `/#top` all name the same view.

/// Strip query and fragment from a URL path
#[inline]
fn strip_query_frag(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'?' || b == b'#' {
            return &s[..i];
        }
    }
    s
}

/// Normalize a path: no query/fragment, collapsed slashes, no trailing slash
/// (except the root itself), lowercased
pub fn normalize_path(raw: &str) -> String {
    let path = strip_query_frag(raw.trim());
    let segments: Vec<&str> = path.split('/').filter(|seg| !seg.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len());
    for seg in segments {
        out.push('/');
        out.push_str(&seg.to_ascii_lowercase());
    }
    out
}

/// Is `path` one of the configured landing views?
pub fn is_landing(path: &str, landing_paths: &[String]) -> bool {
    let path = normalize_path(path);
    landing_paths.iter().any(|p| normalize_path(p) == path)
}
