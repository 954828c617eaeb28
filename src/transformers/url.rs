use reqwest::Url;

const TRACKING_PARAMS: [&str; 6] = ["fbclid", "gclid", "mc_cid", "mc_eid", "ref", "igshid"];

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

/// Canonical key for a page url.
///
/// Two urls with the same key are treated as the same page: scheme is folded
/// to https, `www.` and the fragment are dropped, tracking parameters are
/// removed and a trailing slash is ignored. Input that is not an absolute
/// http(s) url (e.g. a manual query) is only trimmed and lowercased.
pub fn canonicalize(raw: &str) -> String {
    let raw = raw.trim();
    let mut url = match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => return raw.to_lowercase(),
    };

    // Kept pairs are re-encoded so escaped separators stay distinct.
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&kept);
    }

    let host = match url.host_str() {
        Some(host) => host.strip_prefix("www.").unwrap_or(host).to_lowercase(),
        None => return raw.to_lowercase(),
    };

    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();

    let path = url.path().trim_end_matches('/');

    match url.query() {
        Some(query) => format!("https://{host}{port}{path}?{query}"),
        None => format!("https://{host}{port}{path}"),
    }
}

pub fn is_http(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// Resolves `href` against `base`, returning `None` for non-http targets.
pub fn join(base: &str, href: &str) -> Option<String> {
    let joined = Url::parse(base).ok()?.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}
