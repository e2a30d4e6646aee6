use std::borrow::Cow;

use url::{ParseError, Url};

/// Where to send a denied interactive request: back to the referrer when it
/// stays on the requesting host, otherwise `fallback`. Absolute referrers are
/// returned in their parsed, normalized form.
pub(crate) fn safe_location<'a>(
    referrer: Option<&'a str>,
    host: Option<&str>,
    fallback: &'a str,
) -> Cow<'a, str> {
    let Some(referrer) = referrer.map(str::trim).filter(|r| !r.is_empty()) else {
        return Cow::Borrowed(fallback);
    };

    match Url::parse(referrer) {
        Ok(url) if same_host(&url, host) => Cow::Owned(url.into()),
        Ok(_) => Cow::Borrowed(fallback),
        Err(ParseError::RelativeUrlWithoutBase) if is_local_path(referrer) => Cow::Borrowed(referrer),
        Err(_) => Cow::Borrowed(fallback),
    }
}

fn same_host(url: &Url, host: Option<&str>) -> bool {
    let (Some(expected), Some(actual)) = (host, url.host_str()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let authority = match url.port() {
        Some(port) => format!("{actual}:{port}"),
        None => actual.to_owned(),
    };
    authority.eq_ignore_ascii_case(expected)
}

// `//evil.example` and `/\evil.example` are treated as host-relative by browsers.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control)
}
