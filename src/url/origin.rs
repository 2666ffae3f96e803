use url::Url;

/// Returns the origin (`scheme://host[:port]`) of a URL as a string
///
/// Default ports are omitted, so `https://example.com:443/` and
/// `https://example.com/` share the origin `https://example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_sage::url::origin_of;
///
/// let url = Url::parse("https://example.com/path?q=1").unwrap();
/// assert_eq!(origin_of(&url), "https://example.com");
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(origin_of(&url), "http://127.0.0.1:8080");
/// ```
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Checks whether two URLs share scheme, host and port
///
/// Only links for which this returns `true` against the seed are ever
/// fetched during a crawl.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str().map(str::to_lowercase) == b.host_str().map(str::to_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}
