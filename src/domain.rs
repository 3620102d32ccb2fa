use url::Url;

/// Returns the host of a URL-like string, without any port.
///
/// Protocol-relative input (`//host/path`) is given an `http:` scheme before
/// parsing. Anything that does not parse, or parses without a host, yields an
/// empty string.
///
/// The host is returned as written in the input. `Url` only decides whether the
/// string is a URL with a host; its normalized host (lowercased, punycode,
/// canonical IPv4) is never used.
pub fn extract_domain(raw: &str) -> String {
    let candidate = if raw.starts_with("//") {
        format!("http:{}", raw)
    } else {
        raw.to_string()
    };

    match Url::parse(&candidate) {
        Ok(parsed) if parsed.has_host() => raw_host(&candidate).unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

/// Host text between `scheme://` and the path, minus userinfo and port.
fn raw_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    // IPv6 literal keeps its brackets
    if host_port.starts_with('[') {
        return host_port.find(']').map(|end| &host_port[..=end]);
    }

    match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => Some(host),
        _ => Some(host_port),
    }
}
