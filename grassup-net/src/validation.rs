// grassup-net/src/validation.rs
use grassup_common::error::{GrassupError, Result};
use url::{Host, Url};

/// Validates a download URL. HTTPS is required, except for plain HTTP to a
/// loopback host (local mirrors).
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| GrassupError::Generic(format!("Failed to parse URL '{url_str}': {e}")))?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        other => Err(GrassupError::Config(format!(
            "Invalid URL scheme for '{url_str}': Must be https, but got '{other}'"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(d)) => d.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
