use axum::http::HeaderMap;

/// Edge-provided client address header, trusted when present.
pub const TRUSTED_CLIENT_HEADER: &str = "cf-connecting-ip";

/// Standard forwarded-for header; only the first (client-most) entry is used.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Sentinel identity when no address headers are present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve a best-effort client identity from request headers.
///
/// Prefers the trusted edge header, then the first comma-separated entry of
/// the forwarded-for header, then the `"unknown"` sentinel. The value is
/// opaque: no address-format validation, any non-empty string is accepted
/// as-is. Identities are not guaranteed unique per physical client
/// (proxies, NAT).
pub fn resolve_client(headers: &HeaderMap) -> String {
    if let Some(ip) = header_str(headers, TRUSTED_CLIENT_HEADER) {
        if !ip.is_empty() {
            return ip.to_string();
        }
    }

    if let Some(forwarded) = header_str(headers, FORWARDED_FOR_HEADER) {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    UNKNOWN_CLIENT.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
