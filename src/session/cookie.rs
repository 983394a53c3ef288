use crate::qendercore::REFRESH_COOKIE;

/// Extract the rotating refresh token from a `Set-Cookie` header value
///
/// The value is treated as a list of `name=value` pairs separated by `;`
/// (cookie attributes) or `,` (several cookies folded into one header).
/// The first `rtok` pair wins; an empty value counts as absent. Segments
/// without `=`, such as the tail of an `Expires` date, are skipped.
pub fn extract_refresh_token(header: &str) -> Option<String> {
    header
        .split([',', ';'])
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == REFRESH_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
