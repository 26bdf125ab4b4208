//! Weak ETag tokens of the form `W/"<kind>-<n>"`.

use deckgen_core::CoreError;

/// Render a revision as an ETag.
pub fn format_etag(kind: &str, revision: u64) -> String {
    format!("W/\"{kind}-{revision}\"")
}

/// Parse an ETag back into its revision.
///
/// Malformed tokens and wrong kinds fail as revision mismatches: the
/// caller's view of the resource is not current either way.
pub fn parse_etag(kind: &str, value: &str) -> Result<u64, CoreError> {
    let prefix = format!("W/\"{kind}-");
    let inner = value
        .strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| CoreError::RevisionMismatch(format!("malformed ETag '{value}'")))?;
    inner
        .parse::<u64>()
        .map_err(|_| CoreError::RevisionMismatch(format!("malformed ETag '{value}'")))
}
