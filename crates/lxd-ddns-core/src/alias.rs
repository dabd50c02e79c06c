//! Alias naming and the TXT marker that records it
//!
//! Container names with underscores are not valid hostnames, so each such
//! name also gets a hyphenated CNAME. The zone itself remembers that alias
//! through a TXT record of the form `lxdDDNS-alias:<alias>:` stored at the
//! canonical name, which is read back when the container is removed.

/// Prefix of the alias marker TXT value
pub const MARKER_PREFIX: &str = "lxdDDNS-alias:";

/// Hyphenated alternate name for a container name containing underscores
pub fn alternate_name(name: &str) -> Option<String> {
    if name.contains('_') {
        Some(name.replace('_', "-"))
    } else {
        None
    }
}

/// TXT value recording `alias`
pub fn marker(alias: &str) -> String {
    format!("{MARKER_PREFIX}{alias}:")
}

/// Extract the alias name from a TXT value
///
/// The marker may appear anywhere in the text (resolvers may hand back the
/// value quoted). The first occurrence followed by a non-empty name and a
/// closing `:` wins.
pub fn parse_marker(txt: &str) -> Option<&str> {
    let mut rest = txt;
    while let Some(start) = rest.find(MARKER_PREFIX) {
        let candidate = &rest[start + MARKER_PREFIX.len()..];
        if let Some(end) = candidate.find(':') {
            if end > 0 {
                return Some(&candidate[..end]);
            }
        } else {
            return None;
        }
        rest = candidate;
    }
    None
}

/// Whether `alias` is a single label safe to put in an update directive
///
/// Only ASCII letters, digits, `-` and `_` are accepted, at most 63 bytes.
pub fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && alias.len() <= 63
        && alias
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
