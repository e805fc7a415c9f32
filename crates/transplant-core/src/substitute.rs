/// Result of replacing one token across an in-memory buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub buffer: Vec<u8>,
    pub replaced: usize,
}

/// Replaces every occurrence of `token` that stands as a whole path, so
/// `/etc/puppet` matches `"/etc/puppet"` and `/etc/puppet/ssl` but not
/// `/etc/puppetlabs`, `/etc/puppet-old` or `/usr/etc/puppet`.
#[must_use]
pub fn replace_token(haystack: &[u8], token: &str, replacement: &str) -> Substitution {
    let token = token.as_bytes();
    if token.is_empty() {
        return Substitution {
            buffer: haystack.to_vec(),
            replaced: 0,
        };
    }

    let mut buffer = Vec::with_capacity(haystack.len());
    let mut replaced = 0;
    let mut i = 0;

    while i < haystack.len() {
        let rest = haystack.get(i..).unwrap_or_default();
        let starts_segment = i == 0 || is_boundary(haystack.get(i - 1));
        if starts_segment && rest.starts_with(token) && is_boundary(haystack.get(i + token.len())) {
            buffer.extend_from_slice(replacement.as_bytes());
            replaced += 1;
            i += token.len();
        } else {
            if let Some(byte) = haystack.get(i) {
                buffer.push(*byte);
            }
            i += 1;
        }
    }

    Substitution { buffer, replaced }
}

/// Bytes that may continue a path component end the match when absent.
fn is_boundary(byte: Option<&u8>) -> bool {
    byte.is_none_or(|b| !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')))
}
