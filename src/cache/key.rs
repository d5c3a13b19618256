//! Cache Key Module
//!
//! Deterministic key derivation for cached requests.

/// Separates the namespace prefix from the identifier.
pub const PREFIX_SEPARATOR: char = ':';

const FIELD_SEPARATOR: char = '|';
const NAME_SEPARATOR: char = '=';
const ESCAPE: char = '\\';

// == Generate Cache Key ==
/// Builds a cache key from a namespace prefix and an identifier.
///
/// Pure and deterministic. Separators inside `prefix` are escaped, so two
/// different `(prefix, identifier)` pairs never produce the same key.
///
/// ```
/// use rehearsal_cache::generate_cache_key;
///
/// assert_eq!(generate_cache_key("upload", "script-17"), "upload:script-17");
/// ```
pub fn generate_cache_key(prefix: &str, identifier: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + identifier.len() + 1);
    push_escaped(&mut key, prefix, &[PREFIX_SEPARATOR]);
    key.push(PREFIX_SEPARATOR);
    key.push_str(identifier);
    key
}

// == Request Fingerprint ==
/// Composes several request fields into one identifier.
///
/// Used when a request's identity spans more than one value, e.g. a speech
/// synthesis call keyed by text, voice, emotion and intensity. Field order is
/// significant and names are part of the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFingerprint {
    encoded: String,
}

impl RequestFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named field.
    pub fn field(mut self, name: &str, value: impl ToString) -> Self {
        if !self.encoded.is_empty() {
            self.encoded.push(FIELD_SEPARATOR);
        }
        let specials = [FIELD_SEPARATOR, NAME_SEPARATOR];
        push_escaped(&mut self.encoded, name, &specials);
        self.encoded.push(NAME_SEPARATOR);
        push_escaped(&mut self.encoded, &value.to_string(), &specials);
        self
    }

    /// The composed identifier, without a prefix.
    pub fn identifier(&self) -> &str {
        &self.encoded
    }

    /// Finishes into a full cache key under `prefix`.
    pub fn into_key(self, prefix: &str) -> String {
        generate_cache_key(prefix, &self.encoded)
    }
}

fn push_escaped(out: &mut String, raw: &str, specials: &[char]) {
    for ch in raw.chars() {
        if ch == ESCAPE || specials.contains(&ch) {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}
