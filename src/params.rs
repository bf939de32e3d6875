//! Raw query parameter bag: parsing and serialization.
//!
//! [`QueryParams`] is the multi-valued `key -> [value]` map extracted from
//! a URL query string (e.g. `?tag=a&tag=b&page=1`). Two ordering
//! guarantees hold and the codec depends on both:
//!
//! - key order is the insertion order of each key's *first* appearance;
//! - value order within a key is occurrence order.
//!
//! Invariant: no key ever maps to an empty value list.
//!
//! # Example
//!
//! ```
//! use query_state::QueryParams;
//!
//! let query = QueryParams::from_query_string("page=1&tag=rust&tag=web");
//! assert_eq!(query.get("page"), Some("1"));
//! assert_eq!(query.get_all("tag"), Some(&["rust".to_string(), "web".to_string()][..]));
//! assert_eq!(query.to_query_string(), "page=1&tag=rust&tag=web");
//! ```

/// Ordered multi-valued query parameters parsed from a URL query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a query string (without the leading `?`).
    ///
    /// Pairs without an `=` are ignored; duplicate keys accumulate values
    /// in occurrence order.
    ///
    /// # Example
    ///
    /// ```
    /// use query_state::QueryParams;
    ///
    /// let query = QueryParams::from_query_string("page=1&sort=name");
    /// assert_eq!(query.get("page"), Some("1"));
    /// ```
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::new();

        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                let key = decode_uri_component(key);
                let value = decode_uri_component(value);
                params.append(&key, value);
            }
        }

        params
    }

    /// Get the first value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key)?.first().map(String::as_str)
    }

    /// Get all values for a key, in occurrence order.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Append a value for the given key.
    ///
    /// A new key is added after all existing keys; an existing key keeps
    /// its position and the value is added to its list.
    pub fn append(&mut self, key: &str, value: impl Into<String>) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            values.push(value.into());
        } else {
            self.entries.push((key.to_string(), vec![value.into()]));
        }
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate over `(key, values)` pairs in key insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Serialize back into a query string (without a leading `?`).
    ///
    /// Keys are emitted in insertion order, each value as its own
    /// `key=value` pair, percent-encoded.
    ///
    /// # Example
    ///
    /// ```
    /// use query_state::QueryParams;
    ///
    /// let mut query = QueryParams::new();
    /// query.append("tag", "a");
    /// query.append("tag", "b");
    /// query.append("page", "1");
    /// assert_eq!(query.to_query_string(), "tag=a&tag=b&page=1");
    /// ```
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(key, values)| {
                values.iter().map(move |value| {
                    format!(
                        "{}={}",
                        encode_uri_component(key),
                        encode_uri_component(value)
                    )
                })
            })
            .collect();

        pairs.join("&")
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the number of unique parameter keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Simple URI component encoding (encode special characters)
fn encode_uri_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => result.push_str(&format!("%{byte:02X}")),
        }
    }
    result
}

/// Simple URI component decoding
fn decode_uri_component(s: &str) -> String {
    let mut result = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();

    while let Some(b) = bytes.next() {
        if b == b'%' {
            // Try to decode a hex pair
            let hex: String = bytes.by_ref().take(2).map(|b| b as char).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte);
                    continue;
                }
            }
            result.push(b'%');
            result.extend(hex.bytes());
        } else if b == b'+' {
            result.push(b' ');
        } else {
            result.push(b);
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

// ============================================================================
// Tests
// ============================================================================
