//! Canonical backend parameters produced by query normalization.

use serde::Serialize;
use url::Url;

use super::common::Query;

/// Flat, ordered mapping of backend parameter name to string value.
///
/// Insertion order is kept so URLs built from equal parameter sets are
/// byte-identical. Setting an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedQueryParams {
    pairs: Vec<(String, String)>,
}

impl NormalizedQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value for that key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Query for NormalizedQueryParams {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        for (key, value) in self.pairs.iter() {
            url.query_pairs_mut().append_pair(key, value);
        }
        url
    }
}

impl<K, V> FromIterator<(K, V)> for NormalizedQueryParams
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = NormalizedQueryParams::new();
        for (key, value) in iter {
            params.set(key.as_ref(), value);
        }
        params
    }
}
