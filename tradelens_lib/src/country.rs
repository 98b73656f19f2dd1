//! Country selections and their resolution to backend country codes.
//!
//! A country can be selected three ways: a sentinel token standing for "all
//! countries" or "the world aggregate", a bare display name (older saved
//! queries), or a name/code pair picked from the suggestion list. All three
//! resolve through [`CountryCodeResolver::resolve`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tradelens_api::types::{field_text, Row};
use tradelens_api::{Client, NormalizedQueryParams};

use crate::dataset::{CountryMapping, DatasetConfig};

/// Non-geographic country tokens. Sent to the backend verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// No country restriction.
    Everywhere,
    /// The backend's world aggregate.
    World,
}

impl Sentinel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::Everywhere => "everywhere",
            Sentinel::World => "world",
        }
    }

    /// Case-insensitive match on the token text.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("everywhere") {
            Some(Sentinel::Everywhere)
        } else if token.eq_ignore_ascii_case("world") {
            Some(Sentinel::World)
        } else {
            None
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A country selection in any of its accepted forms.
///
/// Deserializes from a JSON string (sentinel or display name) or from an
/// object with `name` and `code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "WireCountryRef", into = "WireCountryRef")]
pub enum CountryRef {
    Sentinel(Sentinel),
    Name(String),
    Coded { name: String, code: String },
}

impl CountryRef {
    /// Interprets free text: sentinel tokens become [`CountryRef::Sentinel`],
    /// anything else is a display name.
    pub fn parse(text: &str) -> Self {
        match Sentinel::parse(text) {
            Some(sentinel) => CountryRef::Sentinel(sentinel),
            None => CountryRef::Name(text.to_string()),
        }
    }

    pub fn coded(name: &str, code: &str) -> Self {
        CountryRef::Coded {
            name: name.to_string(),
            code: code.to_string(),
        }
    }

    /// Builds a coded reference from a country suggestion record.
    pub fn from_record(record: &Row, mapping: &CountryMapping) -> Self {
        CountryRef::coded(
            &field_text(record, &mapping.name_field),
            &field_text(record, &mapping.code_field),
        )
    }

    /// Text shown to the user.
    pub fn display_name(&self) -> &str {
        match self {
            CountryRef::Sentinel(sentinel) => sentinel.as_str(),
            CountryRef::Name(name) => name,
            CountryRef::Coded { name, .. } => name,
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum WireCountryRef {
    Text(String),
    Coded { name: String, code: String },
}

impl From<WireCountryRef> for CountryRef {
    fn from(wire: WireCountryRef) -> Self {
        match wire {
            WireCountryRef::Text(text) => CountryRef::parse(&text),
            WireCountryRef::Coded { name, code } => CountryRef::Coded { name, code },
        }
    }
}

impl From<CountryRef> for WireCountryRef {
    fn from(country: CountryRef) -> Self {
        match country {
            CountryRef::Sentinel(sentinel) => WireCountryRef::Text(sentinel.as_str().to_string()),
            CountryRef::Name(name) => WireCountryRef::Text(name),
            CountryRef::Coded { name, code } => WireCountryRef::Coded { name, code },
        }
    }
}

/// Name-to-code table for one dataset's country universe.
///
/// Built once per dataset selection and never mutated; share it behind an
/// `Arc` and build a new one when the dataset changes.
#[derive(Debug, Clone, Default)]
pub struct CountryCodeResolver {
    dataset_id: String,
    codes: HashMap<String, String>,
}

impl CountryCodeResolver {
    /// Builds the table from already-fetched country records. Records missing
    /// either the name or the code field are skipped.
    pub fn from_records(dataset_id: &str, mapping: &CountryMapping, records: &[Row]) -> Self {
        let mut codes = HashMap::new();
        for record in records {
            let name = field_text(record, &mapping.name_field);
            let code = field_text(record, &mapping.code_field);
            if name.is_empty() || code.is_empty() {
                continue;
            }
            codes.insert(name, code);
        }
        Self {
            dataset_id: dataset_id.to_string(),
            codes,
        }
    }

    /// Fetches the dataset's full country list and builds the table.
    ///
    /// Never fails: if the dataset has no country mapping or the fetch fails,
    /// the table is empty and every name resolves to itself.
    pub async fn build(client: &Client, config: &DatasetConfig) -> Self {
        let empty = Self {
            dataset_id: config.id.clone(),
            codes: HashMap::new(),
        };
        let Some(mapping) = config.country.as_ref() else {
            return empty;
        };

        let mut params = NormalizedQueryParams::new();
        params.set(&mapping.limit_param, mapping.lookup_limit.to_string());
        let url = match client.get_url(&config.endpoints.countries, Some(&params)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Failed to load country code map for {}: {}", config.id, e);
                return empty;
            }
        };

        match client.get_records(url).await {
            Ok(records) => {
                let resolver = Self::from_records(&config.id, mapping, &records);
                tracing::info!(
                    "Loaded {} country codes for {}",
                    resolver.len(),
                    config.id
                );
                resolver
            }
            Err(e) => {
                tracing::warn!("Failed to load country code map for {}: {}", config.id, e);
                empty
            }
        }
    }

    /// Resolves a selection to the code the backend expects.
    ///
    /// Unknown names come back unchanged; the backend rejects or ignores them.
    /// Names and codes spelling a sentinel in any case resolve to the
    /// lowercase sentinel token.
    pub fn resolve(&self, country: &CountryRef) -> String {
        match country {
            CountryRef::Sentinel(sentinel) => sentinel.as_str().to_string(),
            CountryRef::Coded { code, .. } => match Sentinel::parse(code) {
                Some(sentinel) => sentinel.as_str().to_string(),
                None => code.clone(),
            },
            CountryRef::Name(name) => match Sentinel::parse(name) {
                Some(sentinel) => sentinel.as_str().to_string(),
                None => self.lookup(name),
            },
        }
    }

    fn lookup(&self, name: &str) -> String {
        match self.codes.get(name) {
            Some(code) => code.clone(),
            None => {
                tracing::debug!(
                    "No country code for {:?} in {}, passing name through",
                    name,
                    self.dataset_id
                );
                name.to_string()
            }
        }
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
