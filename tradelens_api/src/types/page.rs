use serde::{Deserialize, Serialize};

/// Wire envelope returned by the query endpoints.
///
/// Every field is optional on the wire; [`PageResult::from_envelope`]
/// applies the defaults (`[]`, `0`, `1`). Extra fields such as `page` or
/// `execution_time_ms` are ignored.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageEnvelope<T> {
    #[serde(default)]
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub total_records: Option<i64>,
    #[serde(default)]
    pub total_pages: Option<i64>,
}

/// One page of query results.
///
/// Invariants: `total_pages >= 1`, and an empty `rows` always carries
/// `total_records == 0`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub total_records: u64,
    pub total_pages: u64,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PageResult<T> {
    /// The result every failure degrades to.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total_records: 0,
            total_pages: 1,
        }
    }

    /// Applies envelope defaults and truncates to `page_size` rows.
    pub fn from_envelope(envelope: PageEnvelope<T>, page_size: usize) -> Self {
        let mut rows = envelope.data.unwrap_or_default();
        rows.truncate(page_size.max(1));
        if rows.is_empty() {
            return Self::empty();
        }
        let total_records = envelope
            .total_records
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);
        let total_pages = envelope
            .total_pages
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(1)
            .max(1);
        Self {
            rows,
            total_records,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
