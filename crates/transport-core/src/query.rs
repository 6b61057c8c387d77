//! Query Engine: filtered, sorted, paginated views over the record set.
//!
//! [`derive_view`] is pure. Given the same records and query it always
//! yields the same view.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use transport_gateway::{Record, TransportType};

/// Page size of the list view.
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Column a view is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Capacity,
    Type,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Capacity => "capacity",
            SortKey::Type => "type",
        }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Capacity => a.capacity.total_cmp(&b.capacity),
            SortKey::Type => a.kind.label().cmp(b.kind.label()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "capacity" => Ok(SortKey::Capacity),
            "type" => Ok(SortKey::Type),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Filter, sort and pagination parameters of the list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Case-insensitive substring of the record name; empty matches all
    pub text_filter: String,
    pub type_filter: Option<TransportType>,
    pub sort_key: SortKey,
    pub sort_ascending: bool,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            text_filter: String::new(),
            type_filter: None,
            sort_key: SortKey::Name,
            sort_ascending: true,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Query {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_filter = text.into();
        self
    }

    pub fn of_type(mut self, kind: Option<TransportType>) -> Self {
        self.type_filter = kind;
        self
    }

    pub fn sorted_by(mut self, key: SortKey, ascending: bool) -> Self {
        self.sort_key = key;
        self.sort_ascending = ascending;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Whether a record passes both filters.
    pub fn matches(&self, record: &Record) -> bool {
        let name_ok = self.text_filter.is_empty()
            || record
                .name
                .to_lowercase()
                .contains(&self.text_filter.to_lowercase());
        let type_ok = self.type_filter.map_or(true, |kind| record.kind == kind);
        name_ok && type_ok
    }
}

/// One page of the derived list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub items: Vec<Record>,
    /// Effective page after clamping
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Records matching the filters, across all pages
    pub total_matches: usize,
}

impl View {
    pub fn empty(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            total_pages: 0,
            total_matches: 0,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Derive the visible page from `records` for `query`.
///
/// Filtering keeps records matching both the text and the type filter. The
/// sort is stable, so records with equal keys keep their relative order in
/// either direction. `query.page` is clamped into `[1, max(1, total_pages)]`.
pub fn derive_view(records: &[Record], query: &Query) -> View {
    let page_size = query.page_size.max(1);

    let mut matching: Vec<&Record> = records.iter().filter(|r| query.matches(r)).collect();
    matching.sort_by(|a, b| {
        let ord = query.sort_key.compare(a, b);
        if query.sort_ascending {
            ord
        } else {
            ord.reverse()
        }
    });

    let total_matches = matching.len();
    let total_pages = total_matches.div_ceil(page_size);
    let page = query.page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * page_size).min(total_matches);
    let end = (start + page_size).min(total_matches);
    let items = matching[start..end].iter().map(|r| (*r).clone()).collect();

    View {
        items,
        page,
        page_size,
        total_pages,
        total_matches,
    }
}
