//! Bidirectional mapping between [`QueryState`] and a URL query string.
//!
//! Encoding is canonical: keys follow a fixed order, blank filters are
//! omitted and `page`, `size`, `sort` and `order` are always written, so a
//! shared link diffs cleanly against the one it was copied from. Decoding
//! never fails; malformed values fall back to the listing defaults.

use std::str::FromStr;

use url::form_urlencoded;

use crate::query::{
    DEFAULT_PAGE_SIZE, FilterKey, FilterSet, PageSpec, QueryState, SortDirection, SortField,
    SortSpec, is_allowed_page_size,
};

const PAGE_KEY: &str = "page";
const SIZE_KEY: &str = "size";
const SORT_KEY: &str = "sort";
const ORDER_KEY: &str = "order";

/// Per-listing fallbacks applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    /// Sort used when the query names none (or a field the listing cannot sort by).
    pub sort: SortSpec,
    /// Page size used when the query names none (or a disallowed one).
    pub page_size: usize,
    /// Fields this listing can be ordered by.
    pub sortable_fields: &'static [SortField],
}

impl QueryDefaults {
    /// Defaults for the users listing.
    #[must_use]
    pub fn users() -> Self {
        Self {
            sort: SortSpec::new(SortField::Name, SortDirection::Asc),
            page_size: DEFAULT_PAGE_SIZE,
            sortable_fields: &[SortField::Name, SortField::Email, SortField::CreatedAt],
        }
    }

    /// Defaults for the audit log listing.
    #[must_use]
    pub fn audit() -> Self {
        Self {
            sort: SortSpec::new(SortField::OccurredAt, SortDirection::Desc),
            page_size: DEFAULT_PAGE_SIZE,
            sortable_fields: &[SortField::OccurredAt],
        }
    }

    /// Returns whether the listing can be ordered by `field`.
    #[must_use]
    pub fn is_sortable(&self, field: SortField) -> bool {
        self.sortable_fields.contains(&field)
    }

    /// Returns the state of a freshly opened listing.
    #[must_use]
    pub fn initial_state(&self) -> QueryState {
        QueryState::new(self.sort, self.first_page())
    }

    fn first_page(&self) -> PageSpec {
        PageSpec::new(0, self.page_size).unwrap_or_default()
    }
}

/// Stateless encoder/decoder configured with one listing's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStateCodec {
    defaults: QueryDefaults,
}

impl QueryStateCodec {
    /// Creates a codec for a listing.
    #[must_use]
    pub fn new(defaults: QueryDefaults) -> Self {
        Self { defaults }
    }

    /// Returns the listing defaults.
    #[must_use]
    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Produces the canonical query string for `state`, without a leading `?`.
    #[must_use]
    pub fn encode(&self, state: &QueryState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut append_filter = |key: FilterKey| {
            if let Some(value) = state.filters.get(key) {
                let text = value.to_string();
                if !text.trim().is_empty() {
                    serializer.append_pair(key.as_str(), text.as_str());
                }
            }
        };

        append_filter(FilterKey::EntityType);
        append_filter(FilterKey::EntityId);
        append_filter(FilterKey::Action);
        append_filter(FilterKey::ActorUserId);
        append_filter(FilterKey::From);
        append_filter(FilterKey::To);

        serializer.append_pair(PAGE_KEY, state.page.index().to_string().as_str());
        serializer.append_pair(SIZE_KEY, state.page.size().to_string().as_str());

        if let Some(status) = state.filters.get(FilterKey::Status) {
            serializer.append_pair(FilterKey::Status.as_str(), status.to_string().as_str());
        }

        serializer.append_pair(SORT_KEY, state.sort.field.as_str());
        serializer.append_pair(ORDER_KEY, state.sort.direction.as_str());

        serializer.finish()
    }

    /// Parses a query string, with or without a leading `?`.
    ///
    /// Unknown keys are ignored and the last occurrence of a key wins.
    #[must_use]
    pub fn decode(&self, query: &str) -> QueryState {
        let query = query.trim().trim_start_matches('?');

        let mut filters = FilterSet::new();
        let mut page_index: Option<usize> = None;
        let mut page_size: Option<usize> = None;
        let mut sort_field: Option<SortField> = None;
        let mut sort_direction: Option<SortDirection> = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_KEY => page_index = value.trim().parse::<usize>().ok(),
                SIZE_KEY => {
                    page_size = value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|size| is_allowed_page_size(*size));
                }
                SORT_KEY => {
                    sort_field = SortField::from_str(value.trim())
                        .ok()
                        .filter(|field| self.defaults.is_sortable(*field));
                }
                ORDER_KEY => sort_direction = SortDirection::from_str(value.trim()).ok(),
                other => {
                    let Ok(filter_key) = FilterKey::from_str(other) else {
                        continue;
                    };
                    if filters.set(filter_key, value.as_ref()).is_err() {
                        filters.remove(filter_key);
                    }
                }
            }
        }

        let field = sort_field.unwrap_or(self.defaults.sort.field);
        let direction = sort_direction.unwrap_or(if field == self.defaults.sort.field {
            self.defaults.sort.direction
        } else {
            SortDirection::Asc
        });

        let page = PageSpec::new(
            page_index.unwrap_or(0),
            page_size.unwrap_or(self.defaults.page_size),
        )
        .unwrap_or_else(|_| self.defaults.first_page());

        QueryState {
            filters,
            sort: SortSpec::new(field, direction),
            page,
        }
    }

    /// Brings a state in line with what [`QueryStateCodec::decode`] would produce.
    #[must_use]
    pub fn normalize(&self, state: &QueryState) -> QueryState {
        self.decode(self.encode(state).as_str())
    }
}
