//! Filter, sort and pagination model shared by every listing.

use std::collections::BTreeMap;
use std::str::FromStr;

use opshub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Page sizes a listing may be viewed with.
pub const ALLOWED_PAGE_SIZES: &[usize] = &[10, 20, 50, 100];

/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Query-string key of one listing filter.
///
/// Variant order is the order keys appear in an encoded query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterKey {
    /// Audited entity type, e.g. `USER`.
    EntityType,
    /// Audited entity identifier.
    EntityId,
    /// Audit action identifier.
    Action,
    /// Acting user identifier.
    ActorUserId,
    /// Lower bound of the time range.
    From,
    /// Upper bound of the time range.
    To,
    /// User account status.
    Status,
}

impl FilterKey {
    /// Returns the query-string key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntityType => "entityType",
            Self::EntityId => "entityId",
            Self::Action => "action",
            Self::ActorUserId => "actorUserId",
            Self::From => "from",
            Self::To => "to",
            Self::Status => "status",
        }
    }

    /// Returns all filter keys in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FilterKey] = &[
            FilterKey::EntityType,
            FilterKey::EntityId,
            FilterKey::Action,
            FilterKey::ActorUserId,
            FilterKey::From,
            FilterKey::To,
            FilterKey::Status,
        ];

        ALL
    }

    /// Returns whether values for this key are integers.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::ActorUserId)
    }
}

impl FromStr for FilterKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown filter key '{value}'")))
    }
}

/// Value of one active filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterValue {
    /// Trimmed, non-empty text.
    Text(String),
    /// Base-10 integer.
    Number(i64),
}

impl FilterValue {
    /// Parses raw input for `key`.
    ///
    /// Returns `Ok(None)` for blank input, which means "no constraint".
    pub fn parse_for(key: FilterKey, raw: &str) -> AppResult<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if key.is_numeric() {
            return trimmed
                .parse::<i64>()
                .map(|value| Some(Self::Number(value)))
                .map_err(|_| {
                    AppError::Validation(format!(
                        "filter '{}' expects a whole number, got '{trimmed}'",
                        key.as_str()
                    ))
                });
        }

        Ok(Some(Self::Text(trimmed.to_owned())))
    }

    /// Returns the text value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Number(_) => None,
        }
    }

    /// Returns the numeric value, if any.
    #[must_use]
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => formatter.write_str(value),
            Self::Number(value) => write!(formatter, "{value}"),
        }
    }
}

/// Set of active search constraints for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    values: BTreeMap<FilterKey, FilterValue>,
}

impl FilterSet {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and merges raw input; blank input removes the key.
    pub fn set(&mut self, key: FilterKey, raw: &str) -> AppResult<()> {
        match FilterValue::parse_for(key, raw)? {
            Some(value) => {
                self.values.insert(key, value);
            }
            None => {
                self.values.remove(&key);
            }
        }

        Ok(())
    }

    /// Builder-style variant of [`FilterSet::set`].
    pub fn with(mut self, key: FilterKey, raw: &str) -> AppResult<Self> {
        self.set(key, raw)?;
        Ok(self)
    }

    /// Removes the constraint for `key`.
    pub fn remove(&mut self, key: FilterKey) {
        self.values.remove(&key);
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.values.get(&key)
    }

    /// Returns the text value for `key`.
    #[must_use]
    pub fn text(&self, key: FilterKey) -> Option<&str> {
        self.get(key).and_then(FilterValue::as_text)
    }

    /// Returns the numeric value for `key`.
    #[must_use]
    pub fn number(&self, key: FilterKey) -> Option<i64> {
        self.get(key).and_then(FilterValue::as_number)
    }

    /// Iterates active filters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    /// Returns whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of active filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Field a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    /// User display name ("first last").
    Name,
    /// User email.
    Email,
    /// User creation time.
    CreatedAt,
    /// Audit event time.
    OccurredAt,
}

impl SortField {
    /// Returns the query-string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::CreatedAt => "createdAt",
            Self::OccurredAt => "occurredAt",
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "createdAt" => Ok(Self::CreatedAt),
            "occurredAt" => Ok(Self::OccurredAt),
            _ => Err(AppError::Validation(format!("unknown sort field '{value}'"))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the query-string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub fn flipped(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// Active ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Ordered field.
    pub field: SortField,
    /// Ordering direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort spec.
    #[must_use]
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Returns the spec after the user clicks the header of `field`.
    ///
    /// Clicking the active field flips the direction; another field starts ascending.
    #[must_use]
    pub fn toggled(&self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.direction.flipped())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }
}

/// Zero-based page index and a page size from [`ALLOWED_PAGE_SIZES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageSpec {
    index: usize,
    size: usize,
}

impl PageSpec {
    /// Creates a validated page spec.
    pub fn new(index: usize, size: usize) -> AppResult<Self> {
        if !is_allowed_page_size(size) {
            return Err(AppError::Validation(format!(
                "page size must be one of {ALLOWED_PAGE_SIZES:?}, got {size}"
            )));
        }

        Ok(Self { index, size })
    }

    /// First page with the default size.
    #[must_use]
    pub fn first() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Returns the zero-based page index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the page size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of rows before this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }

    /// Returns the same size at another index.
    #[must_use]
    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            size: self.size,
        }
    }

    /// Returns the first page at another size.
    ///
    /// The index resets so the view never lands on an out-of-range page.
    pub fn with_size(&self, size: usize) -> AppResult<Self> {
        Self::new(0, size)
    }

    /// Returns the first page at the same size.
    #[must_use]
    pub fn reset(&self) -> Self {
        self.with_index(0)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::first()
    }
}

/// Returns whether `size` is one of [`ALLOWED_PAGE_SIZES`].
#[must_use]
pub fn is_allowed_page_size(size: usize) -> bool {
    ALLOWED_PAGE_SIZES.contains(&size)
}

/// Complete, serializable description of what a listing shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Active constraints.
    pub filters: FilterSet,
    /// Active ordering.
    pub sort: SortSpec,
    /// Active page.
    pub page: PageSpec,
}

impl QueryState {
    /// Creates a state with no filters on the first page.
    #[must_use]
    pub fn new(sort: SortSpec, page: PageSpec) -> Self {
        Self {
            filters: FilterSet::new(),
            sort,
            page,
        }
    }
}

/// One page of server-returned items plus total count metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage<T> {
    /// Items on this page, in display order.
    pub items: Vec<T>,
    /// Number of matching items across all pages.
    pub total_count: usize,
    /// Zero-based index of this page.
    pub page_index: usize,
    /// Requested page size.
    pub page_size: usize,
}

impl<T> ResultPage<T> {
    /// Creates an empty page for `page`.
    #[must_use]
    pub fn empty(page: PageSpec) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_index: page.index(),
            page_size: page.size(),
        }
    }

    /// Cuts `page` out of a complete, already ordered collection.
    #[must_use]
    pub fn from_slice(all: Vec<T>, page: PageSpec) -> Self {
        let total_count = all.len();
        let items = all
            .into_iter()
            .skip(page.offset())
            .take(page.size())
            .collect();

        Self {
            items,
            total_count,
            page_index: page.index(),
            page_size: page.size(),
        }
    }

    /// Returns whether this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of pages needed for `total_count`.
    #[must_use]
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }

        self.total_count.div_ceil(self.page_size)
    }

    /// Maps the items while keeping page metadata.
    pub fn map<U>(self, transform: impl FnMut(T) -> U) -> ResultPage<U> {
        ResultPage {
            items: self.items.into_iter().map(transform).collect(),
            total_count: self.total_count,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}
