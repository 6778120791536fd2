use opshub_domain::{ALLOWED_PAGE_SIZES, ResultPage, SortDirection, SortField, SortSpec};

/// Pagination block of a table snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based page index.
    pub index: usize,
    /// Page size.
    pub size: usize,
    /// Number of matching rows across all pages.
    pub total_count: usize,
    /// Sizes the page-size selector offers.
    pub allowed_sizes: &'static [usize],
}

impl PageInfo {
    /// Builds page info from the requested page and the last loaded result.
    #[must_use]
    pub fn new(index: usize, size: usize, total_count: usize) -> Self {
        Self {
            index,
            size,
            total_count,
            allowed_sizes: ALLOWED_PAGE_SIZES,
        }
    }

    /// Returns the number of pages, never less than one.
    #[must_use]
    pub fn page_count(&self) -> usize {
        if self.size == 0 {
            return 1;
        }

        self.total_count.div_ceil(self.size).max(1)
    }

    /// Returns whether a previous page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Returns whether a next page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index.saturating_add(1) < self.page_count()
    }

    /// One-based number of the first row on this page, or 0 for an empty result.
    #[must_use]
    pub fn first_row(&self) -> usize {
        if self.total_count == 0 {
            return 0;
        }

        self.index.saturating_mul(self.size).saturating_add(1)
    }
}

/// Snapshot a table renderer draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct TableProps<T> {
    /// Rows of the last loaded page.
    pub rows: Vec<T>,
    /// Whether a fetch is in flight (or nothing was loaded yet).
    pub loading: bool,
    /// Error of the latest fetch.
    pub error: Option<String>,
    /// Active ordering.
    pub sort: SortSpec,
    /// Pagination block.
    pub page: PageInfo,
    /// Text shown when a fetch succeeded with zero rows.
    pub empty_message: String,
}

/// What a table shows; exactly one state applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableDisplay<'a, T> {
    /// Loading indicator.
    Loading,
    /// Error banner.
    Error(&'a str),
    /// Empty-state text.
    Empty(&'a str),
    /// Data rows.
    Rows(&'a [T]),
}

impl<T> TableProps<T> {
    /// Resolves the display state: loading, then error, then empty, then rows.
    #[must_use]
    pub fn display(&self) -> TableDisplay<'_, T> {
        if self.loading {
            return TableDisplay::Loading;
        }

        if let Some(error) = self.error.as_deref() {
            return TableDisplay::Error(error);
        }

        if self.rows.is_empty() {
            return TableDisplay::Empty(self.empty_message.as_str());
        }

        TableDisplay::Rows(self.rows.as_slice())
    }

    /// Returns the marker drawn next to a column header.
    #[must_use]
    pub fn sort_marker(&self, field: SortField) -> Option<&'static str> {
        (self.sort.field == field).then(|| match self.sort.direction {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        })
    }
}

/// User gesture on a table, routed back to its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableIntent<A> {
    /// Column header clicked.
    Sort(SortField),
    /// Pager moved to a zero-based page index.
    PageChange(usize),
    /// Page-size selector changed.
    PageSizeChange(usize),
    /// Listing-specific row action.
    RowAction(A),
}

/// Builds page info for a page shown at `index`/`size`, taking the total from
/// the last loaded result when there is one.
#[must_use]
pub fn page_info_for<T>(index: usize, size: usize, loaded: Option<&ResultPage<T>>) -> PageInfo {
    PageInfo::new(index, size, loaded.map_or(0, |page| page.total_count))
}
