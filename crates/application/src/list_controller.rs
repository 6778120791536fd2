use std::sync::Arc;

use opshub_core::{AppError, AppResult};
use opshub_domain::{FilterKey, FilterSet, QueryDefaults, QueryState, QueryStateCodec, SortField};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::result_table::page_info_for;
use crate::{ListSource, LocationPort, TableIntent, TableProps};

mod state;

pub use state::{ListState, RequestToken, ViewState};

/// When filter edits take effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyPolicy {
    /// Every filter edit re-encodes the location and fetches.
    #[default]
    Immediate,
    /// Filter edits are staged until [`ListController::apply`].
    Deferred,
}

/// How state changes are written to the location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Always replace the current entry.
    #[default]
    Replace,
    /// Push an entry for page changes and replace otherwise.
    PushNavigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationWrite {
    Replace,
    Navigate,
}

/// Per-listing settings of a [`ListController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListControllerConfig {
    /// Listing name used in log events.
    pub listing: &'static str,
    /// Decoding fallbacks and sortable fields.
    pub defaults: QueryDefaults,
    /// When filter edits take effect.
    pub apply_policy: ApplyPolicy,
    /// How state changes reach the location.
    pub history_policy: HistoryPolicy,
    /// Message shown when a fetch fails without a usable server message.
    pub failure_message: &'static str,
    /// Message shown when a fetch returns no rows.
    pub empty_message: &'static str,
}

impl ListControllerConfig {
    /// Settings of the users listing.
    #[must_use]
    pub fn users() -> Self {
        Self {
            listing: "users",
            defaults: QueryDefaults::users(),
            apply_policy: ApplyPolicy::Immediate,
            history_policy: HistoryPolicy::Replace,
            failure_message: "Failed to load users",
            empty_message: "No users found for the selected filter.",
        }
    }

    /// Settings of the audit log listing.
    #[must_use]
    pub fn audit() -> Self {
        Self {
            listing: "audit",
            defaults: QueryDefaults::audit(),
            apply_policy: ApplyPolicy::Immediate,
            history_policy: HistoryPolicy::Replace,
            failure_message: "Failed to load audit events",
            empty_message: "No audit events found for the selected filters.",
        }
    }

    /// Returns the settings with another apply policy.
    #[must_use]
    pub fn with_apply_policy(mut self, apply_policy: ApplyPolicy) -> Self {
        self.apply_policy = apply_policy;
        self
    }

    /// Returns the settings with another history policy.
    #[must_use]
    pub fn with_history_policy(mut self, history_policy: HistoryPolicy) -> Self {
        self.history_policy = history_policy;
        self
    }
}

/// Headless controller of one listing.
///
/// Owns the listing's [`QueryState`], mirrors it to a [`LocationPort`] and
/// reconciles fetch results into a [`ViewState`]. The state lock is never
/// held across a fetch, and only the most recently issued fetch may update
/// the view. Location writes happen under the lock, so concurrent callers
/// leave the location on the last committed state.
pub struct ListController<S: ListSource> {
    source: S,
    location: Arc<dyn LocationPort>,
    codec: QueryStateCodec,
    config: ListControllerConfig,
    state: Mutex<ListState<S::Item>>,
}

impl<S: ListSource> ListController<S> {
    /// Creates an idle controller showing the listing's initial state.
    #[must_use]
    pub fn new(source: S, location: Arc<dyn LocationPort>, config: ListControllerConfig) -> Self {
        let codec = QueryStateCodec::new(config.defaults);
        let state = ListState::new(config.defaults.initial_state());

        Self {
            source,
            location,
            codec,
            config,
            state: Mutex::new(state),
        }
    }

    /// Returns the controller settings.
    #[must_use]
    pub fn config(&self) -> &ListControllerConfig {
        &self.config
    }

    /// Loads the state encoded in the location and starts the first fetch.
    ///
    /// A non-canonical location is rewritten in place.
    pub async fn open(&self) {
        let current = self.location.current_query();
        let decoded = self.codec.decode(current.as_str());

        let canonical = self.codec.encode(&decoded);
        {
            let mut state = self.state.lock().await;
            if state.is_torn_down() {
                self.log_ignored("open");
                return;
            }
            state.replace_query(decoded);

            if canonical != current.trim().trim_start_matches('?') {
                self.location.replace_query(canonical.as_str());
            }
        }

        info!(
            listing = self.config.listing,
            query = %canonical,
            "listing opened"
        );
        self.fetch().await;
    }

    /// Merges one filter edit.
    ///
    /// Blank input removes the filter. Invalid input, such as text for a
    /// numeric key, is rejected and leaves the state unchanged.
    pub async fn set_filter(&self, key: FilterKey, raw: &str) -> AppResult<()> {
        let apply_policy = self.config.apply_policy;
        self.transition("set_filter", LocationWrite::Replace, false, |state| {
            let mut staged = state.staged_filters().clone();
            staged.set(key, raw)?;
            *state.staged_filters_mut() = staged;

            Ok(match apply_policy {
                ApplyPolicy::Immediate => {
                    Some(committed_filters(state.query(), state.staged_filters()))
                }
                ApplyPolicy::Deferred => None,
            })
        })
        .await
    }

    /// Removes every filter.
    pub async fn clear_filters(&self) -> AppResult<()> {
        let apply_policy = self.config.apply_policy;
        self.transition("clear_filters", LocationWrite::Replace, false, |state| {
            *state.staged_filters_mut() = FilterSet::new();

            Ok(match apply_policy {
                ApplyPolicy::Immediate => {
                    Some(committed_filters(state.query(), state.staged_filters()))
                }
                ApplyPolicy::Deferred => None,
            })
        })
        .await
    }

    /// Commits staged filters and fetches, even when nothing changed.
    pub async fn apply(&self) -> AppResult<()> {
        self.transition("apply", LocationWrite::Replace, true, |state| {
            Ok(Some(committed_filters(state.query(), state.staged_filters())))
        })
        .await
    }

    /// Sorts by `field`; the active field flips direction.
    pub async fn set_sort(&self, field: SortField) -> AppResult<()> {
        let defaults = self.config.defaults;
        self.transition("set_sort", LocationWrite::Replace, false, |state| {
            if !defaults.is_sortable(field) {
                return Err(AppError::Validation(format!(
                    "listing cannot be sorted by '{}'",
                    field.as_str()
                )));
            }

            let mut next = state.query().clone();
            next.sort = next.sort.toggled(field);
            next.page = next.page.reset();
            Ok(Some(next))
        })
        .await
    }

    /// Moves to a zero-based page index.
    pub async fn set_page(&self, index: usize) -> AppResult<()> {
        self.transition("set_page", LocationWrite::Navigate, false, |state| {
            let mut next = state.query().clone();
            next.page = next.page.with_index(index);
            Ok(Some(next))
        })
        .await
    }

    /// Changes the page size and returns to the first page.
    pub async fn set_page_size(&self, size: usize) -> AppResult<()> {
        self.transition("set_page_size", LocationWrite::Replace, false, |state| {
            let mut next = state.query().clone();
            next.page = next.page.with_size(size)?;
            Ok(Some(next))
        })
        .await
    }

    /// Re-issues the fetch for the current state.
    pub async fn refresh(&self) {
        self.fetch().await;
    }

    /// Invalidates the in-flight fetch; later operations are ignored.
    pub async fn teardown(&self) {
        self.state.lock().await.teardown();
        debug!(listing = self.config.listing, "listing torn down");
    }

    /// Routes a table intent; row actions are handed back to the caller.
    pub async fn dispatch<A>(&self, intent: TableIntent<A>) -> AppResult<Option<A>> {
        match intent {
            TableIntent::Sort(field) => self.set_sort(field).await.map(|()| None),
            TableIntent::PageChange(index) => self.set_page(index).await.map(|()| None),
            TableIntent::PageSizeChange(size) => self.set_page_size(size).await.map(|()| None),
            TableIntent::RowAction(action) => Ok(Some(action)),
        }
    }

    /// Returns the applied query state.
    pub async fn query(&self) -> QueryState {
        self.state.lock().await.query().clone()
    }

    /// Returns the canonical query string of the applied state.
    pub async fn query_string(&self) -> String {
        self.codec.encode(self.state.lock().await.query())
    }

    /// Returns filters edited but not yet applied.
    pub async fn staged_filters(&self) -> FilterSet {
        self.state.lock().await.staged_filters().clone()
    }

    /// Returns the view state.
    pub async fn view(&self) -> ViewState<S::Item> {
        self.state.lock().await.view().clone()
    }

    /// Returns the snapshot a table renderer draws from.
    pub async fn table_props(&self) -> TableProps<S::Item> {
        let state = self.state.lock().await;
        let view = state.view();
        let query = state.query();
        let loaded = view.page();

        TableProps {
            rows: loaded.map(|page| page.items.clone()).unwrap_or_default(),
            loading: matches!(view, ViewState::Idle) || view.is_loading(),
            error: view.error().map(str::to_owned),
            sort: query.sort,
            page: page_info_for(query.page.index(), query.page.size(), loaded),
            empty_message: self.config.empty_message.to_owned(),
        }
    }

    async fn transition<F>(
        &self,
        operation: &'static str,
        write: LocationWrite,
        always_fetch: bool,
        change: F,
    ) -> AppResult<()>
    where
        F: FnOnce(&mut ListState<S::Item>) -> AppResult<Option<QueryState>> + Send,
    {
        let committed = {
            let mut state = self.state.lock().await;
            if state.is_torn_down() {
                self.log_ignored(operation);
                return Ok(());
            }

            match change(&mut *state)? {
                Some(next) if state.replace_query(next.clone()) => {
                    self.write_location(&next, write);
                    true
                }
                _ => false,
            }
        };

        if committed || always_fetch {
            self.fetch().await;
        }

        Ok(())
    }

    fn write_location(&self, query: &QueryState, write: LocationWrite) {
        let encoded = self.codec.encode(query);
        match (write, self.config.history_policy) {
            (LocationWrite::Navigate, HistoryPolicy::PushNavigation) => {
                self.location.push_query(encoded.as_str());
            }
            _ => self.location.replace_query(encoded.as_str()),
        }
    }

    async fn fetch(&self) {
        let Some((token, query)) = self.state.lock().await.begin_fetch() else {
            self.log_ignored("fetch");
            return;
        };

        debug!(listing = self.config.listing, %token, "fetch started");
        let result = self.source.fetch(&query).await;
        if let Err(error) = &result {
            warn!(
                listing = self.config.listing,
                %token,
                error = %error,
                "fetch failed"
            );
        }

        let outcome = self.state.lock().await.complete_fetch(
            token,
            result,
            self.config.failure_message,
        );

        match outcome {
            Ok(()) => debug!(listing = self.config.listing, %token, "fetch applied"),
            Err(error) if error.is_stale() => debug!(
                listing = self.config.listing,
                %token,
                "stale fetch response discarded"
            ),
            Err(error) => warn!(
                listing = self.config.listing,
                %token,
                error = %error,
                "fetch response rejected"
            ),
        }
    }

    fn log_ignored(&self, operation: &'static str) {
        debug!(
            listing = self.config.listing,
            operation, "operation ignored after teardown"
        );
    }
}

fn committed_filters(current: &QueryState, staged: &FilterSet) -> QueryState {
    let mut next = current.clone();
    if next.filters != *staged {
        next.filters = staged.clone();
        next.page = next.page.reset();
    }

    next
}
