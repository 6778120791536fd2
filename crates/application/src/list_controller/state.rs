use opshub_core::{AppError, AppResult};
use opshub_domain::{FilterSet, QueryState, ResultPage};

/// Marker for one fetch attempt.
///
/// Only the most recently issued token may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Display state of a listing. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight.
    Loading {
        /// Last successfully loaded page, kept on screen meanwhile.
        previous: Option<ResultPage<T>>,
    },
    /// The latest fetch succeeded.
    Success(ResultPage<T>),
    /// The latest fetch failed.
    Failed {
        /// User-facing error message.
        message: String,
        /// Last successfully loaded page.
        previous: Option<ResultPage<T>>,
    },
}

impl<T> ViewState<T> {
    /// Returns whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Returns the error message of a failed fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Returns the last successfully loaded page, current or previous.
    #[must_use]
    pub fn page(&self) -> Option<&ResultPage<T>> {
        match self {
            Self::Idle => None,
            Self::Success(page) => Some(page),
            Self::Loading { previous } | Self::Failed { previous, .. } => previous.as_ref(),
        }
    }

    fn into_page(self) -> Option<ResultPage<T>> {
        match self {
            Self::Idle => None,
            Self::Success(page) => Some(page),
            Self::Loading { previous } | Self::Failed { previous, .. } => previous,
        }
    }
}

/// Synchronous core of a list controller: query state, view state and the
/// request token bookkeeping that keeps stale responses out.
#[derive(Debug)]
pub struct ListState<T> {
    query: QueryState,
    staged_filters: FilterSet,
    view: ViewState<T>,
    issued: u64,
    latest: Option<RequestToken>,
    torn_down: bool,
}

impl<T> ListState<T> {
    /// Creates an idle state showing `query`.
    #[must_use]
    pub fn new(query: QueryState) -> Self {
        Self {
            staged_filters: query.filters.clone(),
            query,
            view: ViewState::Idle,
            issued: 0,
            latest: None,
            torn_down: false,
        }
    }

    /// Returns the applied query state.
    #[must_use]
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Returns the filters being edited but not yet applied.
    #[must_use]
    pub fn staged_filters(&self) -> &FilterSet {
        &self.staged_filters
    }

    /// Returns the view state.
    #[must_use]
    pub fn view(&self) -> &ViewState<T> {
        &self.view
    }

    /// Returns whether [`ListState::teardown`] ran.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Replaces the applied query state.
    ///
    /// Staged filters follow when the applied filters change. Returns `false`
    /// when nothing changed, in which case no fetch is needed.
    pub fn replace_query(&mut self, query: QueryState) -> bool {
        if self.torn_down || self.query == query {
            return false;
        }

        if self.query.filters != query.filters {
            self.staged_filters = query.filters.clone();
        }
        self.query = query;
        true
    }

    /// Returns a mutable handle on the staged filters.
    pub fn staged_filters_mut(&mut self) -> &mut FilterSet {
        &mut self.staged_filters
    }

    /// Starts a fetch: issues a token that supersedes every earlier one.
    ///
    /// Returns `None` after teardown.
    pub fn begin_fetch(&mut self) -> Option<(RequestToken, QueryState)> {
        if self.torn_down {
            return None;
        }

        self.issued = self.issued.saturating_add(1);
        let token = RequestToken(self.issued);
        self.latest = Some(token);

        let previous = std::mem::replace(&mut self.view, ViewState::Idle).into_page();
        self.view = ViewState::Loading { previous };

        Some((token, self.query.clone()))
    }

    /// Applies the outcome of the fetch identified by `token`.
    ///
    /// Superseded fetches are rejected with [`AppError::StaleResponseDiscarded`]
    /// and leave the state untouched.
    pub fn complete_fetch(
        &mut self,
        token: RequestToken,
        result: AppResult<ResultPage<T>>,
        failure_message: &str,
    ) -> AppResult<()> {
        if self.latest != Some(token) {
            return Err(AppError::StaleResponseDiscarded);
        }

        self.latest = None;
        self.view = match result {
            Ok(page) => ViewState::Success(page),
            Err(error) => {
                let previous = std::mem::replace(&mut self.view, ViewState::Idle).into_page();
                ViewState::Failed {
                    message: error.user_message(failure_message),
                    previous,
                }
            }
        };

        Ok(())
    }

    /// Invalidates the in-flight token and freezes the state.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.latest = None;
    }
}
