//! Application services and ports.

#![forbid(unsafe_code)]

mod gateway_ports;
mod list_controller;
mod list_sources;
mod result_table;
mod session;
mod users_page;

#[cfg(test)]
mod test_support;

pub use gateway_ports::{AuditEventQuery, LocationPort, RequestGateway};
pub use list_controller::{
    ApplyPolicy, HistoryPolicy, ListController, ListControllerConfig, ListState, RequestToken,
    ViewState,
};
pub use list_sources::{AuditListSource, ListSource, UserListSource};
pub use result_table::{PageInfo, TableDisplay, TableIntent, TableProps};
pub use session::Session;
pub use users_page::{MutationError, RowActionOutcome, UserRowAction, UsersPage};
