//! Domain entities, query model and invariants.

#![forbid(unsafe_code)]

mod audit;
mod query;
mod query_codec;
mod security;
mod user;

pub use audit::{
    AuditEvent, AuditEventId, KNOWN_AUDIT_ACTIONS, KNOWN_ENTITY_TYPES, USER_ENTITY_TYPE,
    metadata_from_raw,
};
pub use query::{
    ALLOWED_PAGE_SIZES, DEFAULT_PAGE_SIZE, FilterKey, FilterSet, FilterValue, PageSpec,
    QueryState, ResultPage, SortDirection, SortField, SortSpec, is_allowed_page_size,
};
pub use query_codec::{QueryDefaults, QueryStateCodec};
pub use security::{Capability, Role, has_capability};
pub use user::{
    CreateUserInput, EmailAddress, FieldViolation, NewUser, User, UserField, UserId, UserStatus,
};
