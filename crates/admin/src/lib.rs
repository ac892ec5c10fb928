//! Admin-side plumbing around the filter engine: list requests, table and
//! row actions, role based access control and file uploads.

pub mod actions;
pub mod error;
pub mod listing;
pub mod rbac;
pub mod response;
pub mod upload;

pub use actions::{
    Action, ActionInput, ActionKind, ActionRegistry, EveryRow, HeadActions, ModelActions,
    RowPolicy,
};
pub use error::AdminError;
pub use listing::{ListArgs, ListPlan, ListView, TableConfig, page_limits};
pub use rbac::{AllowAll, Permission, PermissionChecker, Principal, Role};
pub use response::{ApiResponse, ListResponse};
pub use upload::{UploadResult, UploadTarget};
