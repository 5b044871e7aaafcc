pub mod log;

pub mod client;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod form;
pub mod guard;
pub mod identity;
pub mod nav;
pub mod payroll;
pub mod protocol;
pub mod record;
pub mod report;
pub mod resources;
pub mod route;
pub mod schema;
pub mod session;
pub mod storage;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 用户域 (员工/雇主) 身份的持久化键
pub const STORAGE_USER_KEY: &str = "user";
/// 管理员域身份的持久化键
pub const STORAGE_ADMIN_KEY: &str = "admin";

pub const VISITED_NOTIFICATIONS_KEY: &str = "visitedNotificationIds";
pub const VISITED_FORMS_KEY: &str = "visitedFormIds";
pub const LAST_VISITED_NOTIFICATIONS_KEY: &str = "lastVisitedNotificationsTime";
pub const LAST_VISITED_FORMS_KEY: &str = "lastVisitedFormsTime";

// =========================================================
// 导出 (Re-exports)
// =========================================================

pub use client::{Choice, PortalClient};
pub use config::ApiConfig;
pub use controller::{ListController, ListState, Notice, NoticeKind};
pub use envelope::{ListResult, MutationOutcome};
pub use error::{PortalError, PortalErrorStatus, PortalResult};
pub use form::{FileUpload, FormValues};
pub use guard::{GuardDecision, guard, resolve};
pub use identity::{Identity, Realm, Role};
pub use nav::{BadgeKind, BadgeTracker, NavEntry};
pub use protocol::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use record::{Record, RecordStatus};
pub use report::EmployeeReport;
pub use route::AppRoute;
pub use schema::ResourceSchema;
pub use session::{AuthState, SessionStore};
pub use storage::{KeyValueStore, MemoryStore};
