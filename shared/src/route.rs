//! 路由定义模块 - 领域模型
//!
//! 纯业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了两个身份域下的全部页面及其所属域。

use std::fmt::Display;

use crate::identity::Realm;

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    // ---- 用户域 ----
    Login,
    Dashboard,
    Profile,
    Notifications,
    Tasks,
    Forms,
    Files,
    Payslip,
    IdCreation,
    Invoices,
    Payments,
    AddPayslip,
    Reports,
    EpfoRequests,

    // ---- 管理员域 ----
    AdminLogin,
    AdminDashboard,
    AdminProfile,
    AdminNotifications,
    AdminTasks,
    AdminEmployees,
    AdminInvoices,
    AdminPayments,
    AdminReports,
    AdminEpfoRequests,
    AdminPayslip,
    AdminForms,
    AdminFiles,

    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let path = match path.split(['?', '#']).next() {
            Some(p) if p.len() > 1 => p.trim_end_matches('/'),
            _ => "/",
        };
        match path {
            "/login" => Self::Login,
            "/" => Self::Dashboard,
            "/profile" => Self::Profile,
            "/notifications" => Self::Notifications,
            "/tasks" => Self::Tasks,
            "/forms" => Self::Forms,
            "/files" => Self::Files,
            "/payslip" => Self::Payslip,
            "/id-creation" => Self::IdCreation,
            "/invoices" => Self::Invoices,
            "/payments" => Self::Payments,
            "/addpayslip" => Self::AddPayslip,
            "/reports" => Self::Reports,
            "/epfo-requests" => Self::EpfoRequests,

            "/admin/login" => Self::AdminLogin,
            "/admin" | "/admin/dashboard" => Self::AdminDashboard,
            "/admin/profile" => Self::AdminProfile,
            "/admin/notifications" => Self::AdminNotifications,
            "/admin/tasks" => Self::AdminTasks,
            "/admin/employees" => Self::AdminEmployees,
            "/admin/invoices" => Self::AdminInvoices,
            "/admin/payments" => Self::AdminPayments,
            "/admin/reports" => Self::AdminReports,
            "/admin/epfo-requests" => Self::AdminEpfoRequests,
            "/admin/payslip" => Self::AdminPayslip,
            "/admin/forms" => Self::AdminForms,
            "/admin/files" => Self::AdminFiles,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/",
            Self::Profile => "/profile",
            Self::Notifications => "/notifications",
            Self::Tasks => "/tasks",
            Self::Forms => "/forms",
            Self::Files => "/files",
            Self::Payslip => "/payslip",
            Self::IdCreation => "/id-creation",
            Self::Invoices => "/invoices",
            Self::Payments => "/payments",
            Self::AddPayslip => "/addpayslip",
            Self::Reports => "/reports",
            Self::EpfoRequests => "/epfo-requests",

            Self::AdminLogin => "/admin/login",
            Self::AdminDashboard => "/admin/dashboard",
            Self::AdminProfile => "/admin/profile",
            Self::AdminNotifications => "/admin/notifications",
            Self::AdminTasks => "/admin/tasks",
            Self::AdminEmployees => "/admin/employees",
            Self::AdminInvoices => "/admin/invoices",
            Self::AdminPayments => "/admin/payments",
            Self::AdminReports => "/admin/reports",
            Self::AdminEpfoRequests => "/admin/epfo-requests",
            Self::AdminPayslip => "/admin/payslip",
            Self::AdminForms => "/admin/forms",
            Self::AdminFiles => "/admin/files",

            Self::NotFound => "/404",
        }
    }

    /// **守卫依据：该路由受哪个身份域保护**
    ///
    /// 登录页与 404 不受保护。
    pub fn guarded_by(&self) -> Option<Realm> {
        match self {
            Self::Login | Self::AdminLogin | Self::NotFound => None,
            Self::AdminDashboard
            | Self::AdminProfile
            | Self::AdminNotifications
            | Self::AdminTasks
            | Self::AdminEmployees
            | Self::AdminInvoices
            | Self::AdminPayments
            | Self::AdminReports
            | Self::AdminEpfoRequests
            | Self::AdminPayslip
            | Self::AdminForms
            | Self::AdminFiles => Some(Realm::Admin),
            _ => Some(Realm::User),
        }
    }

    /// 登录页所属的身份域
    pub fn login_for(&self) -> Option<Realm> {
        match self {
            Self::Login => Some(Realm::User),
            Self::AdminLogin => Some(Realm::Admin),
            _ => None,
        }
    }

    /// 身份缺失时的重定向目标
    pub fn login_route(realm: Realm) -> Self {
        match realm {
            Realm::User => Self::Login,
            Realm::Admin => Self::AdminLogin,
        }
    }

    /// 登录成功后的落地页
    pub fn home_route(realm: Realm) -> Self {
        match realm {
            Realm::User => Self::Dashboard,
            Realm::Admin => Self::AdminDashboard,
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AppRoute; 28] = [
        AppRoute::Login,
        AppRoute::Dashboard,
        AppRoute::Profile,
        AppRoute::Notifications,
        AppRoute::Tasks,
        AppRoute::Forms,
        AppRoute::Files,
        AppRoute::Payslip,
        AppRoute::IdCreation,
        AppRoute::Invoices,
        AppRoute::Payments,
        AppRoute::AddPayslip,
        AppRoute::Reports,
        AppRoute::EpfoRequests,
        AppRoute::AdminLogin,
        AppRoute::AdminDashboard,
        AppRoute::AdminProfile,
        AppRoute::AdminNotifications,
        AppRoute::AdminTasks,
        AppRoute::AdminEmployees,
        AppRoute::AdminInvoices,
        AppRoute::AdminPayments,
        AppRoute::AdminReports,
        AppRoute::AdminEpfoRequests,
        AppRoute::AdminPayslip,
        AppRoute::AdminForms,
        AppRoute::AdminFiles,
        AppRoute::NotFound,
    ];

    #[test]
    fn every_path_parses_back_to_its_route() {
        for route in ALL.into_iter().filter(|r| *r != AppRoute::NotFound) {
            assert_eq!(AppRoute::from_path(route.to_path()), route);
        }
    }

    #[test]
    fn tolerates_trailing_slash_query_and_admin_root() {
        assert_eq!(AppRoute::from_path("/tasks/"), AppRoute::Tasks);
        assert_eq!(AppRoute::from_path("/invoices?x=1"), AppRoute::Invoices);
        assert_eq!(AppRoute::from_path("/admin"), AppRoute::AdminDashboard);
        assert_eq!(AppRoute::from_path(""), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn admin_pages_are_guarded_by_admin_realm() {
        assert_eq!(AppRoute::AdminPayslip.guarded_by(), Some(Realm::Admin));
        assert_eq!(AppRoute::Payslip.guarded_by(), Some(Realm::User));
        assert_eq!(AppRoute::Login.guarded_by(), None);
        assert_eq!(AppRoute::AdminLogin.guarded_by(), None);
    }
}
