//! Route Guard
//!
//! 纯函数：给定目标路由与两个身份域的在位情况，决定渲染还是重定向。
//! 不做任何网络校验；缓存中存在身份即视为已登录。

use crate::route::AppRoute;
use crate::session::RealmPresence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// 重定向总是替换当前历史记录，避免后退回到受保护页面
    Redirect(AppRoute),
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }
}

pub fn guard(route: AppRoute, presence: RealmPresence) -> GuardDecision {
    if let Some(realm) = route.guarded_by() {
        return if presence.has(realm) {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect(AppRoute::login_route(realm))
        };
    }

    // 已登录时访问登录页，送回该域首页
    match route.login_for() {
        Some(realm) if presence.has(realm) => GuardDecision::Redirect(AppRoute::home_route(realm)),
        _ => GuardDecision::Render,
    }
}

/// 反复应用守卫直到稳定，返回最终落地的路由
///
/// 守卫的重定向目标总是登录页或首页，最多两跳即收敛。
pub fn resolve(route: AppRoute, presence: RealmPresence) -> AppRoute {
    let mut current = route;
    for _ in 0..4 {
        match guard(current, presence) {
            GuardDecision::Render => return current,
            GuardDecision::Redirect(next) => current = next,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Realm;

    const NOBODY: RealmPresence = RealmPresence {
        user: false,
        admin: false,
    };
    const USER_ONLY: RealmPresence = RealmPresence {
        user: true,
        admin: false,
    };
    const ADMIN_ONLY: RealmPresence = RealmPresence {
        user: false,
        admin: true,
    };

    const USER_PAGES: [AppRoute; 13] = [
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
    ];

    const ADMIN_PAGES: [AppRoute; 12] = [
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
    ];

    #[test]
    fn absent_identity_redirects_every_guarded_page_to_its_login() {
        for page in USER_PAGES {
            assert_eq!(guard(page, NOBODY), GuardDecision::Redirect(AppRoute::Login));
            assert_eq!(guard(page, ADMIN_ONLY), GuardDecision::Redirect(AppRoute::Login));
        }
        for page in ADMIN_PAGES {
            assert_eq!(
                guard(page, NOBODY),
                GuardDecision::Redirect(AppRoute::AdminLogin)
            );
            assert_eq!(
                guard(page, USER_ONLY),
                GuardDecision::Redirect(AppRoute::AdminLogin)
            );
        }
    }

    #[test]
    fn present_identity_renders_its_realm_pages() {
        for page in USER_PAGES {
            assert!(guard(page, USER_ONLY).is_render());
        }
        for page in ADMIN_PAGES {
            assert!(guard(page, ADMIN_ONLY).is_render());
        }
    }

    #[test]
    fn login_pages_bounce_signed_in_realm_home() {
        assert!(guard(AppRoute::Login, NOBODY).is_render());
        assert_eq!(
            guard(AppRoute::Login, USER_ONLY),
            GuardDecision::Redirect(AppRoute::Dashboard)
        );
        // 用户域登录不影响管理员登录页
        assert!(guard(AppRoute::AdminLogin, USER_ONLY).is_render());
        assert_eq!(
            guard(AppRoute::AdminLogin, ADMIN_ONLY),
            GuardDecision::Redirect(AppRoute::AdminDashboard)
        );
    }

    #[test]
    fn not_found_always_renders() {
        assert!(guard(AppRoute::NotFound, NOBODY).is_render());
    }

    #[test]
    fn resolve_settles_on_a_renderable_route() {
        assert_eq!(resolve(AppRoute::AdminFiles, NOBODY), AppRoute::AdminLogin);
        assert_eq!(resolve(AppRoute::Login, USER_ONLY), AppRoute::Dashboard);
        for realm in Realm::ALL {
            let home = AppRoute::home_route(realm);
            let presence = RealmPresence {
                user: realm == Realm::User,
                admin: realm == Realm::Admin,
            };
            assert_eq!(resolve(home, presence), home);
        }
    }
}
