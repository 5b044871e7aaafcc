//! 雇主与员工门户前端
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::router`: 路由服务（核心引擎），守卫规则来自共享层
//! - `session`: 两个身份域的会话状态
//! - `badges`: 导航栏未读角标
//! - `components`: UI 组件层；各管理页面由 `ResourcePage` 按资源描述渲染

mod badges;
mod components {
    pub mod dashboard;
    mod icons;
    pub mod login;
    pub mod profile;
    pub mod record_form;
    pub mod report;
    pub mod resource_page;
    pub mod shell;
    mod status_badge;
}
mod session;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web;

use crate::badges::BadgeContext;
use crate::components::dashboard::DashboardPage;
use crate::components::login::LoginPage;
use crate::components::profile::ProfilePage;
use crate::components::report::ReportPage;
use crate::components::resource_page::ResourcePage;
use crate::components::shell::Shell;
use crate::session::{ClientContext, SessionContext};

use leptos::prelude::*;
use portal_shared::resources::schema_for;
use portal_shared::{ApiConfig, AppRoute, BadgeKind, PortalClient, Realm, log_info};

use web::router::{Router, RouterOutlet};
use web::{FetchTransport, on_storage_change};

fn not_found() -> AnyView {
    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="text-center">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl mt-4">"Page not found"</p>
            </div>
        </div>
    }
    .into_any()
}

/// 受保护页面的主体
fn guarded_page(route: AppRoute, realm: Realm) -> AnyView {
    match route {
        AppRoute::Dashboard | AppRoute::AdminDashboard => {
            view! { <DashboardPage realm=realm /> }.into_any()
        }
        AppRoute::Profile | AppRoute::AdminProfile => {
            view! { <ProfilePage realm=realm /> }.into_any()
        }
        AppRoute::AdminReports => view! { <ReportPage /> }.into_any(),
        other => match schema_for(other) {
            Some(schema) => view! { <ResourcePage schema=schema /> }.into_any(),
            None => not_found(),
        },
    }
}

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。受保护路由一律包在导航外壳里，
/// 身份变化时外壳重新调用页面构造。
fn route_matcher(route: AppRoute) -> AnyView {
    if let Some(realm) = route.login_for() {
        return view! { <LoginPage realm=realm /> }.into_any();
    }
    match route.guarded_by() {
        Some(realm) => view! {
            <Shell realm=realm>
                {guarded_page(route, realm)}
            </Shell>
        }
        .into_any(),
        None => not_found(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 会话上下文 (从 localStorage 恢复两个身份域)
    let session = SessionContext::new();
    provide_context(session);

    // 2. 远程资源客户端
    let config = ApiConfig::from_build_env();
    log_info!("[App] api base {}", config.api_base());
    provide_context(ClientContext::new(PortalClient::new(FetchTransport, config)));

    // 3. 未读角标
    let badges = BadgeContext::new();
    provide_context(badges);

    // 4. 其它标签页的登录/登出与已读记录
    on_storage_change(move |key| match key {
        Some(key) => {
            if let Some(realm) = Realm::from_storage_key(&key) {
                session.sync_from_storage(realm);
            }
            if let Some(kind) = BadgeKind::from_visited_key(&key) {
                badges.external_change(kind);
            }
        }
        None => {
            for realm in Realm::ALL {
                session.sync_from_storage(realm);
            }
            for kind in BadgeKind::ALL {
                badges.external_change(kind);
            }
        }
    });

    // 5. 在位信号注入路由服务（解耦！）
    let presence = session.presence_signal();

    view! {
        <Router presence=presence>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
