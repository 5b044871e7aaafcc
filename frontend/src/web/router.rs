//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 导航流程："请求 -> 守卫 -> 处理 -> 加载"。守卫本身是共享层的纯函数，
//! 这里只负责把它的结论落到地址栏与路由信号上。

use leptos::prelude::*;
use portal_shared::session::RealmPresence;
use portal_shared::{AppRoute, log_info, resolve};
use wasm_bindgen::prelude::*;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 重定向使用 replaceState，后退时不会回到被拦截的页面
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 通过注入的身份在位信号实现与会话模块的解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    presence: Signal<RealmPresence>,
}

impl RouterService {
    fn new(presence: Signal<RealmPresence>) -> Self {
        let requested = AppRoute::from_path(&current_path());
        let initial = resolve(requested, presence.get_untracked());
        if initial != requested {
            replace_history_state(initial.to_path());
        }
        let (current_route, set_route) = signal(initial);

        Self {
            current_route,
            set_route,
            presence,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// **核心方法：导航与守卫**
    pub fn navigate(&self, route: AppRoute) {
        let target = resolve(route, self.presence.get_untracked());
        if target != route {
            log_info!("[Router] {} -> {}", route, target);
            // 被拦截的请求不留历史记录
            replace_history_state(target.to_path());
        } else {
            push_history_state(target.to_path());
        }
        self.set_route.set(target);
    }

    /// 浏览器后退/前进同样经过守卫
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;
        let presence = self.presence;

        let closure = Closure::<dyn Fn()>::new(move || {
            let requested = AppRoute::from_path(&current_path());
            let target = resolve(requested, presence.get_untracked());
            if target != requested {
                replace_history_state(target.to_path());
            }
            set_route.set(target);
        });

        if let Some(window) = web_sys::window() {
            let _ = window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 登录/登出 (包括其它标签页) 后重新评估当前页面
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let presence = self.presence;

        Effect::new(move |_| {
            let presence = presence.get();
            let route = current_route.get_untracked();
            let target = resolve(route, presence);
            if target != route {
                log_info!("[Router] auth state changed: {} -> {}", route, target);
                replace_history_state(target.to_path());
                set_route.set(target);
            }
        });
    }
}

fn provide_router(presence: Signal<RealmPresence>) -> RouterService {
    let router = RouterService::new(presence);
    router.init_popstate_listener();
    router.setup_auth_redirect();
    provide_context(router);
    router
}

pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(presence: Signal<RealmPresence>, children: Children) -> impl IntoView {
    provide_router(presence);
    children()
}

/// 路由出口组件
#[component]
pub fn RouterOutlet(matcher: fn(AppRoute) -> AnyView) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}

/// 站内链接：拦截点击，走路由服务
#[component]
pub fn Link(
    to: AppRoute,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        router.navigate(to);
    };

    view! {
        <a href=to.to_path() class=class on:click=on_click>
            {children()}
        </a>
    }
}
