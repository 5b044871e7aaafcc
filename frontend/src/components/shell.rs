//! 导航外壳
//!
//! 侧边栏按当前角色过滤链接并显示未读角标；顶栏显示身份与登出按钮。
//! 身份变化 (包括其它标签页重新登录) 时整页重建，角标重新拉取。

use crate::badges::use_badges;
use crate::components::icons::{LogOut, Menu, UserCircle};
use crate::session::use_session;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use portal_shared::nav::visible_links;
use portal_shared::{NavEntry, Realm};

#[component]
fn NavLink(entry: NavEntry) -> impl IntoView {
    let router = use_router();
    let badges = use_badges();
    let count = entry.badge.map(|kind| badges.count(kind));
    let class = move || {
        if router.current_route().get() == entry.route {
            "menu-active flex justify-between"
        } else {
            "flex justify-between"
        }
    };

    view! {
        <li>
            <Link to=entry.route>
                <span class=class>
                    {entry.label}
                    {count.map(|count| view! {
                        <Show when=move || { count.get() > 0 }>
                            <span class="badge badge-error badge-sm">{move || count.get()}</span>
                        </Show>
                    })}
                </span>
            </Link>
        </li>
    }
}

#[component]
pub fn Shell(realm: Realm, children: ChildrenFn) -> impl IntoView {
    let session = use_session();
    let badges = use_badges();
    let identity = session.identity(realm);

    // 只有换了人或角色才重建页面；改名只刷新顶栏
    let who = Memo::new(move |_| identity.with(|i| i.as_ref().map(|i| (i.id, i.role))));
    let name = move || identity.with(|i| i.as_ref().map(|i| i.display_name().to_string()));

    Effect::new(move |_| {
        if realm != Realm::User || who.get().is_none() {
            return;
        }
        if let Some(identity) = identity.get_untracked() {
            badges.refresh(identity);
        }
    });

    let on_logout = move |_| session.sign_out(realm);
    move || {
        let Some((_, role)) = who.get() else {
            return ().into_any();
        };
        let links = visible_links(realm, role);

        view! {
            <div class="drawer lg:drawer-open">
                <input id="portal-drawer" type="checkbox" class="drawer-toggle" />
                <div class="drawer-content min-h-screen bg-base-200">
                    <div class="navbar bg-base-100 shadow-sm px-4">
                        <div class="flex-none lg:hidden">
                            <label for="portal-drawer" class="btn btn-square btn-ghost">
                                <Menu attr:class="h-5 w-5" />
                            </label>
                        </div>
                        <div class="flex-1">
                            <span class="text-lg font-semibold">
                                {match realm {
                                    Realm::User => "Employer & Employee Portal",
                                    Realm::Admin => "Admin Console",
                                }}
                            </span>
                        </div>
                        <div class="flex-none flex items-center gap-3">
                            <div class="flex items-center gap-2">
                                <UserCircle attr:class="h-5 w-5 opacity-70" />
                                <span class="font-medium">{name}</span>
                                <span class="badge badge-ghost capitalize">{role.to_string()}</span>
                            </div>
                            <button on:click=on_logout class="btn btn-outline btn-error btn-sm gap-2">
                                <LogOut attr:class="h-4 w-4" /> "Logout"
                            </button>
                        </div>
                    </div>
                    <main class="p-4 md:p-8 max-w-7xl mx-auto">
                        {children()}
                    </main>
                </div>
                <div class="drawer-side">
                    <label for="portal-drawer" aria-label="close sidebar" class="drawer-overlay"></label>
                    <ul class="menu bg-base-100 text-base-content min-h-full w-64 p-4 gap-1">
                        {links
                            .into_iter()
                            .map(|entry| view! { <NavLink entry=entry /> })
                            .collect_view()}
                    </ul>
                </div>
            </div>
        }
        .into_any()
    }
}
