use crate::components::icons::RefreshCw;
use crate::session::{use_client, use_session};
use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::dashboard::DashboardSummary;
use portal_shared::resources::dashboard_sources;
use portal_shared::schema::ParamContext;
use portal_shared::{Realm, Role};

#[component]
pub fn DashboardPage(realm: Realm) -> impl IntoView {
    let session = use_session();
    let Some(identity) = session.identity(realm).get_untracked() else {
        return ().into_any();
    };
    let client = StoredValue::new_local(use_client());
    let (tasks, invoices) = dashboard_sources(realm, identity.role);
    let name = identity.display_name().to_string();
    let show_invoices = invoices.is_some();
    let identity = StoredValue::new(identity);

    let (summary, set_summary) = signal(DashboardSummary::default());
    let (loading, set_loading) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let load = move || {
        if loading.get_untracked() {
            return;
        }
        set_loading.set(true);
        let client = client.get_value();
        let identity = identity.get_value();
        spawn_local(async move {
            let ctx = ParamContext::new(Some(&identity), tasks.default_filter());
            let task_list = client.list(tasks, &ctx).await;
            let mut error = task_list.error;
            let invoice_items = match invoices {
                Some(schema) => {
                    let ctx = ParamContext::new(Some(&identity), schema.default_filter());
                    let list = client.list(schema, &ctx).await;
                    error = error.or(list.error);
                    list.items
                }
                None => Vec::new(),
            };
            let _ = set_summary.try_set(DashboardSummary::from_records(&task_list.items, &invoice_items));
            let _ = set_error_msg.try_set(error);
            let _ = set_loading.try_set(false);
        });
    };

    // 初始加载
    load();

    let greeting = match identity.with_value(|i| i.role) {
        Role::Admin => "Here is how the whole organisation is doing.".to_string(),
        Role::Employer => "Here is an overview of your company.".to_string(),
        Role::Employee => "Here is an overview of your work.".to_string(),
    };

    view! {
        <div class="space-y-8">
            <div class="flex items-center justify-between">
                <div>
                    <h2 class="text-2xl font-bold">{format!("Welcome, {}", name)}</h2>
                    <p class="text-base-content/70">{greeting}</p>
                </div>
                <button on:click=move |_| load() disabled=move || loading.get() class="btn btn-ghost btn-circle">
                    <RefreshCw attr:class=move || if loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                </button>
            </div>

            {move || error_msg.get().map(|msg| view! {
                <div role="alert" class="alert alert-error shadow">
                    <span>{msg}</span>
                </div>
            })}

            <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                <div class="stat">
                    <div class="stat-title">"Tasks"</div>
                    <div class="stat-value text-primary">{move || summary.get().task_count}</div>
                </div>

                <div class="stat">
                    <div class="stat-title">"Average Progress"</div>
                    <div class="stat-value text-secondary">{move || format!("{}%", summary.get().average_progress)}</div>
                    <div class="stat-desc">
                        <progress class="progress progress-secondary w-32" value=move || summary.get().average_progress max="100"></progress>
                    </div>
                </div>

                <Show when=move || show_invoices>
                    <div class="stat">
                        <div class="stat-title">"Invoices Paid"</div>
                        <div class="stat-value text-success">{move || summary.get().invoices_paid}</div>
                    </div>

                    <div class="stat">
                        <div class="stat-title">"Invoices Pending"</div>
                        <div class="stat-value text-warning">{move || summary.get().invoices_pending}</div>
                    </div>
                </Show>
            </div>
        </div>
    }
    .into_any()
}
