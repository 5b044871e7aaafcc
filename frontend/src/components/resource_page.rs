//! 通用资源页
//!
//! 每个管理页面 (任务、发票、工资单……) 都是同一个列表 + 表单 + 提交流程，
//! 差别全部由 `ResourceSchema` 描述。页面只订阅控制器的状态快照并转发用户操作。

use std::future::Future;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::payroll::{PRINT_BLOCKED, PayslipSheet};
use portal_shared::schema::{ColumnKind, ColumnSpec, StatusTransition};
use portal_shared::{
    ApiConfig, ListController, ListState, NoticeKind, Record, RecordStatus, ResourceSchema, Role,
};

use crate::badges::use_badges;
use crate::components::icons::{Download, Pencil, Plus, Printer, RefreshCw, Trash2};
use crate::components::record_form::RecordForm;
use crate::components::status_badge::{ProgressCell, StatusBadge};
use crate::session::{use_client, use_session};
use crate::web::FetchTransport;
use crate::web::dialog::confirm;
use crate::web::print::print_document;

pub type Controller = ListController<FetchTransport>;

type Handle = StoredValue<Rc<Controller>, LocalStorage>;

/// 页面已卸载时静默放弃
fn spawn_with<F, Fut>(ctl: Handle, f: F)
where
    F: FnOnce(Rc<Controller>) -> Fut,
    Fut: Future<Output = ()> + 'static,
{
    if let Some(c) = ctl.try_get_value() {
        spawn_local(f(c));
    }
}

// ============================================================================
// 单元格
// ============================================================================

pub(crate) fn render_cell(column: ColumnSpec, record: &Record, config: &ApiConfig) -> AnyView {
    match column.kind {
        ColumnKind::Text => record.display(column.field).into_any(),
        ColumnKind::Prefixed(prefix) => match record.display(column.field) {
            v if v.is_empty() => "-".into_any(),
            v => format!("{}{}", prefix, v).into_any(),
        },
        ColumnKind::Status { default } => {
            let status = record
                .status(column.field)
                .or_else(|| default.map(RecordStatus::parse));
            view! { <StatusBadge status=status /> }.into_any()
        }
        ColumnKind::Money => match record.number(column.field) {
            Some(v) => view! { <span class="font-mono">{format!("₹{:.2}", v)}</span> }.into_any(),
            None => "-".into_any(),
        },
        ColumnKind::Date => {
            let raw = record.display(column.field);
            // 后端返回 `YYYY-MM-DD HH:MM:SS`，表格只显示日期
            raw.split_whitespace().next().unwrap_or("-").to_string().into_any()
        }
        ColumnKind::Progress => {
            let value = record
                .number(column.field)
                .map(|v| v.clamp(0.0, 100.0).round() as u8)
                .unwrap_or(0);
            view! { <ProgressCell value=value /> }.into_any()
        }
        ColumnKind::File => match record.file_path(column.field) {
            Some(path) => file_link(config.file_url(path), "View".to_string()),
            None => view! { <span class="opacity-50">"No file"</span> }.into_any(),
        },
        ColumnKind::FileGroup {
            files_field,
            path_field,
            name_field,
        } => {
            let files = record.children(files_field);
            if files.is_empty() {
                return view! { <span class="opacity-50">"No files"</span> }.into_any();
            }
            view! {
                <div class="flex flex-col gap-1">
                    {files
                        .iter()
                        .filter_map(|f| {
                            let path = f.file_path(path_field)?;
                            let name = match f.display(name_field) {
                                n if n.is_empty() => path.rsplit('/').next().unwrap_or(path).to_string(),
                                n => n,
                            };
                            Some(file_link(config.file_url(path), name))
                        })
                        .collect_view()}
                </div>
            }
            .into_any()
        }
    }
}

fn file_link(href: String, label: String) -> AnyView {
    view! {
        <a href=href target="_blank" rel="noopener" class="link link-primary inline-flex items-center gap-1">
            <Download attr:class="h-4 w-4" /> {label}
        </a>
    }
    .into_any()
}

// ============================================================================
// 行操作
// ============================================================================

#[component]
fn ProgressControl(ctl: Handle, record: Record, current: u8) -> impl IntoView {
    let (value, set_value) = signal(current);
    let record = StoredValue::new(record);

    let on_update = move |_| {
        let value = value.get_untracked();
        spawn_with(ctl, move |c| async move {
            let record = record.get_value();
            c.update_progress(&record, value).await;
        });
    };

    view! {
        <div class="join">
            <input type="number" min="0" max="100"
                class="input input-bordered input-xs join-item w-16"
                prop:value=move || value.get().to_string()
                on:input=move |ev| {
                    let v = event_target_value(&ev).parse::<u16>().unwrap_or(0).min(100) as u8;
                    set_value.set(v);
                }
            />
            <button class="btn btn-xs btn-primary join-item" on:click=on_update>"Update"</button>
        </div>
    }
}

fn row_actions(ctl: Handle, state: RwSignal<ListState>, record: Record, role: Role) -> AnyView {
    let schema = ctl.with_value(|c| c.schema());
    let filter = state.with_untracked(|s| s.filter.clone());
    let filter = filter.as_deref();

    let transitions: Vec<&'static StatusTransition> = schema
        .transitions
        .iter()
        .filter(|t| t.applies_to(&record, schema.status_field, role))
        .collect();
    let progress = schema
        .progress
        .filter(|p| p.roles.contains(&role) && !p.locked(&record, schema.status_field));
    let can_edit = schema.can_edit(role, filter);
    let can_delete = schema.can_delete(role, filter);
    let record = StoredValue::new(record);

    view! {
        <div class="flex flex-wrap justify-end items-center gap-2">
            {transitions
                .into_iter()
                .map(|t| {
                    let on_click = move |_| {
                        spawn_with(ctl, move |c| async move {
                            let record = record.get_value();
                            c.transition(t, &record).await;
                        });
                    };
                    view! { <button class="btn btn-xs btn-success" on:click=on_click>{t.label}</button> }
                })
                .collect_view()}
            {progress.map(|p| {
                let current = record.with_value(|r| p.current(r));
                view! { <ProgressControl ctl=ctl record=record.get_value() current=current /> }
            })}
            {schema.printable.then(|| {
                let on_click = move |_| {
                    let sheet = record.with_value(PayslipSheet::from_record);
                    if !print_document(&sheet.title(), &sheet.to_html()) {
                        ctl.with_value(|c| c.show_error(PRINT_BLOCKED));
                    }
                };
                view! {
                    <button class="btn btn-ghost btn-xs btn-square" title="Print" on:click=on_click>
                        <Printer attr:class="h-4 w-4" />
                    </button>
                }
            })}
            {can_edit.then(|| {
                let on_click = move |_| {
                    spawn_with(ctl, move |c| async move {
                        let record = record.get_value();
                        c.open_edit(&record).await;
                    });
                };
                view! {
                    <button class="btn btn-ghost btn-xs btn-square" title="Edit" on:click=on_click>
                        <Pencil attr:class="h-4 w-4" />
                    </button>
                }
            })}
            {can_delete.then(|| {
                let on_click = move |_| {
                    spawn_with(ctl, move |c| async move {
                        let record = record.get_value();
                        c.delete(&record, confirm).await;
                    });
                };
                view! {
                    <button class="btn btn-ghost btn-xs btn-square text-error" title="Delete" on:click=on_click>
                        <Trash2 attr:class="h-4 w-4" />
                    </button>
                }
            })}
        </div>
    }
    .into_any()
}

// ============================================================================
// 页面
// ============================================================================

#[component]
pub fn ResourcePage(schema: &'static ResourceSchema) -> impl IntoView {
    let session = use_session();
    let Some(identity) = session.identity(schema.realm).get_untracked() else {
        return ().into_any();
    };
    let role = identity.role;
    let badges = use_badges();
    let config = StoredValue::new(use_client().config().clone());

    let controller = Rc::new(ListController::new(use_client(), schema, identity));
    let state = RwSignal::new(controller.snapshot());
    let subscription = controller.subscribe(move |snapshot| {
        // 页面卸载后的迟到结果直接丢弃
        let _ = state.try_set(snapshot.clone());
    });
    let ctl: Handle = StoredValue::new_local(controller);
    on_cleanup(move || {
        let _ = ctl.try_with_value(|c| c.unsubscribe(subscription));
    });

    let load = move || {
        spawn_with(ctl, move |c| async move {
            // 打开带角标的页面即视为已读；加载失败时保留原有已访问集合
            if let Some((kind, ids)) = c.load_visited().await {
                badges.mark_visited(kind, ids);
            }
        });
    };
    load();

    let loading = Memo::new(move |_| state.with(|s| s.loading));
    let filter = Memo::new(move |_| state.with(|s| s.filter.clone()));
    let rows = Memo::new(move |_| state.with(|s| s.visible_items(schema)));
    let columns = Memo::new(move |_| {
        filter.with(|f| {
            schema
                .visible_columns(f.as_deref())
                .into_iter()
                .copied()
                .collect::<Vec<_>>()
        })
    });
    let can_create = move || filter.with(|f| schema.can_create(role, f.as_deref()));
    let has_actions = move || {
        filter.with(|f| {
            !schema.transitions.is_empty()
                || schema.printable
                || schema.progress.is_some_and(|p| p.roles.contains(&role))
                || schema.can_edit(role, f.as_deref())
                || schema.can_delete(role, f.as_deref())
        })
    };

    let on_create = move |_| spawn_with(ctl, |c| async move { c.open_create().await });

    view! {
        <div class="space-y-6">
            {move || state.with(|s| s.notice.clone()).map(|notice| {
                let class = match notice.kind {
                    NoticeKind::Success => "alert alert-success shadow",
                    NoticeKind::Error => "alert alert-error shadow",
                };
                view! {
                    <div role="alert" class=class>
                        <span class="whitespace-pre-line">{notice.text}</span>
                        <button class="btn btn-ghost btn-xs" on:click=move |_| ctl.with_value(|c| c.dismiss_notice())>"✕"</button>
                    </div>
                }
            })}

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body p-0">
                    <div class="flex flex-wrap items-center justify-between gap-4 p-6 pb-2">
                        <h3 class="card-title">{schema.title}</h3>
                        <div class="flex flex-wrap items-center gap-2">
                            {schema.searchable.then(|| view! {
                                <input type="search" placeholder="Search..."
                                    class="input input-bordered input-sm w-48"
                                    prop:value=move || state.with(|s| s.query.clone())
                                    on:input=move |ev| ctl.with_value(|c| c.set_query(&event_target_value(&ev)))
                                />
                            })}
                            <button on:click=move |_| load() disabled=move || loading.get() class="btn btn-ghost btn-circle btn-sm">
                                <RefreshCw attr:class=move || if loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                            </button>
                            <Show when=can_create>
                                <button class="btn btn-primary btn-sm gap-2" on:click=on_create>
                                    <Plus attr:class="h-4 w-4" /> {format!("Add {}", schema.title)}
                                </button>
                            </Show>
                        </div>
                    </div>

                    {schema.filter.map(|tabs| view! {
                        <div role="tablist" class="tabs tabs-boxed mx-6 w-fit">
                            {tabs.tabs.iter().map(|tab| {
                                let value = tab.value;
                                let class = move || if filter.with(|f| f.as_deref() == Some(value)) { "tab tab-active" } else { "tab" };
                                let on_click = move |_| spawn_with(ctl, move |c| async move { c.set_filter(value).await });
                                view! { <a role="tab" class=class on:click=on_click>{tab.label}</a> }
                            }).collect_view()}
                        </div>
                    })}

                    <div class="overflow-x-auto w-full">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    {move || columns.get().into_iter().map(|c| view! { <th>{c.title}</th> }).collect_view()}
                                    <Show when=has_actions><th></th></Show>
                                </tr>
                            </thead>
                            <tbody>
                                {move || {
                                    let span = (columns.with(Vec::len) + 1).to_string();
                                    let items = rows.get();
                                    if items.is_empty() {
                                        let text = if loading.get() { "Loading..." } else { schema.empty_text };
                                        return view! {
                                            <tr>
                                                <td colspan=span class="text-center py-8 text-base-content/50">{text}</td>
                                            </tr>
                                        }
                                        .into_any();
                                    }
                                    let cols = columns.get();
                                    let show_actions = has_actions();
                                    config.with_value(|config| {
                                        items
                                            .into_iter()
                                            .map(|record| {
                                                let cells = cols
                                                    .iter()
                                                    .map(|c| view! { <td>{render_cell(*c, &record, config)}</td> })
                                                    .collect_view();
                                                let actions = show_actions
                                                    .then(|| view! { <td>{row_actions(ctl, state, record.clone(), role)}</td> });
                                                view! { <tr>{cells}{actions}</tr> }
                                            })
                                            .collect_view()
                                            .into_any()
                                    })
                                }}
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>

            <RecordForm ctl=ctl state=state />
        </div>
    }
    .into_any()
}
