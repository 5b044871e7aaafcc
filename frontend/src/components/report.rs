//! 员工完整报表 (管理员)
//!
//! 选择员工后拉取任务统计、累计工资、EPFO 计数与工资单。
//! 快速切换员工时只展示最后一次选择的结果。

use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::payroll::format_inr;
use portal_shared::report::REPORT_PAYSLIP_COLUMNS;
use portal_shared::{Choice, EmployeeReport, RecordStatus};

use crate::components::resource_page::render_cell;
use crate::components::status_badge::StatusBadge;
use crate::session::use_client;

#[component]
fn StatCard(title: &'static str, value: String, #[prop(optional)] highlight: bool) -> impl IntoView {
    let class = if highlight { "stat-value text-primary" } else { "stat-value" };
    view! {
        <div class="stat">
            <div class="stat-title">{title}</div>
            <div class=class>{value}</div>
        </div>
    }
}

fn report_view(report: EmployeeReport) -> impl IntoView {
    let config = use_client().config().clone();
    let tasks = report.tasks;

    let epfo = if report.epfo.is_empty() {
        view! { <p class="text-sm opacity-60">"No EPFO requests found"</p> }.into_any()
    } else {
        report
            .epfo
            .into_iter()
            .map(|e| {
                let status = Some(RecordStatus::parse(&e.status));
                view! {
                    <span class="flex items-center gap-2 rounded-full border border-base-300 px-3 py-1 text-sm">
                        <StatusBadge status=status />
                        <b>{e.count}</b>
                    </span>
                }
            })
            .collect_view()
            .into_any()
    };

    let payslips = if report.payslips.is_empty() {
        view! {
            <tr>
                <td colspan=REPORT_PAYSLIP_COLUMNS.len().to_string() class="text-center py-8 text-base-content/50">
                    "No payslips generated yet"
                </td>
            </tr>
        }
        .into_any()
    } else {
        report
            .payslips
            .iter()
            .map(|record| {
                let cells = REPORT_PAYSLIP_COLUMNS
                    .iter()
                    .map(|c| view! { <td>{render_cell(*c, record, &config)}</td> })
                    .collect_view();
                view! { <tr>{cells}</tr> }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
            <StatCard title="Total Tasks" value=tasks.total.to_string() />
            <StatCard title="Completed Tasks" value=tasks.completed.to_string() />
            <StatCard title="Remaining Tasks" value=tasks.remaining.to_string() />
            <StatCard title="Total Salary Earned" value=format!("₹ {}", format_inr(report.salary)) highlight=true />
        </div>

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">"EPFO Requests"</h3>
                <div class="flex flex-wrap gap-2">{epfo}</div>
            </div>
        </div>

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <h3 class="card-title p-6 pb-2">"Salary Payslips"</h3>
                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                {REPORT_PAYSLIP_COLUMNS.iter().map(|c| view! { <th>{c.title}</th> }).collect_view()}
                            </tr>
                        </thead>
                        <tbody>{payslips}</tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn ReportPage() -> impl IntoView {
    let client = StoredValue::new_local(use_client());

    let (employees, set_employees) = signal(Vec::<Choice>::new());
    let (selected, set_selected) = signal(String::new());
    let (report, set_report) = signal(Option::<EmployeeReport>::None);
    let (loading, set_loading) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    if let Some(client) = client.try_get_value() {
        spawn_local(async move {
            match client.report_employees().await {
                Ok(list) => {
                    let _ = set_employees.try_set(list);
                }
                Err(e) => {
                    let _ = set_error_msg.try_set(Some(e.user_message()));
                }
            }
        });
    }

    let on_select = move |ev: leptos::ev::Event| {
        let id = event_target_value(&ev);
        set_selected.set(id.clone());
        set_report.set(None);
        set_error_msg.set(None);
        if id.is_empty() {
            set_loading.set(false);
            return;
        }
        let Some(client) = client.try_get_value() else {
            return;
        };
        set_loading.set(true);
        spawn_local(async move {
            let result = client.employee_report(&id).await;
            // 期间又选了别人：丢弃
            if selected.try_get_untracked().as_deref() != Some(id.as_str()) {
                return;
            }
            match result {
                Ok(r) => {
                    let _ = set_report.try_set(Some(r));
                }
                Err(e) => {
                    let _ = set_error_msg.try_set(Some(e.user_message()));
                }
            }
            let _ = set_loading.try_set(false);
        });
    };

    view! {
        <div class="space-y-6">
            <div class="flex flex-wrap items-center justify-between gap-4">
                <h2 class="text-2xl font-bold">"Employee Reports"</h2>
                <select class="select select-bordered w-full sm:w-72"
                    prop:value=move || selected.get()
                    on:change=on_select
                >
                    <option value="">"Select Employee"</option>
                    {move || employees.get().into_iter().map(|c| view! {
                        <option value=c.value>{c.label}</option>
                    }).collect_view()}
                </select>
            </div>

            {move || error_msg.get().map(|msg| view! {
                <div role="alert" class="alert alert-error shadow">
                    <span>{msg}</span>
                </div>
            })}

            <Show when=move || loading.get()>
                <div class="flex items-center gap-2 text-sm opacity-70">
                    <span class="loading loading-spinner loading-sm"></span>
                    "Loading report..."
                </div>
            </Show>

            {move || report.get().map(report_view)}
        </div>
    }
}
