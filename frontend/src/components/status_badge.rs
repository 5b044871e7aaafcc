use leptos::prelude::*;
use portal_shared::RecordStatus;

/// 状态徽章；空状态使用列的默认状态，再没有则显示占位符
#[component]
pub fn StatusBadge(status: Option<RecordStatus>) -> impl IntoView {
    match status {
        Some(status) => {
            let class = format!("badge {} capitalize", status.badge_class());
            view! { <span class=class>{status.label()}</span> }.into_any()
        }
        None => view! { <span class="opacity-50">"-"</span> }.into_any(),
    }
}

/// 进度条 + 百分比
#[component]
pub fn ProgressCell(value: u8) -> impl IntoView {
    view! {
        <div class="flex items-center gap-2 min-w-32">
            <progress class="progress progress-primary w-24" value=value max="100"></progress>
            <span class="text-xs opacity-70">{format!("{}%", value)}</span>
        </div>
    }
}
