//! 记录表单
//!
//! 字段按 `FieldKind` 渲染；所有输入都转发给控制器，表单本身不持有状态。
//! 字段列表只随筛选标签与创建/编辑模式变化，输入时不会重建 DOM。

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::schema::{FieldKind, FieldSpec};
use portal_shared::{Choice, ListState, log_warn};

use crate::components::resource_page::Controller;
use crate::web::file::{clear_input, read_as_data_url, selected_file};

/// 单个字段输入 (文件字段除外)
#[component]
pub fn FieldInput(
    field: &'static FieldSpec,
    #[prop(into)] value: Signal<String>,
    #[prop(into)] on_input: Callback<String>,
    #[prop(optional, into)] choices: Signal<Vec<Choice>>,
) -> impl IntoView {
    let id = format!("f-{}", field.name);
    let input_type = match field.kind {
        FieldKind::Email => "email",
        FieldKind::Password => "password",
        FieldKind::Number => "number",
        FieldKind::Date => "date",
        FieldKind::Month => "month",
        _ => "text",
    };

    let control = match field.kind {
        FieldKind::TextArea => view! {
            <textarea id=id class="textarea textarea-bordered w-full" rows="3"
                prop:value=move || value.get()
                on:input=move |ev| on_input.run(event_target_value(&ev))
            ></textarea>
        }
        .into_any(),
        FieldKind::Select(options) => view! {
            <select id=id class="select select-bordered w-full"
                prop:value=move || value.get()
                on:change=move |ev| on_input.run(event_target_value(&ev))
            >
                {options
                    .iter()
                    .map(|o| view! { <option value=o.value>{o.label}</option> })
                    .collect_view()}
            </select>
        }
        .into_any(),
        FieldKind::RemoteSelect(_) => view! {
            <select id=id class="select select-bordered w-full"
                prop:value=move || value.get()
                on:change=move |ev| on_input.run(event_target_value(&ev))
            >
                <option value="">{format!("Select {}", field.label)}</option>
                {move || choices
                    .get()
                    .into_iter()
                    .map(|c| view! { <option value=c.value>{c.label}</option> })
                    .collect_view()}
            </select>
        }
        .into_any(),
        FieldKind::Derived => view! {
            <input id=id type="text" readonly
                class="input input-bordered w-full bg-base-200 font-semibold"
                prop:value=move || value.get()
            />
        }
        .into_any(),
        _ => view! {
            <input id=id type=input_type
                step=(field.kind == FieldKind::Number).then_some("any")
                class="input input-bordered w-full"
                placeholder=(field.kind == FieldKind::Password).then_some("Leave blank to keep unchanged")
                prop:value=move || value.get()
                on:input=move |ev| on_input.run(event_target_value(&ev))
            />
        }
        .into_any(),
    };

    view! {
        <div class="form-control">
            <label for=format!("f-{}", field.name) class="label">
                <span class="label-text">{field.label}</span>
            </label>
            {control}
        </div>
    }
}

/// 附件字段：读成 data URL 后交给控制器检查大小与扩展名
#[component]
fn FileInput(
    field: &'static FieldSpec,
    ctl: StoredValue<Rc<Controller>, LocalStorage>,
    state: RwSignal<ListState>,
) -> impl IntoView {
    let accept = field
        .file_policy()
        .map(|p| {
            p.allowed_ext
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    let selected = move || state.with(|s| s.form.file(field.name).map(|f| f.name.clone()));

    let on_change = move |ev: web_sys::Event| {
        let Some(file) = selected_file(&ev) else {
            return;
        };
        spawn_local(async move {
            let upload = match read_as_data_url(file).await {
                Ok(upload) => upload,
                Err(e) => {
                    log_warn!("[Form] read {} failed: {}", field.name, e);
                    clear_input(&ev);
                    return;
                }
            };
            let rejected = ctl
                .try_with_value(|c| c.set_file(field.name, upload).is_err())
                .unwrap_or(true);
            if rejected {
                clear_input(&ev);
            }
        });
    };

    view! {
        <div class="form-control">
            <label for=format!("f-{}", field.name) class="label">
                <span class="label-text">{field.label}</span>
            </label>
            <input id=format!("f-{}", field.name) type="file"
                accept=(!accept.is_empty()).then_some(accept)
                class="file-input file-input-bordered w-full"
                on:change=on_change
            />
            {move || selected().map(|name| view! {
                <span class="label-text-alt mt-1 opacity-70">{name}</span>
            })}
        </div>
    }
}

/// 创建/编辑模态框
#[component]
pub fn RecordForm(
    ctl: StoredValue<Rc<Controller>, LocalStorage>,
    state: RwSignal<ListState>,
) -> impl IntoView {
    let schema = ctl.with_value(|c| c.schema());
    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();

    let open = Memo::new(move |_| state.with(|s| s.form_open));
    let editing = Memo::new(move |_| state.with(|s| s.editing.is_some()));
    let submitting = Memo::new(move |_| state.with(|s| s.submitting));
    let fields = Memo::new(move |_| {
        state.with(|s| {
            schema
                .visible_fields(s.filter.as_deref(), s.editing.is_some())
                .into_iter()
                .map(|f| f.name)
                .collect::<Vec<_>>()
        })
    });

    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            if open.get() {
                if !dialog.open() {
                    let _ = dialog.show_modal();
                }
            } else if dialog.open() {
                dialog.close();
            }
        }
    });

    let close = move || {
        ctl.with_value(|c| {
            if c.snapshot().form_open {
                c.close_form();
            }
        })
    };

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(c) = ctl.try_get_value() else {
            return;
        };
        spawn_local(async move {
            c.submit().await;
        });
    };

    let render_field = move |name: &'static str| {
        let Some(field) = schema.field(name) else {
            return ().into_any();
        };
        if let FieldKind::File(_) = field.kind {
            return view! { <FileInput field=field ctl=ctl state=state /> }.into_any();
        }
        let value = Signal::derive(move || state.with(|s| s.form.text(name).to_string()));
        let choices = Signal::derive(move || state.with(|s| s.choices_for(name).to_vec()));
        let on_input = Callback::new(move |v: String| ctl.with_value(|c| c.set_field(name, &v)));
        view! { <FieldInput field=field value=value on_input=on_input choices=choices /> }.into_any()
    };

    view! {
        <dialog class="modal" node_ref=dialog_ref on:close=move |_| close()>
            <div class="modal-box max-w-2xl">
                <h3 class="font-bold text-lg">
                    {move || if editing.get() {
                        format!("Edit {}", schema.title)
                    } else {
                        format!("New {}", schema.title)
                    }}
                </h3>

                {move || {
                    let hint = state.with(|s| s.hint.clone())?;
                    let label = schema.create_hint.map(|h| h.label)?;
                    Some(view! {
                        <div class="alert alert-info text-sm py-2 mt-4">
                            <span>{label} ": " <span class="font-mono font-semibold">{hint}</span></span>
                        </div>
                    })
                }}

                <form on:submit=on_submit class="space-y-4 mt-4">
                    <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                        <For each=move || fields.get() key=|name| *name children=render_field />
                    </div>

                    <div class="modal-action">
                        <button type="button" class="btn" on:click=move |_| close()>"Cancel"</button>
                        <button type="submit" class="btn btn-primary" disabled=move || submitting.get()>
                            {move || if submitting.get() {
                                view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                            } else {
                                "Save".into_any()
                            }}
                        </button>
                    </div>
                </form>
            </div>
        </dialog>
    }
}
