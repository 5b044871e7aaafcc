//! 资料页：只读信息 + 可编辑字段
//!
//! 保存成功后重新拉取，并把新名字写回会话。

use std::collections::BTreeMap;

use crate::components::record_form::FieldInput;
use crate::session::{use_client, use_session};
use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::controller::SAVED;
use portal_shared::resources::profile_for;
use portal_shared::{NoticeKind, Realm, Record};
use serde_json::{Map, Value};

#[component]
pub fn ProfilePage(realm: Realm) -> impl IntoView {
    let session = use_session();
    let client = StoredValue::new_local(use_client());
    let spec = profile_for(realm);

    let (profile, set_profile) = signal(Option::<Record>::None);
    let values = RwSignal::new(BTreeMap::<&'static str, String>::new());
    let (loading, set_loading) = signal(false);
    let (saving, set_saving) = signal(false);
    let (notice, set_notice) = signal(Option::<(NoticeKind, String)>::None);

    let load = move || {
        let Some(identity) = session.identity(realm).get_untracked() else {
            return;
        };
        let Some(client) = client.try_get_value() else {
            return;
        };
        let _ = set_loading.try_set(true);
        spawn_local(async move {
            match client.fetch_profile(spec, &identity).await {
                Ok(record) => {
                    let filled = spec
                        .fields
                        .iter()
                        .map(|f| match f.name {
                            "password" => (f.name, String::new()),
                            name => (name, record.display(name)),
                        })
                        .collect();
                    let _ = values.try_set(filled);
                    let _ = set_profile.try_set(Some(record));
                }
                Err(e) => {
                    let _ = set_notice.try_set(Some((NoticeKind::Error, e.user_message())));
                }
            }
            let _ = set_loading.try_set(false);
        });
    };
    load();

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(identity) = session.identity(realm).get_untracked() else {
            return;
        };
        if saving.get_untracked() {
            return;
        }
        let body: Map<String, Value> = values.with_untracked(|v| {
            v.iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect()
        });
        let new_name = body.get("name").and_then(Value::as_str).map(str::to_string);

        set_saving.set(true);
        set_notice.set(None);
        let client = client.get_value();
        spawn_local(async move {
            match client.save_profile(spec, &identity, body).await {
                Ok(outcome) => {
                    if let Some(name) = new_name.filter(|n| !n.trim().is_empty() && *n != identity.name) {
                        let mut updated = identity.clone();
                        updated.name = name;
                        session.sign_in(realm, updated);
                    }
                    let text = outcome.message.unwrap_or_else(|| SAVED.to_string());
                    let _ = set_notice.try_set(Some((NoticeKind::Success, text)));
                    load();
                }
                Err(e) => {
                    let _ = set_notice.try_set(Some((NoticeKind::Error, e.user_message())));
                }
            }
            let _ = set_saving.try_set(false);
        });
    };

    view! {
        <div class="space-y-6">
            {move || notice.get().map(|(kind, text)| {
                let class = match kind {
                    NoticeKind::Success => "alert alert-success shadow",
                    NoticeKind::Error => "alert alert-error shadow",
                };
                view! {
                    <div role="alert" class=class>
                        <span>{text}</span>
                        <button class="btn btn-ghost btn-xs" on:click=move |_| set_notice.set(None)>"✕"</button>
                    </div>
                }
            })}

            <div class="grid grid-cols-1 lg:grid-cols-3 gap-6">
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        <h3 class="card-title">"Profile"</h3>
                        <Show when=move || !loading.get() fallback=|| view! { <span class="loading loading-spinner text-primary"></span> }>
                            <dl class="space-y-2">
                                {spec.info.iter().map(|&(field, label)| view! {
                                    <div>
                                        <dt class="text-xs uppercase opacity-60">{label}</dt>
                                        <dd class="font-medium">
                                            {move || profile.with(|p| {
                                                p.as_ref()
                                                    .map(|r| r.display(field))
                                                    .filter(|v| !v.is_empty())
                                                    .unwrap_or_else(|| "-".to_string())
                                            })}
                                        </dd>
                                    </div>
                                }).collect_view()}
                            </dl>
                        </Show>
                    </div>
                </div>

                <div class="card bg-base-100 shadow-xl lg:col-span-2">
                    <form class="card-body" on:submit=on_submit>
                        <h3 class="card-title">"Edit Profile"</h3>
                        <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                            {spec.fields.iter().map(|field| {
                                let name = field.name;
                                let value = Signal::derive(move || {
                                    values.with(|v| v.get(name).cloned().unwrap_or_default())
                                });
                                let on_input = Callback::new(move |v: String| {
                                    values.update(|m| {
                                        m.insert(name, v);
                                    })
                                });
                                view! { <FieldInput field=field value=value on_input=on_input /> }
                            }).collect_view()}
                        </div>
                        <div class="card-actions justify-end mt-4">
                            <button type="submit" class="btn btn-primary" disabled=move || saving.get() || loading.get()>
                                {move || if saving.get() {
                                    view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                                } else {
                                    "Save Changes".into_any()
                                }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </div>
    }
}
