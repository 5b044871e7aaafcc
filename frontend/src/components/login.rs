use crate::components::icons::ShieldCheck;
use crate::session::{use_client, use_session};
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::{AppRoute, Realm};

#[component]
pub fn LoginPage(realm: Realm) -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let client = StoredValue::new_local(use_client());

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let (title, subtitle, placeholder) = match realm {
        Realm::User => (
            "Employer & Employee Portal",
            "Sign in with your portal account",
            "you@company.com",
        ),
        Realm::Admin => (
            "Admin Console",
            "Sign in with your administrator account",
            "admin@company.com",
        ),
    };

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        if is_submitting.get_untracked() {
            return;
        }
        let (email, password) = (email.get_untracked(), password.get_untracked());
        if email.trim().is_empty() || password.is_empty() {
            set_error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let client = client.get_value();
        spawn_local(async move {
            match client.login(realm, &email, &password).await {
                Ok(identity) => {
                    session.sign_in(realm, identity);
                    router.navigate(AppRoute::home_route(realm));
                }
                Err(e) => {
                    let _ = set_error_msg.try_set(Some(e.user_message()));
                }
            }
            let _ = set_is_submitting.try_set(false);
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <div class="flex flex-col items-center gap-2">
                        <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                            <ShieldCheck attr:class="h-8 w-8" />
                        </div>
                        <h1 class="text-3xl font-bold">{title}</h1>
                        <p class="text-base-content/70">{subtitle}</p>
                    </div>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        {move || error_msg.get().map(|msg| view! {
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <svg xmlns="http://www.w3.org/2000/svg" class="stroke-current shrink-0 h-6 w-6" fill="none" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M10 14l2-2m0 0l2-2m-2 2l-2-2m2 2l2 2m7-2a9 9 0 11-18 0 9 9 0 0118 0z" /></svg>
                                <span>{msg}</span>
                            </div>
                        })}

                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email"</span>
                            </label>
                            <input
                                id="email"
                                type="email"
                                placeholder=placeholder
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                                prop:value=email
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <input
                                id="password"
                                type="password"
                                placeholder="••••••••"
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                                prop:value=password
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                                } else {
                                    "Sign in".into_any()
                                }}
                            </button>
                        </div>
                        {match realm {
                            Realm::User => view! {
                                <p class="text-center text-sm text-base-content/60 mt-2">
                                    "Administrator? "
                                    <Link to=AppRoute::AdminLogin class="link link-primary">"Sign in here"</Link>
                                </p>
                            }.into_any(),
                            Realm::Admin => ().into_any(),
                        }}
                    </form>
                </div>
            </div>
        </div>
    }
}
