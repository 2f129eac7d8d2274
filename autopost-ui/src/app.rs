//! App Root Component
//!
//! Routing, global state and the realtime connection.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::components::{Nav, Toast};
use crate::pages::{Accounts, Dashboard, Posts};
use crate::state::global::{provide_global_state, GlobalState};
use crate::state::websocket::init_realtime;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    // The socket lives for the whole session, not just the dashboard page
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    init_realtime(state);

    view! {
        <Router>
            <div class="min-h-screen bg-gray-900 text-white flex flex-col">
                <Nav />

                <main class="flex-1 container mx-auto px-4 py-8 pb-24">
                    <Routes>
                        <Route path="/" view=Dashboard />
                        <Route path="/accounts" view=Accounts />
                        <Route path="/posts" view=Posts />
                        <Route path="/*any" view=NotFound />
                    </Routes>
                </main>

                <Footer />

                <Toast />
            </div>
        </Router>
    }
}

/// Footer with the server address and connection status
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = state.dashboard_view;
    let server = api::get_server_url();

    view! {
        <footer class="fixed bottom-0 left-0 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm">
                <span class="text-gray-400">{server}</span>
                <span class="text-gray-300">{move || dashboard.get().status_line}</span>
                <ServerSettings />
            </div>
        </footer>
    }
}

/// Inline editor for the server URL kept in local storage
#[component]
fn ServerSettings() -> impl IntoView {
    let (editing, set_editing) = create_signal(false);
    let (url, set_url) = create_signal(api::get_server_url());

    let save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        api::set_server_url(&url.get());
        // Stores and socket read the URL at startup
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    };

    view! {
        {move || {
            if editing.get() {
                view! {
                    <form on:submit=save class="flex items-center space-x-2">
                        <input
                            type="url"
                            class="bg-gray-700 border border-gray-600 rounded px-2 py-1 text-white"
                            prop:value=move || url.get()
                            on:input=move |ev| set_url.set(event_target_value(&ev))
                        />
                        <button type="submit" class="text-primary-400 hover:text-primary-300">"Save"</button>
                    </form>
                }.into_view()
            } else {
                view! {
                    <button
                        class="text-gray-400 hover:text-white"
                        on:click=move |_| set_editing.set(true)
                    >
                        "Change server"
                    </button>
                }.into_view()
            }
        }}
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <h1 class="text-3xl font-bold mb-2">"Page Not Found"</h1>
            <p class="text-gray-400 mb-6">"The page you're looking for doesn't exist."</p>
            <A
                href="/"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
            >
                "Go to Dashboard"
            </A>
        </div>
    }
}
