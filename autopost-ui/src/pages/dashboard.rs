//! Dashboard Page
//!
//! Live server status, auto-posting controls and recent activity.

use leptos::*;

use autopost_console::controller::{ActionKind, ActionState, ConnectionState, TrackedAction};

use crate::state::global::GlobalState;

/// Interval prefilled in the input, in minutes
const DEFAULT_INTERVAL: &str = "60";

/// Dashboard page component
#[component]
pub fn Dashboard() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = state.dashboard_view;

    let (interval, set_interval) = create_signal(DEFAULT_INTERVAL.to_string());

    let state_for_post = state.clone();
    let post_now = move |_| {
        state_for_post.with_dashboard(|d| d.post_now(chrono::Utc::now()));
    };

    let state_for_start = state.clone();
    let start = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let input = interval.get();
        let result = state_for_start
            .with_dashboard(|d| d.start_auto_posting(&input, chrono::Utc::now()));
        if let Err(e) = result {
            state_for_start.show_error(&e.to_string());
        }
    };

    let state_for_stop = state.clone();
    let stop = move |_| {
        state_for_stop.with_dashboard(|d| d.stop_auto_posting(chrono::Utc::now()));
    };

    let state_for_theme = state.clone();
    let toggle_theme = move |_| {
        state_for_theme.with_dashboard(|d| d.toggle_theme());
    };

    view! {
        <div class=move || theme_class(dashboard.get().dark_mode)>
            <div class="flex items-center justify-between mb-8">
                <div>
                    <h1 class="text-3xl font-bold">"Dashboard"</h1>
                    <p class="opacity-70 mt-1">
                        {move || dashboard.get().status_line}
                    </p>
                </div>

                <div class="flex items-center space-x-4">
                    <ConnectionBadge />
                    <button
                        class="px-3 py-2 rounded-lg border border-current opacity-80 hover:opacity-100"
                        on:click=toggle_theme
                    >
                        {move || if dashboard.get().dark_mode { "Light mode" } else { "Dark mode" }}
                    </button>
                </div>
            </div>

            <div class="grid md:grid-cols-2 gap-8">
                <section class="rounded-xl p-6 border border-gray-700">
                    <h2 class="text-xl font-semibold mb-4">"Auto-posting"</h2>
                    <p class="mb-4">{move || dashboard.get().auto_post_line}</p>

                    <form on:submit=start class="flex items-center space-x-2 mb-4">
                        <label class="text-sm opacity-80" for="interval">"Interval (minutes)"</label>
                        <input
                            id="interval"
                            type="number"
                            min="1"
                            class="w-24 bg-transparent border border-gray-600 rounded px-2 py-1"
                            prop:value=move || interval.get()
                            on:input=move |ev| set_interval.set(event_target_value(&ev))
                        />
                        <button
                            type="submit"
                            disabled=move || !dashboard.get().start_enabled
                            class="px-4 py-2 bg-green-600 hover:bg-green-700 disabled:bg-gray-600
                                   disabled:cursor-not-allowed rounded-lg font-medium"
                        >
                            "Start"
                        </button>
                        <button
                            type="button"
                            disabled=move || !dashboard.get().stop_enabled
                            on:click=stop
                            class="px-4 py-2 bg-red-600 hover:bg-red-700 disabled:bg-gray-600
                                   disabled:cursor-not-allowed rounded-lg font-medium"
                        >
                            "Stop"
                        </button>
                    </form>

                    <button
                        class="w-full bg-primary-600 hover:bg-primary-700 rounded-lg py-3 font-semibold"
                        on:click=post_now
                    >
                        "Post now"
                    </button>

                    <p class="text-sm mt-4 opacity-70">
                        {move || dashboard.get().last_action.as_ref().map(describe_action)}
                    </p>
                </section>

                <RecentActivity />
            </div>
        </div>
    }
}

/// Connected / disconnected pill
#[component]
fn ConnectionBadge() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = state.dashboard_view;

    view! {
        {move || {
            if dashboard.get().connection == ConnectionState::Connected {
                view! {
                    <span class="flex items-center space-x-1 text-green-400">
                        <span class="w-2 h-2 bg-green-400 rounded-full pulse" />
                        <span>"Connected"</span>
                    </span>
                }.into_view()
            } else {
                view! {
                    <span class="flex items-center space-x-1 text-red-400">
                        <span class="w-2 h-2 bg-red-400 rounded-full" />
                        <span>"Disconnected"</span>
                    </span>
                }.into_view()
            }
        }}
    }
}

/// Recent activity list, in the order the server sent it
#[component]
fn RecentActivity() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = state.dashboard_view;

    view! {
        <section class="rounded-xl p-6 border border-gray-700">
            <h2 class="text-xl font-semibold mb-4">"Recent Activity"</h2>

            <ul class="space-y-2 text-sm">
                {move || {
                    let activities = dashboard.get().activities;
                    if activities.is_empty() {
                        view! {
                            <li class="opacity-70">"No recent activity"</li>
                        }.into_view()
                    } else {
                        activities.into_iter().map(|line| view! {
                            <li class="py-2 border-b border-gray-700 last:border-0">{line}</li>
                        }).collect_view()
                    }
                }}
            </ul>
        </section>
    }
}

fn theme_class(dark_mode: bool) -> &'static str {
    if dark_mode {
        "space-y-8 bg-gray-900 text-white rounded-xl p-6"
    } else {
        "space-y-8 bg-white text-gray-900 rounded-xl p-6"
    }
}

/// One-line summary of the last optimistic action
fn describe_action(action: &TrackedAction) -> String {
    let what = match action.kind {
        ActionKind::PostNow => "Post now".to_string(),
        ActionKind::Start { interval } => format!("Start ({} min)", interval),
        ActionKind::Stop => "Stop".to_string(),
    };
    let outcome = match &action.state {
        ActionState::Pending => "waiting for server".to_string(),
        ActionState::Confirmed => "confirmed".to_string(),
        ActionState::Failed(reason) => format!("failed: {}", reason),
    };
    format!(
        "{} at {}: {}",
        what,
        action.issued_at.format("%H:%M:%S"),
        outcome
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn action(kind: ActionKind, state: ActionState) -> TrackedAction {
        TrackedAction {
            kind,
            state,
            issued_at: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap(),
        }
    }

    #[test]
    fn test_describe_pending_start() {
        let line = describe_action(&action(ActionKind::Start { interval: 15 }, ActionState::Pending));
        assert_eq!(line, "Start (15 min) at 12:30:05: waiting for server");
    }

    #[test]
    fn test_describe_failed_stop() {
        let line = describe_action(&action(
            ActionKind::Stop,
            ActionState::Failed("no confirmation from server".to_string()),
        ));
        assert_eq!(line, "Stop at 12:30:05: failed: no confirmation from server");
    }

    #[test]
    fn test_theme_class_follows_mode() {
        assert!(theme_class(true).contains("bg-gray-900"));
        assert!(theme_class(false).contains("bg-white"));
    }
}
