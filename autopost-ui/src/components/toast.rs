//! Toast Notification Component
//!
//! Outcome of account and post operations. Errors stay a little longer
//! than successes and can be dismissed.

use leptos::*;

use crate::state::global::GlobalState;

/// Toast notification container
#[component]
pub fn Toast() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let success = state.success;
    let error = state.error;

    view! {
        <div class="fixed bottom-4 right-4 z-50 space-y-2">
            {move || {
                success.get().map(|msg| view! {
                    <ToastMessage
                        message=msg
                        variant=ToastVariant::Success
                        on_dismiss=Callback::new(move |_| success.set(None))
                    />
                })
            }}

            {move || {
                error.get().map(|msg| view! {
                    <ToastMessage
                        message=msg
                        variant=ToastVariant::Error
                        on_dismiss=Callback::new(move |_| error.set(None))
                    />
                })
            }}
        </div>
    }
}

#[derive(Clone, Copy)]
enum ToastVariant {
    Success,
    Error,
}

#[component]
fn ToastMessage(
    #[prop(into)]
    message: String,
    variant: ToastVariant,
    on_dismiss: Callback<()>,
) -> impl IntoView {
    let (icon, bg_class) = match variant {
        ToastVariant::Success => ("✓", "bg-green-600"),
        ToastVariant::Error => ("✕", "bg-red-600"),
    };

    view! {
        <div class=format!(
            "flex items-center space-x-3 {} text-white px-4 py-3 rounded-lg shadow-lg animate-slide-in",
            bg_class
        )>
            <span class="text-lg">{icon}</span>
            <span class="text-sm font-medium flex-1">{message}</span>
            <button
                class="text-white/70 hover:text-white"
                on:click=move |_| on_dismiss.call(())
            >
                "×"
            </button>
        </div>
    }
}
