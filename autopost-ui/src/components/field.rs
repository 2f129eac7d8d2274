//! Form Fields
//!
//! Labelled inputs bound to a signal.

use leptos::*;

/// Single-line text input
#[component]
pub fn TextInput(
    label: &'static str,
    #[prop(into)]
    value: Signal<String>,
    on_input: Callback<String>,
    /// Render as a password field
    #[prop(default = false)]
    secret: bool,
    #[prop(optional)]
    placeholder: &'static str,
) -> impl IntoView {
    let input_type = if secret { "password" } else { "text" };

    view! {
        <label class="flex flex-col space-y-1 text-sm">
            <span class="text-gray-400">{label}</span>
            <input
                type=input_type
                placeholder=placeholder
                class="bg-gray-700 border border-gray-600 rounded-lg px-3 py-2 text-white"
                prop:value=move || value.get()
                on:input=move |ev| on_input.call(event_target_value(&ev))
            />
        </label>
    }
}

/// Multi-line text input
#[component]
pub fn TextArea(
    label: &'static str,
    #[prop(into)]
    value: Signal<String>,
    on_input: Callback<String>,
) -> impl IntoView {
    view! {
        <label class="flex flex-col space-y-1 text-sm">
            <span class="text-gray-400">{label}</span>
            <textarea
                rows="3"
                class="bg-gray-700 border border-gray-600 rounded-lg px-3 py-2 text-white"
                prop:value=move || value.get()
                on:input=move |ev| on_input.call(event_target_value(&ev))
            />
        </label>
    }
}
