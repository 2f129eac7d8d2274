//! Modal Component
//!
//! Centered dialog used by the edit forms.

use leptos::*;

/// Dialog shown while `open` is true
#[component]
pub fn Modal(
    #[prop(into)]
    title: String,
    #[prop(into)]
    open: Signal<bool>,
    /// Called by the close button and the backdrop
    on_close: Callback<()>,
    children: ChildrenFn,
) -> impl IntoView {
    let title = store_value(title);
    let children = store_value(children);

    view! {
        {move || {
            if open.get() {
                view! {
                    <div class="fixed inset-0 z-40 flex items-center justify-center">
                        <div
                            class="absolute inset-0 bg-gray-900/70"
                            on:click=move |_| on_close.call(())
                        />
                        <div class="relative bg-gray-800 rounded-xl shadow-xl w-full max-w-lg p-6">
                            <div class="flex items-center justify-between mb-4">
                                <h2 class="text-xl font-semibold">{title.get_value()}</h2>
                                <button
                                    class="text-gray-400 hover:text-white text-2xl leading-none"
                                    on:click=move |_| on_close.call(())
                                >
                                    "×"
                                </button>
                            </div>
                            {children.with_value(|children| children())}
                        </div>
                    </div>
                }.into_view()
            } else {
                view! {}.into_view()
            }
        }}
    }
}
