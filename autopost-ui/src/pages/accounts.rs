//! Accounts Page
//!
//! Account table with an add form and an edit dialog.

use leptos::*;
use std::rc::Rc;

use autopost_console::controller::{AccountRow, Modal as EditState};
use autopost_console::{AccountForm, AccountId, AccountManager, RowAction};

use super::BrowserConfirm;
use crate::api::HttpStore;
use crate::components::{Loading, Modal, TextInput};
use crate::state::global::GlobalState;

type Manager = Rc<AccountManager<HttpStore, BrowserConfirm>>;

/// Controller plus the signals mirroring its state
#[derive(Clone)]
struct AccountsPage {
    manager: Manager,
    rows: RwSignal<Vec<AccountRow>>,
    edit: RwSignal<EditState<AccountId, AccountForm>>,
    loaded: RwSignal<bool>,
}

impl AccountsPage {
    fn new() -> Self {
        let manager = Rc::new(AccountManager::new(HttpStore::from_storage(), BrowserConfirm));
        Self {
            manager,
            rows: create_rw_signal(Vec::new()),
            edit: create_rw_signal(EditState::Closed),
            loaded: create_rw_signal(false),
        }
    }

    fn sync(&self) {
        self.rows.set(self.manager.rows());
        self.edit.set(self.manager.modal());
    }
}

/// Accounts page component
#[component]
pub fn Accounts() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let page = AccountsPage::new();

    let page_for_load = page.clone();
    let state_for_load = state.clone();
    spawn_local(async move {
        if let Err(e) = page_for_load.manager.list().await {
            state_for_load.show_error(&format!("Failed to load accounts: {}", e));
        }
        page_for_load.sync();
        page_for_load.loaded.set(true);
    });

    let page_for_close = page.clone();
    let on_close = Callback::new(move |_| {
        page_for_close.manager.close_modal();
        page_for_close.sync();
    });

    let edit = page.edit;
    let page_for_form = page.clone();
    let page_for_table = page.clone();

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Accounts"</h1>
                <p class="text-gray-400 mt-1">"Accounts the server posts from"</p>
            </div>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Add account"</h2>
                <AddAccountForm page=page_for_form />
            </section>

            <section class="bg-gray-800 rounded-xl p-6">
                <AccountTable page=page_for_table />
            </section>

            <Modal
                title="Edit account"
                open=Signal::derive(move || edit.with(|m| m.is_open()))
                on_close=on_close
            >
                <EditAccountForm page=page.clone() />
            </Modal>
        </div>
    }
}

#[component]
fn AddAccountForm(page: AccountsPage) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let form = create_rw_signal(page.manager.form());
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_submitting.set(true);

        let page = page.clone();
        let state = state.clone();
        let submitted = form.get();
        spawn_local(async move {
            match page.manager.create(submitted).await {
                Ok(()) => state.show_success("Account added"),
                Err(e) => state.show_error(&format!("Failed to add account: {}", e)),
            }
            // The controller resets the form only on success
            form.set(page.manager.form());
            page.sync();
            set_submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="grid md:grid-cols-2 gap-4">
            <AccountFields form=form />
            <div class="md:col-span-2">
                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                           disabled:cursor-not-allowed rounded-lg px-6 py-2 font-semibold"
                >
                    {move || if submitting.get() { "Adding..." } else { "Add account" }}
                </button>
            </div>
        </form>
    }
}

#[component]
fn EditAccountForm(page: AccountsPage) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let buffer = page.edit.with_untracked(|m| m.buffer().cloned()).unwrap_or_default();
    let form = create_rw_signal(buffer);
    let (saving, set_saving) = create_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(id) = page.edit.with_untracked(|m| m.editing()) else {
            return;
        };
        set_saving.set(true);

        let page = page.clone();
        let state = state.clone();
        let submitted = form.get();
        spawn_local(async move {
            match page.manager.save(id, submitted).await {
                Ok(()) => state.show_success("Account updated"),
                Err(e) => state.show_error(&format!("Failed to update account: {}", e)),
            }
            page.sync();
            set_saving.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="grid gap-4">
            <AccountFields form=form />
            <button
                type="submit"
                disabled=move || saving.get()
                class="bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600 rounded-lg py-2 font-semibold"
            >
                "Save changes"
            </button>
        </form>
    }
}

/// Inputs shared by the add form and the edit dialog
#[component]
fn AccountFields(form: RwSignal<AccountForm>) -> impl IntoView {
    view! {
        <TextInput
            label="Username"
            value=Signal::derive(move || form.with(|f| f.username.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.username = v))
        />
        <TextInput
            label="Consumer key"
            value=Signal::derive(move || form.with(|f| f.consumer_key.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.consumer_key = v))
        />
        <TextInput
            label="Consumer secret"
            secret=true
            value=Signal::derive(move || form.with(|f| f.consumer_secret.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.consumer_secret = v))
        />
        <TextInput
            label="Access token"
            value=Signal::derive(move || form.with(|f| f.access_token.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.access_token = v))
        />
        <TextInput
            label="Access token secret"
            secret=true
            value=Signal::derive(move || form.with(|f| f.access_token_secret.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.access_token_secret = v))
        />
        <label class="flex items-center space-x-2">
            <input
                type="checkbox"
                prop:checked=move || form.with(|f| f.post_flag)
                on:change=move |ev| {
                    let checked = event_target_checked(&ev);
                    form.update(|f| f.post_flag = checked);
                }
            />
            <span>"Posting enabled"</span>
        </label>
    }
}

#[component]
fn AccountTable(page: AccountsPage) -> impl IntoView {
    let rows = page.rows;
    let loaded = page.loaded;

    view! {
        {move || {
            if !loaded.get() {
                return view! { <Loading /> }.into_view();
            }
            let rows = rows.get();
            if rows.is_empty() {
                return view! {
                    <p class="text-gray-400 text-sm">"No accounts yet"</p>
                }.into_view();
            }

            let page = page.clone();
            view! {
                <table class="w-full text-left text-sm">
                    <thead class="text-gray-400 border-b border-gray-700">
                        <tr>
                            <th class="py-2">"ID"</th>
                            <th class="py-2">"Username"</th>
                            <th class="py-2">"Posting"</th>
                            <th class="py-2">"Actions"</th>
                        </tr>
                    </thead>
                    <tbody>
                        {rows.into_iter().map(|row| view! {
                            <AccountRowView row=row page=page.clone() />
                        }).collect_view()}
                    </tbody>
                </table>
            }.into_view()
        }}
    }
}

#[component]
fn AccountRowView(row: AccountRow, page: AccountsPage) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let badge = flag_badge_class(row.posting_enabled);
    let label = row.flag_label();

    let buttons = row
        .actions
        .into_iter()
        .map(|action| {
            let page = page.clone();
            let state = state.clone();
            let on_click = move |_| {
                let page = page.clone();
                let state = state.clone();
                spawn_local(async move {
                    run_row_action(&page, &state, action).await;
                });
            };
            view! {
                <button
                    class="px-3 py-1 rounded bg-gray-700 hover:bg-gray-600 mr-2"
                    on:click=on_click
                >
                    {action.label()}
                </button>
            }
        })
        .collect_view();

    view! {
        <tr class="border-b border-gray-700 last:border-0">
            <td class="py-2">{row.id}</td>
            <td class="py-2">{row.username}</td>
            <td class="py-2"><span class=badge>{label}</span></td>
            <td class="py-2">{buttons}</td>
        </tr>
    }
}

async fn run_row_action(page: &AccountsPage, state: &GlobalState, action: RowAction<AccountId>) {
    match action {
        RowAction::Edit(id) => {
            if let Err(e) = page.manager.edit(id).await {
                state.show_error(&format!("Failed to load account: {}", e));
            }
        }
        RowAction::Delete(id) => match page.manager.remove(id).await {
            Ok(true) => state.show_success("Account deleted"),
            Ok(false) => {}
            Err(e) => state.show_error(&format!("Failed to delete account: {}", e)),
        },
    }
    page.sync();
}

fn flag_badge_class(enabled: bool) -> &'static str {
    if enabled {
        "px-2 py-1 rounded bg-green-700 text-green-100"
    } else {
        "px-2 py-1 rounded bg-gray-700 text-gray-300"
    }
}
