//! Posts Page
//!
//! Post table, upload form and edit dialog. Clip times are entered as
//! `m:ss`; the controller converts them to seconds before upload.

use leptos::*;
use std::rc::Rc;

use autopost_console::controller::{Modal as EditState, PostRow};
use autopost_console::{PostForm, PostId, PostManager, RowAction};

use super::BrowserConfirm;
use crate::api::{BrowserFile, HttpStore};
use crate::components::{InlineLoading, Loading, Modal, TextArea, TextInput};
use crate::state::global::GlobalState;

type Manager = Rc<PostManager<HttpStore, BrowserConfirm>>;
type Form = PostForm<BrowserFile>;

#[derive(Clone)]
struct PostsPage {
    manager: Manager,
    rows: RwSignal<Vec<PostRow>>,
    edit: RwSignal<EditState<PostId, Form>>,
    loaded: RwSignal<bool>,
}

impl PostsPage {
    fn new() -> Self {
        Self {
            manager: Rc::new(PostManager::new(HttpStore::from_storage(), BrowserConfirm)),
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

/// Posts page component
#[component]
pub fn Posts() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let page = PostsPage::new();

    let page_for_load = page.clone();
    spawn_local(async move {
        if let Err(e) = page_for_load.manager.list().await {
            state.show_error(&format!("Failed to load posts: {}", e));
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
                <h1 class="text-3xl font-bold">"Posts"</h1>
                <p class="text-gray-400 mt-1">"Videos queued for posting"</p>
            </div>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Upload post"</h2>
                <UploadForm page=page_for_form />
            </section>

            <section class="bg-gray-800 rounded-xl p-6 overflow-x-auto">
                <PostTable page=page_for_table />
            </section>

            <Modal
                title="Edit post"
                open=Signal::derive(move || edit.with(|m| m.is_open()))
                on_close=on_close
            >
                <EditPostForm page=page.clone() />
            </Modal>
        </div>
    }
}

#[component]
fn UploadForm(page: PostsPage) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let form = create_rw_signal(page.manager.form());
    let file_input = create_node_ref::<html::Input>();
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_submitting.set(true);

        let page = page.clone();
        let state = state.clone();
        let submitted = form.get();
        spawn_local(async move {
            match page.manager.create(submitted).await {
                Ok(()) => {
                    state.show_success("Post uploaded");
                    if let Some(input) = file_input.get_untracked() {
                        input.set_value("");
                    }
                }
                Err(e) => state.show_error(&format!("Failed to upload post: {}", e)),
            }
            form.set(page.manager.form());
            page.sync();
            set_submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="grid md:grid-cols-2 gap-4">
            <PostFields form=form />
            <label class="flex flex-col space-y-1 text-sm md:col-span-2">
                <span class="text-gray-400">"Video file (mp4, mov, avi)"</span>
                <input
                    type="file"
                    accept=".mp4,.mov,.avi"
                    node_ref=file_input
                    on:change=move |ev| form.update(|f| f.media = picked_file(&ev))
                />
            </label>
            <div class="md:col-span-2">
                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                           disabled:cursor-not-allowed rounded-lg px-6 py-2 font-semibold
                           flex items-center space-x-2"
                >
                    {move || if submitting.get() {
                        view! { <InlineLoading /> <span>"Uploading..."</span> }.into_view()
                    } else {
                        view! { <span>"Upload"</span> }.into_view()
                    }}
                </button>
            </div>
        </form>
    }
}

#[component]
fn EditPostForm(page: PostsPage) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let buffer = page
        .edit
        .with_untracked(|m| m.buffer().cloned())
        .unwrap_or_default();
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
                Ok(()) => state.show_success("Post updated"),
                Err(e) => state.show_error(&format!("Failed to update post: {}", e)),
            }
            page.sync();
            set_saving.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="grid gap-4">
            <PostFields form=form />
            <label class="flex flex-col space-y-1 text-sm">
                <span class="text-gray-400">"Replace video (optional)"</span>
                <input
                    type="file"
                    accept=".mp4,.mov,.avi"
                    on:change=move |ev| form.update(|f| f.media = picked_file(&ev))
                />
            </label>
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

/// Text inputs shared by the upload form and the edit dialog
#[component]
fn PostFields(form: RwSignal<Form>) -> impl IntoView {
    view! {
        <div class="md:col-span-2">
            <TextArea
                label="Caption"
                value=Signal::derive(move || form.with(|f| f.caption.clone()))
                on_input=Callback::new(move |v| form.update(|f| f.caption = v))
            />
        </div>
        <div class="md:col-span-2">
            <TextArea
                label="Reply"
                value=Signal::derive(move || form.with(|f| f.reply_content.clone()))
                on_input=Callback::new(move |v| form.update(|f| f.reply_content = v))
            />
        </div>
        <TextInput
            label="Clip start"
            placeholder="m:ss"
            value=Signal::derive(move || form.with(|f| f.start_time.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.start_time = v))
        />
        <TextInput
            label="Clip end"
            placeholder="m:ss"
            value=Signal::derive(move || form.with(|f| f.end_time.clone()))
            on_input=Callback::new(move |v| form.update(|f| f.end_time = v))
        />
    }
}

/// First file of an `<input type="file">` change event
fn picked_file(ev: &web_sys::Event) -> Option<BrowserFile> {
    event_target::<web_sys::HtmlInputElement>(ev)
        .files()
        .and_then(|files| files.get(0))
        .map(BrowserFile::from)
}

#[component]
fn PostTable(page: PostsPage) -> impl IntoView {
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
                    <p class="text-gray-400 text-sm">"No posts yet"</p>
                }.into_view();
            }

            let page = page.clone();
            view! {
                <table class="w-full text-left text-sm">
                    <thead class="text-gray-400 border-b border-gray-700">
                        <tr>
                            <th class="py-2">"ID"</th>
                            <th class="py-2">"File"</th>
                            <th class="py-2">"Caption"</th>
                            <th class="py-2">"Reply"</th>
                            <th class="py-2">"Start"</th>
                            <th class="py-2">"End"</th>
                            <th class="py-2">"Actions"</th>
                        </tr>
                    </thead>
                    <tbody>
                        {rows.into_iter().map(|row| view! {
                            <PostRowView row=row page=page.clone() />
                        }).collect_view()}
                    </tbody>
                </table>
            }.into_view()
        }}
    }
}

#[component]
fn PostRowView(row: PostRow, page: PostsPage) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

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
        <tr class="border-b border-gray-700 last:border-0 align-top">
            <td class="py-2">{row.id}</td>
            <td class="py-2">{row.filename}</td>
            <td class="py-2 max-w-xs">{preview(&row.caption)}</td>
            <td class="py-2 max-w-xs">{preview(&row.reply_content)}</td>
            <td class="py-2">{placeholder_if_empty(row.start_time)}</td>
            <td class="py-2">{placeholder_if_empty(row.end_time)}</td>
            <td class="py-2 whitespace-nowrap">{buttons}</td>
        </tr>
    }
}

async fn run_row_action(page: &PostsPage, state: &GlobalState, action: RowAction<PostId>) {
    match action {
        RowAction::Edit(id) => {
            if let Err(e) = page.manager.edit(id).await {
                state.show_error(&format!("Failed to load post: {}", e));
            }
        }
        RowAction::Delete(id) => match page.manager.remove(id).await {
            Ok(true) => state.show_success("Post deleted"),
            Ok(false) => {}
            Err(e) => state.show_error(&format!("Failed to delete post: {}", e)),
        },
    }
    page.sync();
}

const PREVIEW_CHARS: usize = 60;

/// Caption shortened for the table
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS - 1).collect();
    format!("{}…", cut)
}

fn placeholder_if_empty(time: String) -> String {
    if time.is_empty() {
        "-".to_string()
    } else {
        time
    }
}
