//! Autopost Console (browser)
//!
//! Operator front-end for the auto-posting server, built with Leptos (WASM).
//!
//! # Pages
//!
//! - Dashboard: live status over Socket.IO, post now, start/stop the scheduler
//! - Accounts: add, edit and delete posting accounts
//! - Posts: upload videos with captions and clip times
//!
//! Page logic comes from the `autopost-console` controllers; this crate
//! supplies the `fetch` and WebSocket transports and the views.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
