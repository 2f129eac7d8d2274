//! Pages
//!
//! Top-level page components for each route.

pub mod accounts;
pub mod dashboard;
pub mod posts;

pub use accounts::Accounts;
pub use dashboard::Dashboard;
pub use posts::Posts;

use autopost_console::Confirm;

/// `window.confirm()` prompt; a missing window counts as "no"
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserConfirm;

impl Confirm for BrowserConfirm {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|window| window.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}
