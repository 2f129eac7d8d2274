//! UI Components
//!
//! Reusable Leptos components shared by the pages.

pub mod field;
pub mod loading;
pub mod modal;
pub mod nav;
pub mod toast;

pub use field::{TextArea, TextInput};
pub use loading::{InlineLoading, Loading};
pub use modal::Modal;
pub use nav::Nav;
pub use toast::Toast;
