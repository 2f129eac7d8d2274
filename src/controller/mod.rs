//! Console Controllers
//!
//! Page logic shared by the CLI and the browser front-end. Controllers own
//! their view state and talk to the backend only through the store and
//! channel traits, so each front-end supplies its own transport.
//!
//! - [`dashboard`]: realtime status and auto-posting commands
//! - [`accounts`]: account table, add form, edit modal
//! - [`posts`]: post table, upload form, edit modal
//! - [`table`]: row actions, refetch ordering, confirmation prompt

pub mod accounts;
pub mod dashboard;
pub mod posts;
pub mod table;

pub use accounts::{AccountManager, AccountRow};
pub use dashboard::{
    parse_interval, ActionKind, ActionState, AutoPostState, ConnectionState, Dashboard,
    DashboardConfig, DashboardView, IntervalError, Phase, TrackedAction,
    DEFAULT_CONFIRM_TIMEOUT_SECS,
};
pub use posts::{PostManager, PostRow};
pub use table::{Confirm, ListSequencer, ListTicket, Modal, RowAction};
