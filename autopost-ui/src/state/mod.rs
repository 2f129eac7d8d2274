//! State Management
//!
//! Global application state, UI settings and the realtime connection.

pub mod global;
pub mod settings;
pub mod websocket;

pub use global::{provide_global_state, GlobalState};
pub use settings::UiSettings;
pub use websocket::{init_realtime, WsChannel};
