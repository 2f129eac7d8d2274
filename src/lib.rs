//! # Autopost Console
//!
//! Admin console for a social-media auto-posting service. The server owns
//! posting, scheduling and persistence; this crate is the operator side:
//!
//! - a dashboard driven by a Socket.IO status channel (post now, start/stop
//!   the scheduler, recent activity)
//! - account management over `/api/accounts`
//! - post management over `/api/posts` with media uploads
//!
//! ## Modules
//!
//! - [`api`]: REST wire types, store traits and the `reqwest` client
//! - [`realtime`]: realtime events, Socket.IO framing and the tokio transport
//! - [`controller`]: page logic shared by the CLI and the browser front-end
//! - [`format`]: clip time (`m:ss`) and timestamp rendering
//! - [`config`]: TOML and environment configuration (native only)
//!
//! Without the default `native` feature the crate builds for
//! `wasm32-unknown-unknown`, leaving transports to the embedding front-end.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autopost_console::{AccountManager, Config, ConsoleClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = ConsoleClient::new(&config.server.url, config.request_timeout())?;
//!
//!     let accounts = AccountManager::new(client, |_: &str| true);
//!     accounts.list().await?;
//!
//!     for row in accounts.rows() {
//!         println!("{} {} ({})", row.id, row.username, row.flag_label());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod controller;
pub mod format;
pub mod realtime;

#[cfg(feature = "native")]
pub mod config;

pub use api::{
    Account, AccountForm, AccountId, AccountStore, ApiError, ApiResult, MediaFile, MediaSource,
    Post, PostForm, PostId, PostStore, PostUpload,
};

#[cfg(feature = "native")]
pub use api::{load_media, ConsoleClient};

pub use controller::{
    AccountManager, Confirm, Dashboard, DashboardConfig, DashboardView, PostManager, RowAction,
};

pub use format::{format_datetime, seconds_to_time, time_to_seconds, ClipTime, ClipTimeError};

pub use realtime::{
    AppStatus, ChannelError, ClientEvent, RealtimeChannel, ServerEvent, TransportEvent,
};

#[cfg(feature = "native")]
pub use realtime::{connect, RealtimeHandle, TransportConfig};

#[cfg(feature = "native")]
pub use config::{Config, ConfigError, LoggingConfig};
