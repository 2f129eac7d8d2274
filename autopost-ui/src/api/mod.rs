//! Backend Access
//!
//! `gloo-net` implementation of the console's store traits.

pub mod client;

pub use client::{get_server_url, set_server_url, BrowserFile, HttpStore};
