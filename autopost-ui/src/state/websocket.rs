//! WebSocket Client
//!
//! Socket.IO connection to the posting server for live status. Emits are
//! refused until the namespace is joined; nothing is queued for a later
//! connection.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use autopost_console::realtime::packet::{connect_frame, encode_event, Packet, SocketPacket};
use autopost_console::realtime::{interpret, socket_url, DEFAULT_SOCKET_PATH};
use autopost_console::{ChannelError, ClientEvent, RealtimeChannel, TransportEvent};

use super::global::GlobalState;
use super::settings::UiSettings;
use crate::api;

#[derive(Default)]
struct Connection {
    ws: Option<WebSocket>,
    joined: bool,
    /// The current socket reported an error
    errored: bool,
    reconnect_attempts: u32,
    gave_up: bool,
}

/// Whether an emit may go out right now
fn emit_gate(gave_up: bool, joined: bool) -> Result<(), ChannelError> {
    if gave_up {
        Err(ChannelError::Closed)
    } else if !joined {
        Err(ChannelError::NotConnected)
    } else {
        Ok(())
    }
}

/// What a socket close means to the dashboard. A socket that failed before
/// joining never connected, so the close repeats the connection error
/// instead of overwriting it.
fn close_event(errored: bool, was_joined: bool, code: u16) -> TransportEvent {
    if errored && !was_joined {
        TransportEvent::ConnectError {
            message: format!("WebSocket error (close code {})", code),
        }
    } else {
        TransportEvent::Disconnected {
            reason: format!("close code {}", code),
        }
    }
}

/// Outbound half of the realtime connection
#[derive(Clone, Default)]
pub struct WsChannel {
    inner: Rc<RefCell<Connection>>,
    settings: UiSettings,
}

impl WsChannel {
    pub fn new(settings: UiSettings) -> Self {
        Self {
            inner: Rc::default(),
            settings,
        }
    }

    /// Open the WebSocket and wire its events into the dashboard
    pub fn connect(&self, state: GlobalState) {
        let url = socket_url(&api::get_server_url(), DEFAULT_SOCKET_PATH);

        match WebSocket::new(&url) {
            Ok(ws) => {
                self.setup_handlers(&ws, state);
                let mut conn = self.inner.borrow_mut();
                conn.ws = Some(ws);
                conn.joined = false;
                conn.errored = false;
            }
            Err(e) => {
                web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                deliver(
                    &state,
                    TransportEvent::ConnectError {
                        message: format!("{:?}", e),
                    },
                );
                self.schedule_reconnect(state);
            }
        }
    }

    /// Set up WebSocket event handlers
    fn setup_handlers(&self, ws: &WebSocket, state: GlobalState) {
        // On message
        let channel = self.clone();
        let state_clone = state.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                channel.handle_frame(&text, &state_clone);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close
        let channel = self.clone();
        let state_clone = state.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!(
                    "WebSocket closed: code={}, reason={}",
                    event.code(),
                    event.reason()
                )
                .into(),
            );
            let (errored, was_joined) = {
                let mut conn = channel.inner.borrow_mut();
                let flags = (conn.errored, conn.joined);
                conn.ws = None;
                conn.joined = false;
                flags
            };
            deliver(&state_clone, close_event(errored, was_joined, event.code()));
            channel.schedule_reconnect(state_clone.clone());
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error; a close always follows and reports it
        let channel = self.clone();
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
            channel.inner.borrow_mut().errored = true;
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    fn handle_frame(&self, text: &str, state: &GlobalState) {
        let packet = match Packet::decode(text) {
            Ok(packet) => packet,
            Err(e) => {
                web_sys::console::warn_1(&format!("Dropping frame {:?}: {}", text, e).into());
                return;
            }
        };

        match &packet {
            Packet::Open(_) => self.send_raw(&connect_frame()),
            Packet::Ping => self.send_raw(&Packet::Pong.encode()),
            Packet::Message(SocketPacket::Connect(_)) => self.on_joined(),
            _ => {}
        }

        if let Some(event) = interpret(packet) {
            deliver(state, event);
        }
    }

    fn on_joined(&self) {
        let mut conn = self.inner.borrow_mut();
        conn.joined = true;
        conn.reconnect_attempts = 0;
    }

    fn send_raw(&self, frame: &str) {
        let conn = self.inner.borrow();
        if let Some(ws) = conn.ws.as_ref() {
            if let Err(e) = ws.send_with_str(frame) {
                web_sys::console::error_1(&format!("WebSocket send failed: {:?}", e).into());
            }
        }
    }

    /// Schedule a reconnect attempt
    fn schedule_reconnect(&self, state: GlobalState) {
        let attempts = self.inner.borrow().reconnect_attempts;
        if attempts >= self.settings.max_reconnect_attempts {
            web_sys::console::error_1(&"Max reconnect attempts reached".into());
            self.inner.borrow_mut().gave_up = true;
            return;
        }

        let delay = self.settings.reconnect_delay(attempts);
        self.inner.borrow_mut().reconnect_attempts = attempts + 1;

        let channel = self.clone();
        gloo_timers::callback::Timeout::new(delay, move || {
            web_sys::console::log_1(
                &format!("Attempting reconnect (attempt {})", attempts + 1).into(),
            );
            channel.connect(state);
        })
        .forget();
    }
}

impl RealtimeChannel for WsChannel {
    fn emit(&self, event: ClientEvent) -> Result<(), ChannelError> {
        let conn = self.inner.borrow();
        emit_gate(conn.gave_up, conn.joined)?;
        let ws = conn.ws.as_ref().ok_or(ChannelError::NotConnected)?;
        ws.send_with_str(&encode_event(&event))
            .map_err(|e| ChannelError::Send(format!("{:?}", e)))
    }
}

/// Hand a transport event to the dashboard controller
fn deliver(state: &GlobalState, event: TransportEvent) {
    state.with_dashboard(|dashboard| dashboard.handle(event));
}

/// Initialize the realtime connection (call from app root)
pub fn init_realtime(state: GlobalState) {
    state.channel.connect(state.clone());
    state.with_dashboard(|dashboard| dashboard.on_load());

    // Unanswered actions roll back once their confirmation window passes
    let state_for_tick = state.clone();
    gloo_timers::callback::Interval::new(1000, move || {
        let expired = state_for_tick
            .dashboard
            .borrow_mut()
            .expire_pending(chrono::Utc::now());
        if expired {
            state_for_tick.with_dashboard(|_| ());
        }
    })
    .forget();
}
