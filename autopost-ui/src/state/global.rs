//! Global Application State
//!
//! Reactive state management using Leptos signals. The dashboard
//! controller lives here because the realtime connection outlives the
//! dashboard page.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

use autopost_console::{Dashboard, DashboardView};

use super::settings::UiSettings;
use super::websocket::WsChannel;

/// Dashboard controller shared between the page and the socket handlers
pub type SharedDashboard = Rc<RefCell<Dashboard<WsChannel>>>;

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Dashboard controller; mutate only through [`GlobalState::with_dashboard`]
    pub dashboard: SharedDashboard,
    /// Last rendered dashboard
    pub dashboard_view: RwSignal<DashboardView>,
    /// Outbound half of the realtime connection
    pub channel: WsChannel,
    /// Global loading state
    pub loading: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let settings = UiSettings::load();
    let channel = WsChannel::new(settings);
    let dashboard = Dashboard::new(channel.clone(), settings.dashboard());
    let view = dashboard.view();

    let state = GlobalState {
        dashboard: Rc::new(RefCell::new(dashboard)),
        dashboard_view: create_rw_signal(view),
        channel,
        loading: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Run a controller operation and publish the new view
    pub fn with_dashboard<R>(&self, f: impl FnOnce(&mut Dashboard<WsChannel>) -> R) -> R {
        let (result, view) = {
            let mut dashboard = self.dashboard.borrow_mut();
            let result = f(&mut dashboard);
            (result, dashboard.view())
        };
        self.dashboard_view.set(view);
        result
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}
