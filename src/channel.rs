//! Realtime channel manager.
//!
//! Owns the one live WebSocket for a session context, announces presence as
//! the first outbound frame, and re-establishes the connection on loss with a
//! fixed delay. Close code 1008 is the server's authentication-rejection
//! signal and is terminal: no reconnect is ever scheduled for it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::console;
use gloo::timers::callback::Timeout;
use thiserror::Error;
use url::form_urlencoded;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

/// Policy-violation close code, reserved for credential rejection.
pub const AUTH_REJECT_CLOSE_CODE: u16 = 1008;

/// Fixed reconnect delay. No cap on attempts, no jitter.
pub const RECONNECT_DELAY_MS: u32 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Open,
    Closed,
}

/// What to do after an unexpected close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    /// Credential rejected: clear it and force re-entry. Never retried.
    AuthRejected,
    Reconnect { delay_ms: u32 },
}

pub fn disposition_for_close(code: u16) -> CloseDisposition {
    if code == AUTH_REJECT_CLOSE_CODE {
        CloseDisposition::AuthRejected
    } else {
        CloseDisposition::Reconnect {
            delay_ms: RECONNECT_DELAY_MS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    /// No stored credential; the caller redirects to the entry screen instead
    /// of attempting a connection that would be rejected server-side.
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("failed to open websocket to {url}")]
    Connect { url: String },
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("channel is not connected")]
    NotConnected,
}

/// Builds a connection URL carrying the credential (and any context ids) as
/// query parameters. Fails fast when the credential is absent.
pub fn authenticated_url(
    base: &str,
    token: Option<&str>,
    params: &[(&str, &str)],
) -> Result<String, ChannelError> {
    let token = token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ChannelError::NotAuthenticated)?;
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("token", token);
    for (key, value) in params {
        query.append_pair(key, value);
    }
    Ok(format!("{base}?{}", query.finish()))
}

/// App-side callbacks for channel events. Dispatch is single-threaded and
/// in received order; no frame is processed concurrently with another.
#[derive(Clone)]
pub struct ChannelHooks {
    /// Runs after the presence frame has been sent on a fresh connection.
    pub on_open: Rc<dyn Fn()>,
    /// Receives each raw text frame.
    pub on_frame: Rc<dyn Fn(String)>,
    pub on_status: Rc<dyn Fn(ChannelStatus)>,
    /// Terminal: the server rejected the credential (close code 1008).
    pub on_auth_rejected: Rc<dyn Fn()>,
}

#[allow(dead_code)]
struct WsHandlers {
    onopen: Closure<dyn FnMut(Event)>,
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    onerror: Closure<dyn FnMut(ErrorEvent)>,
    onclose: Closure<dyn FnMut(CloseEvent)>,
}

struct ChannelInner {
    url: String,
    presence_frame: String,
    hooks: ChannelHooks,
    ws: RefCell<Option<WebSocket>>,
    handlers: RefCell<Option<WsHandlers>>,
    closing: Cell<bool>,
    status: Cell<ChannelStatus>,
    reconnect: RefCell<Option<Timeout>>,
}

/// The single live connection for a session context. `open` and `close` are
/// the only mutators; dropping or closing cancels any pending reconnect so a
/// stale timer can never resurrect a channel for a torn-down session.
pub struct Channel {
    inner: Rc<ChannelInner>,
}

impl Channel {
    /// Opens a connection and registers the presence frame to send first on
    /// every (re)connect.
    pub fn open(
        url: String,
        presence_frame: String,
        hooks: ChannelHooks,
    ) -> Result<Channel, ChannelError> {
        let inner = Rc::new(ChannelInner {
            url,
            presence_frame,
            hooks,
            ws: RefCell::new(None),
            handlers: RefCell::new(None),
            closing: Cell::new(false),
            status: Cell::new(ChannelStatus::Connecting),
            reconnect: RefCell::new(None),
        });
        connect(&inner)?;
        Ok(Channel { inner })
    }

    pub fn status(&self) -> ChannelStatus {
        self.inner.status.get()
    }

    pub fn is_open(&self) -> bool {
        self.inner.status.get() == ChannelStatus::Open
    }

    /// Sends a text frame if and only if the socket is open. Nothing is
    /// queued for later delivery.
    pub fn send(&self, frame: &str) -> Result<(), SendError> {
        let guard = self.inner.ws.borrow();
        let ws = guard.as_ref().ok_or(SendError::NotConnected)?;
        if ws.ready_state() != WebSocket::OPEN {
            return Err(SendError::NotConnected);
        }
        ws.send_with_str(frame).map_err(|_| SendError::NotConnected)
    }

    /// Tears the channel down: cancels any pending reconnect, detaches the
    /// handlers before closing the socket so no stale callback fires.
    pub fn close(&self) {
        self.inner.closing.set(true);
        self.inner.reconnect.borrow_mut().take();
        if let Some(ws) = self.inner.ws.borrow_mut().take() {
            detach(&ws);
            let _ = ws.close();
        }
        self.inner.handlers.borrow_mut().take();
        self.inner.status.set(ChannelStatus::Closed);
    }
}

fn detach(ws: &WebSocket) {
    ws.set_onopen(None);
    ws.set_onmessage(None);
    ws.set_onerror(None);
    ws.set_onclose(None);
}

fn connect(inner: &Rc<ChannelInner>) -> Result<(), ChannelError> {
    let ws = WebSocket::new(&inner.url).map_err(|_| ChannelError::Connect {
        url: inner.url.clone(),
    })?;
    inner.status.set(ChannelStatus::Connecting);
    *inner.ws.borrow_mut() = Some(ws.clone());

    let onopen = {
        let inner = inner.clone();
        let ws = ws.clone();
        Closure::wrap(Box::new(move |_event: Event| {
            inner.status.set(ChannelStatus::Open);
            run_open_sequence(
                &inner.presence_frame,
                &mut |frame| ws.send_with_str(frame).is_ok(),
                &inner.hooks,
            );
        }) as Box<dyn FnMut(Event)>)
    };

    let onmessage = {
        let inner = inner.clone();
        Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                (inner.hooks.on_frame)(String::from(text));
            }
        }) as Box<dyn FnMut(MessageEvent)>)
    };

    let onerror = {
        let url = inner.url.clone();
        Closure::wrap(Box::new(move |_event: ErrorEvent| {
            // The close event that follows drives the reconnect policy.
            console::warn!("websocket error", url.clone());
        }) as Box<dyn FnMut(ErrorEvent)>)
    };

    let onclose = {
        let inner = inner.clone();
        Closure::wrap(Box::new(move |event: CloseEvent| {
            inner.ws.borrow_mut().take();
            if inner.closing.get() {
                return;
            }
            console::log!("websocket closed", inner.url.clone(), event.code());
            inner.status.set(ChannelStatus::Closed);
            (inner.hooks.on_status)(ChannelStatus::Closed);
            match disposition_for_close(event.code()) {
                CloseDisposition::AuthRejected => (inner.hooks.on_auth_rejected)(),
                CloseDisposition::Reconnect { delay_ms } => schedule_reconnect(&inner, delay_ms),
            }
        }) as Box<dyn FnMut(CloseEvent)>)
    };

    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    *inner.handlers.borrow_mut() = Some(WsHandlers {
        onopen,
        onmessage,
        onerror,
        onclose,
    });
    Ok(())
}

/// Everything that happens on a freshly opened socket, in order: the
/// presence frame goes out before any app hook can observe the connection.
/// Server-side membership is derived from that frame.
fn run_open_sequence(
    presence_frame: &str,
    send_frame: &mut dyn FnMut(&str) -> bool,
    hooks: &ChannelHooks,
) {
    if !send_frame(presence_frame) {
        console::warn!("failed to send presence frame");
    }
    (hooks.on_status)(ChannelStatus::Open);
    (hooks.on_open)();
}

fn schedule_reconnect(inner: &Rc<ChannelInner>, delay_ms: u32) {
    let timer = {
        let inner = inner.clone();
        Timeout::new(delay_ms, move || {
            if inner.closing.get() {
                return;
            }
            if connect(&inner).is_err() {
                console::warn!("reconnect failed, retrying", inner.url.clone());
                schedule_reconnect(&inner, RECONNECT_DELAY_MS);
            }
        })
    };
    *inner.reconnect.borrow_mut() = Some(timer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejection_close_is_terminal() {
        assert_eq!(
            disposition_for_close(AUTH_REJECT_CLOSE_CODE),
            CloseDisposition::AuthRejected
        );
    }

    #[test]
    fn other_close_codes_reconnect_after_fixed_delay() {
        for code in [1000, 1001, 1006, 1011] {
            assert_eq!(
                disposition_for_close(code),
                CloseDisposition::Reconnect { delay_ms: 3_000 }
            );
        }
    }

    #[test]
    fn url_embeds_credential_and_context() {
        let url = authenticated_url(
            "ws://localhost:8000/ws",
            Some("abc123"),
            &[("lobby", "lobby-1")],
        )
        .unwrap();
        assert_eq!(url, "ws://localhost:8000/ws?token=abc123&lobby=lobby-1");
    }

    #[test]
    fn url_escapes_query_values() {
        let url = authenticated_url("ws://h/ws", Some("a b&c"), &[]).unwrap();
        assert_eq!(url, "ws://h/ws?token=a+b%26c");
    }

    #[test]
    fn presence_frame_goes_out_before_any_hook_runs() {
        let trace: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let hooks = ChannelHooks {
            on_open: {
                let trace = trace.clone();
                Rc::new(move || trace.borrow_mut().push("open".to_string()))
            },
            on_frame: Rc::new(|_| {}),
            on_status: {
                let trace = trace.clone();
                Rc::new(move |status| trace.borrow_mut().push(format!("status {status:?}")))
            },
            on_auth_rejected: Rc::new(|| {}),
        };
        let mut send = {
            let trace = trace.clone();
            move |frame: &str| {
                trace.borrow_mut().push(format!("send {frame}"));
                true
            }
        };
        run_open_sequence("look", &mut send, &hooks);
        assert_eq!(
            *trace.borrow(),
            vec![
                "send look".to_string(),
                "status Open".to_string(),
                "open".to_string(),
            ]
        );
    }

    #[test]
    fn missing_credential_fails_before_any_connection_attempt() {
        assert!(matches!(
            authenticated_url("ws://h/ws", None, &[]),
            Err(ChannelError::NotAuthenticated)
        ));
        assert!(matches!(
            authenticated_url("ws://h/ws", Some("   "), &[]),
            Err(ChannelError::NotAuthenticated)
        ));
    }
}
