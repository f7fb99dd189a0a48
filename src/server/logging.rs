//! Structured logging for the activation server.
//!
//! Each accepted connection runs inside a `session` span carrying a unique
//! session id and the peer address. Session events record only the response
//! token kind; fingerprints, serials and issued keys are never logged.

use std::net::SocketAddr;
use std::str::FromStr;

use tracing::{info, info_span, warn, Level, Span};
use uuid::Uuid;

use crate::config::LoggingConfig;

/// Session lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connection accepted
    Connected,
    /// Activation key issued
    Issued,
    /// Request answered with an error token
    Rejected,
    /// Peer closed the stream
    Closed,
    /// Peer sent the disconnect message
    Disconnected,
    /// Read or write deadline passed
    TimedOut,
    /// Request line exceeded the size limit
    Oversized,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionEvent::Connected => "connected",
            SessionEvent::Issued => "issued",
            SessionEvent::Rejected => "rejected",
            SessionEvent::Closed => "closed",
            SessionEvent::Disconnected => "disconnected",
            SessionEvent::TimedOut => "timed_out",
            SessionEvent::Oversized => "oversized",
        };
        write!(f, "{}", s)
    }
}

/// Log a session event within the current span.
///
/// `details` is a short non-secret label such as the response token kind.
pub fn log_session_event(event: SessionEvent, details: Option<&str>) {
    match event {
        SessionEvent::Rejected | SessionEvent::TimedOut | SessionEvent::Oversized => {
            if let Some(d) = details {
                warn!(event = %event, details = %d, "Session event occurred");
            } else {
                warn!(event = %event, "Session event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(event = %event, details = %d, "Session event occurred");
            } else {
                info!(event = %event, "Session event occurred");
            }
        }
    }
}

/// Generate a new unique session ID.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping everything logged for one connection.
pub fn session_span(session_id: &str, peer: &SocketAddr) -> Span {
    info_span!("session", session_id = %session_id, peer = %peer)
}

/// Install the global fmt subscriber according to `config`.
///
/// Does nothing when logging is disabled or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) {
    if !config.enabled {
        return;
    }
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
