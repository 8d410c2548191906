//! Channel connection state.

use std::fmt;

/// Lifecycle of the persistent connection.
///
/// ```text
/// Connecting ──open──► Open ──close/error──► ClosedRetrying
///     ▲                                            │
///     └──────────── reconnect delay ───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Connecting,
    Open,
    ClosedRetrying,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::ClosedRetrying => write!(f, "closed (retrying)"),
        }
    }
}

/// Connectivity change reported to the channel's consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}
