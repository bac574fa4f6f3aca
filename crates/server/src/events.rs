use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientConnected {
        client_id: u64,
        addr: SocketAddr,
        entity_id: u32,
    },
    ClientDisconnected {
        client_id: u64,
        reason: DisconnectReason,
    },
    ConnectionDenied {
        addr: SocketAddr,
        reason: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Client sent `Disconnect`.
    Graceful,
    /// Client sent something that is not a valid frame or message.
    ProtocolViolation,
    /// Socket closed or failed.
    Dropped,
    Shutdown,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::ProtocolViolation => "violated the protocol",
            DisconnectReason::Dropped => "dropped",
            DisconnectReason::Shutdown => "closed by shutdown",
        }
    }
}
