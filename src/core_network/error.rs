// Errors for the PORT handshake and the outbound data connection
use crate::core_network::port::DataAddress;
use crate::helpers::Reply;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortError {
    #[error("PORT requires an argument")]
    Missing,

    #[error("expected 6 comma-separated fields, got {0}")]
    FieldCount(usize),

    #[error("invalid host field {0:?}")]
    InvalidHost(String),

    #[error("invalid port field {0:?}")]
    InvalidPortField(String),

    #[error("port {0} is outside 1024-65535")]
    OutOfRange(u64),
}

impl PortError {
    pub fn to_ftp_response(&self) -> Reply {
        match self {
            PortError::Missing => Reply::new(501, "PORT requires an argument."),
            PortError::OutOfRange(port) => Reply::new(501, format!("Invalid port number: {}.", port)),
            _ => Reply::new(501, "Syntax error, expected h1,h2,h3,h4,p1,p2."),
        }
    }
}

#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: DataAddress,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: DataAddress, after: Duration },

    #[error("data transfer with {addr} stalled for {after:?}")]
    IoTimeout { addr: DataAddress, after: Duration },

    #[error("data transfer failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("data connection is not open")]
    NotConnected,
}

impl DataChannelError {
    /// True when the channel never got established.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            DataChannelError::Connect { .. } | DataChannelError::ConnectTimeout { .. }
        )
    }

    pub fn to_ftp_response(&self) -> Reply {
        match self {
            DataChannelError::Connect { addr, .. } | DataChannelError::ConnectTimeout { addr, .. } => {
                Reply::new(426, format!("Data connection failed: cannot reach {}.", addr))
            }
            _ => Reply::new(426, "Connection closed; transfer aborted."),
        }
    }
}
