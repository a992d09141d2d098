use crate::constants::{MAX_DATA_PORT, MIN_DATA_PORT};
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::PortError;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{debug, info, warn};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::io::AsyncWrite;

/// Client endpoint advertised with PORT, used by exactly one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataAddress {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl DataAddress {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Parses `h1,h2,h3,h4,p1,p2` where the port is `p1 * 256 + p2`.
    pub fn parse(arg: &str) -> Result<Self, PortError> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(PortError::Missing);
        }

        let parts: Vec<&str> = arg.split(',').collect();
        if parts.len() != 6 {
            return Err(PortError::FieldCount(parts.len()));
        }

        let mut octets = [0u8; 4];
        for (octet, part) in octets.iter_mut().zip(&parts[0..4]) {
            *octet = part
                .parse::<u8>()
                .map_err(|_| PortError::InvalidHost(part.to_string()))?;
        }

        let p1 = parse_port_field(parts[4])?;
        let p2 = parse_port_field(parts[5])?;
        let port = p1
            .checked_mul(256)
            .and_then(|high| high.checked_add(p2))
            .ok_or_else(|| PortError::InvalidPortField(arg.to_string()))?;

        if !(MIN_DATA_PORT..=MAX_DATA_PORT).contains(&port) {
            return Err(PortError::OutOfRange(port));
        }

        Ok(Self::new(Ipv4Addr::from(octets), port as u16))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }
}

fn parse_port_field(part: &str) -> Result<u64, PortError> {
    part.parse::<u64>()
        .map_err(|_| PortError::InvalidPortField(part.to_string()))
}

impl fmt::Display for DataAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Handles the PORT (Active Mode) FTP command.
///
/// Only records the address; the connection is opened by the transfer
/// command that consumes it.
pub async fn handle_port_command<W>(
    writer: &mut W,
    _ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    match DataAddress::parse(arg) {
        Ok(addr) => {
            info!("Received PORT command with address {}", addr);
            if let Some(previous) = session.pending_data_address.replace(addr) {
                debug!("Replacing unused data address {}", previous);
            }
            send_reply(writer, &Reply::new(200, "PORT command successful.")).await?;
        }
        Err(e) => {
            warn!("Rejected PORT argument {:?}: {}", arg, e);
            send_reply(writer, &e.to_ftp_response()).await?;
        }
    }

    Ok(Flow::Continue)
}
