use crate::constants::DATA_BUFFER_SIZE;
use crate::core_network::error::DataChannelError;
use crate::core_network::port::DataAddress;
use log::{debug, info};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// One outbound active-mode data connection.
///
/// `connect` and every later read or write are bounded by the same timeout,
/// which is independent of the control connection's idle timeout.
#[derive(Debug)]
pub struct DataChannel {
    stream: Option<TcpStream>,
    peer: DataAddress,
    io_timeout: Duration,
}

impl DataChannel {
    pub async fn connect(peer: DataAddress, io_timeout: Duration) -> Result<Self, DataChannelError> {
        info!("Opening data connection to {}", peer);
        let stream = match timeout(io_timeout, TcpStream::connect(peer.socket_addr())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(DataChannelError::Connect { addr: peer, source }),
            Err(_) => {
                return Err(DataChannelError::ConnectTimeout {
                    addr: peer,
                    after: io_timeout,
                })
            }
        };
        debug!("Data connection established with {}", peer);

        Ok(Self {
            stream: Some(stream),
            peer,
            io_timeout,
        })
    }

    /// Writes the whole text and flushes it.
    pub async fn send_text(&mut self, text: &str) -> Result<usize, DataChannelError> {
        let (peer, after) = (self.peer, self.io_timeout);
        let stream = self.stream.as_mut().ok_or(DataChannelError::NotConnected)?;

        bounded(peer, after, stream.write_all(text.as_bytes())).await?;
        bounded(peer, after, stream.flush()).await?;
        debug!("Sent {} bytes of text to {}", text.len(), peer);
        Ok(text.len())
    }

    /// Copies `reader` to the peer until EOF, one buffer at a time.
    pub async fn send_from_reader<R>(&mut self, reader: &mut R) -> Result<u64, DataChannelError>
    where
        R: AsyncRead + Unpin,
    {
        let (peer, after) = (self.peer, self.io_timeout);
        let stream = self.stream.as_mut().ok_or(DataChannelError::NotConnected)?;

        let mut buffer = vec![0u8; DATA_BUFFER_SIZE];
        let mut total = 0u64;
        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            bounded(peer, after, stream.write_all(&buffer[..bytes_read])).await?;
            total += bytes_read as u64;
        }
        bounded(peer, after, stream.flush()).await?;

        debug!("Sent {} bytes to {}", total, peer);
        Ok(total)
    }

    /// Copies everything the peer sends into `writer` until the peer closes.
    pub async fn receive_to_writer<W>(&mut self, writer: &mut W) -> Result<u64, DataChannelError>
    where
        W: AsyncWrite + Unpin,
    {
        let (peer, after) = (self.peer, self.io_timeout);
        let stream = self.stream.as_mut().ok_or(DataChannelError::NotConnected)?;

        let mut buffer = vec![0u8; DATA_BUFFER_SIZE];
        let mut total = 0u64;
        loop {
            let bytes_read = bounded(peer, after, stream.read(&mut buffer)).await?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read]).await?;
            total += bytes_read as u64;
        }
        writer.flush().await?;

        debug!("Received {} bytes from {}", total, peer);
        Ok(total)
    }

    /// Shuts the connection down. Safe to call more than once and after a
    /// failed transfer.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Data connection to {} did not shut down cleanly: {}", self.peer, e);
            }
            debug!("Data connection to {} closed", self.peer);
        }
    }
}

async fn bounded<T, F>(peer: DataAddress, after: Duration, io: F) -> Result<T, DataChannelError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match timeout(after, io).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(DataChannelError::IoTimeout { addr: peer, after }),
    }
}
