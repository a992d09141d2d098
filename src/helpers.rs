use log::debug;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// One numeric-coded reply on the control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub message: String,
}

impl Reply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// Sends a single reply line and flushes it.
pub async fn send_reply<W>(writer: &mut W, reply: &Reply) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(format!("{}\r\n", reply).as_bytes()).await?;
    writer.flush().await?;
    debug!("-> {}", reply);
    Ok(())
}

/// Sends an RFC 959 multi-line reply: `code-line` for every body line, then
/// the closing `code text` line.
pub async fn send_multiline<W>(
    writer: &mut W,
    code: u16,
    lines: &[String],
    last: &str,
) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!("{}-{}\r\n", code, line));
    }
    out.push_str(&format!("{} {}\r\n", code, last));
    writer.write_all(out.as_bytes()).await?;
    writer.flush().await?;
    debug!("-> {} ({} continuation lines)", code, lines.len());
    Ok(())
}
