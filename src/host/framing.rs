use std::io;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest message the browser may send to a native host.
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;
/// Largest message a native host may send back.
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("native-messaging pipe failed")]
    Io(#[from] io::Error),
    #[error("incoming frame of {0} bytes exceeds the limit")]
    InboundTooLarge(usize),
    #[error("outgoing frame of {0} bytes exceeds the limit")]
    OutboundTooLarge(usize),
    #[error("failed to encode message")]
    Encode(#[from] serde_json::Error),
}

/// Reads one length-prefixed frame. `None` means the pipe closed between
/// frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FramingError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }
    let len = u32::from_ne_bytes(header) as usize;
    if len > MAX_INBOUND_FRAME {
        return Err(FramingError::InboundTooLarge(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_OUTBOUND_FRAME {
        return Err(FramingError::OutboundTooLarge(body.len()));
    }
    // bounded by MAX_OUTBOUND_FRAME above
    let len = body.len() as u32;
    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}
