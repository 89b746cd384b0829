//! Native-messaging host: the browser talks to the background service over
//! stdin/stdout with length-prefixed JSON frames.

pub mod framing;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    background::BackgroundService,
    infrastructure::shutdown::ShutdownListener,
    protocol::{Ack, Request, Response},
};

pub use framing::FramingError;

/// Answers frames one at a time until the input closes or shutdown fires.
/// Undecodable requests get `{}` so the caller's callback still runs.
pub async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    service: Arc<BackgroundService>,
    mut shutdown: ShutdownListener,
) -> Result<(), FramingError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(target: "host", "native-messaging host ready");
    loop {
        let frame = tokio::select! {
            _ = shutdown.notified() => break,
            frame = framing::read_frame(&mut reader) => frame?,
        };
        let Some(frame) = frame else {
            tracing::info!(target: "host", "input closed");
            break;
        };

        let response = tokio::select! {
            _ = shutdown.notified() => break,
            response = respond(&service, &frame) => response,
        };

        match framing::write_message(&mut writer, &response).await {
            Err(FramingError::OutboundTooLarge(len)) => {
                tracing::warn!(target: "host", bytes = len, "response too large; sending failure");
                let failure = Ack {
                    success: false,
                    message: Some(format!("response of {len} bytes exceeds the host limit")),
                };
                framing::write_message(&mut writer, &failure).await?;
            }
            other => other?,
        }
    }
    tracing::info!(target: "host", "native-messaging host stopped");
    Ok(())
}

async fn respond(service: &BackgroundService, frame: &[u8]) -> Response {
    match serde_json::from_slice::<Request>(frame) {
        Ok(request) => {
            tracing::debug!(target: "host", request = ?request, "request received");
            service.handle(request).await
        }
        Err(err) => {
            tracing::warn!(target: "host", error = %err, bytes = frame.len(), "undecodable request");
            Response::empty()
        }
    }
}
