// ABOUTME: Line reader task converting the modem byte stream into logical lines
// ABOUTME: Owns the read half of the transport for the lifetime of the driver

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::line;

/// Reads bytes from the modem and emits logical lines into `lane`.
///
/// The function waits until it has retrieved enough data to frame a line,
/// keeping any remainder buffered for the next pass. Framing follows
/// [`line::split_token`], so the newline-less SMS prompt is emitted as its
/// own `">"` token as soon as it arrives.
///
/// Runs until the transport signals EOF or a read error; both are fatal to
/// the driver, so the lane is simply dropped, which propagates closure
/// through the router to the command processor. Exits early if the receiving
/// side of the lane is gone.
pub(crate) async fn line_reader<R>(mut modem: R, lane: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(4 * 1024);
    loop {
        while let Some(token) = line::split_token(&mut buf) {
            trace!("<- {:?}", token);
            if lane.send(token).await.is_err() {
                return;
            }
        }
        match modem.read_buf(&mut buf).await {
            // The modem hung up. A trailing line without a terminator is
            // still delivered before shutting down.
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("modem read failed: {}", e);
                break;
            }
        }
    }
    if let Some(token) = line::split_final(&mut buf) {
        trace!("<- {:?} (eof)", token);
        let _ = lane.send(token).await;
    }
}
