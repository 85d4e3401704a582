// ABOUTME: AtClient, the public handle submitting work to the driver tasks
// ABOUTME: Cheap to clone; all operations race against the closed signal

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::client::{CommandOptions, Error, InitOptions, Result};
use crate::processor::Request;
use crate::router::{Indication, RouterOp};

/// Handle to a modem driven by AT commands.
///
/// Commands are serialised by the driver: concurrent callers queue and each
/// receives exactly one response. The handle is cheap to clone and all
/// methods take `&self`, so it can be shared freely across tasks.
///
/// When the connection to the modem breaks (read EOF or error), the driver
/// closes: every outstanding and subsequent call fails with
/// [`Error::Closed`] and the state of the device is unknown. A closed driver
/// cannot be reopened; create a new one via [`ClientBuilder`].
///
/// [`ClientBuilder`]: crate::ClientBuilder
#[derive(Clone)]
pub struct AtClient {
    requests: mpsc::Sender<Request>,
    ops: mpsc::Sender<RouterOp>,
    closed: CancellationToken,
    init_cmds: Vec<String>,
}

impl AtClient {
    pub(super) fn new(
        requests: mpsc::Sender<Request>,
        ops: mpsc::Sender<RouterOp>,
        closed: CancellationToken,
        init_cmds: Vec<String>,
    ) -> Self {
        Self {
            requests,
            ops,
            closed,
            init_cmds,
        }
    }

    /// Issues an AT command and returns the info lines gathered between the
    /// command and its `OK` status.
    ///
    /// `cmd` must not include the `AT` prefix or the `<CR><LF>` terminator;
    /// both are added on the wire. A non-`OK` status resolves to the
    /// corresponding [`Error`] kind.
    pub async fn command(&self, cmd: impl Into<String>) -> Result<Vec<String>> {
        self.command_with(cmd, CommandOptions::new()).await
    }

    /// Issues an AT command with per-call options.
    pub async fn command_with(
        &self,
        cmd: impl Into<String>,
        options: CommandOptions,
    ) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        let request = Request::Command {
            cmd: cmd.into(),
            timeout: options.timeout,
            reply,
        };
        self.submit(request, rx).await
    }

    /// Issues a two stage SMS command.
    ///
    /// The command line is written with a bare `<CR>`, the modem answers
    /// with a `>` prompt, and the payload is then sent terminated by Ctrl-Z.
    /// The payload may be message text or a hex coded PDU depending on the
    /// messaging mode the modem is in. If the command times out the driver
    /// escapes the modem so it does not stay stuck waiting for a payload.
    pub async fn sms_command(
        &self,
        cmd: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Vec<String>> {
        self.sms_command_with(cmd, payload, CommandOptions::new())
            .await
    }

    /// Issues a two stage SMS command with per-call options.
    pub async fn sms_command_with(
        &self,
        cmd: impl Into<String>,
        payload: impl Into<String>,
        options: CommandOptions,
    ) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        let request = Request::Sms {
            cmd: cmd.into(),
            payload: payload.into(),
            timeout: options.timeout,
            reply,
        };
        self.submit(request, rx).await
    }

    /// Registers a handler for an unsolicited indication.
    ///
    /// The handler is called with the matching line plus `trailing_lines`
    /// further lines, in wire order, each time a received line starts with
    /// `prefix`. Fails with [`Error::IndicationExists`] if the prefix is
    /// already registered.
    ///
    /// Handlers run on the driver's routing task. They must not issue a
    /// modem command and wait for its result inline; that would stall the
    /// very task that delivers the response. Spawn a task for follow-up
    /// commands instead.
    pub async fn add_indication(
        &self,
        prefix: impl Into<String>,
        trailing_lines: usize,
        handler: impl FnMut(Vec<String>) + Send + 'static,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        let op = RouterOp::Add {
            prefix: prefix.into(),
            indication: Indication {
                trailing_lines,
                handler: Box::new(handler),
            },
            reply,
        };
        tokio::select! {
            _ = self.closed.cancelled() => Err(Error::Closed),
            sent = self.ops.send(op) => match sent {
                Ok(()) => rx.await.unwrap_or(Err(Error::Closed)),
                Err(_) => Err(Error::Closed),
            },
        }
    }

    /// Removes any indication registered for the prefix.
    ///
    /// A no-op if no such indication exists; never fails, even on a closed
    /// driver.
    pub async fn cancel_indication(&self, prefix: impl Into<String>) {
        let (reply, rx) = oneshot::channel();
        let op = RouterOp::Remove {
            prefix: prefix.into(),
            reply,
        };
        tokio::select! {
            _ = self.closed.cancelled() => {}
            sent = self.ops.send(op) => if sent.is_ok() {
                let _ = rx.await;
            },
        }
    }

    /// Initialises the modem into a known state.
    ///
    /// Escapes any outstanding SMS operation, flushes the command buffer,
    /// then issues the configured init command list (factory reset `ATZ` by
    /// default). Intended to be called once after construction, before other
    /// commands.
    pub async fn init(&self) -> Result<()> {
        self.init_with(InitOptions::new()).await
    }

    /// Initialises the modem with per-call options.
    pub async fn init_with(&self, options: InitOptions) -> Result<()> {
        // Escape any in-flight SMS, and an extra CRLF so a partial command
        // left in the buffer is abandoned too.
        self.escape(b"\r\n").await?;
        let cmds = match options.cmds {
            Some(cmds) => cmds,
            None => self.init_cmds.clone(),
        };
        for cmd in cmds {
            let cmd_options = CommandOptions {
                timeout: options.timeout,
            };
            match self.command_with(cmd.as_str(), cmd_options).await {
                Ok(_) => {}
                Err(Error::DeadlineExceeded) => return Err(Error::DeadlineExceeded),
                Err(e) => {
                    return Err(Error::Init {
                        cmd,
                        source: Box::new(e),
                    })
                }
            }
        }
        Ok(())
    }

    /// Writes the escape sequence (`0x1B <CR><LF>`) plus any extra bytes.
    ///
    /// Returns once the write completes; no device response is awaited.
    /// Arms the write guard, so the next command waits out the escape
    /// interval before touching the modem.
    pub async fn escape(&self, extra: &[u8]) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        let request = Request::Escape {
            extra: extra.to_vec(),
            reply,
        };
        self.submit(request, rx).await.map(|_| ())
    }

    /// Resolves once the driver has terminated.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Returns true if the driver has terminated.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Submits a request, racing against driver shutdown. Every failure mode
    /// of a closing driver (send refused, reply dropped) reads as `Closed`.
    async fn submit(
        &self,
        request: Request,
        rx: oneshot::Receiver<Result<Vec<String>>>,
    ) -> Result<Vec<String>> {
        tokio::select! {
            _ = self.closed.cancelled() => Err(Error::Closed),
            sent = self.requests.send(request) => match sent {
                Ok(()) => rx.await.unwrap_or(Err(Error::Closed)),
                Err(_) => Err(Error::Closed),
            },
        }
    }
}
