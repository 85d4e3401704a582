// ABOUTME: Command processor task serialising AT commands against the modem
// ABOUTME: Drives the per-command state machine, deadlines and the escape guard

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::client::Error;
use crate::line::{self, Kind, CTRL_Z, ESC};

pub(crate) type Reply = oneshot::Sender<Result<Vec<String>, Error>>;

/// A unit of work submitted to the processor by a caller awaiting `reply`.
pub(crate) enum Request {
    /// A one line command: `AT<cmd><CR><LF>`, then info lines and a status.
    Command {
        cmd: String,
        timeout: Option<Duration>,
        reply: Reply,
    },
    /// A two stage SMS command: `AT<cmd><CR>`, a `>` prompt, then
    /// `<payload><Ctrl-Z>` and the usual info lines and status.
    Sms {
        cmd: String,
        payload: String,
        timeout: Option<Duration>,
        reply: Reply,
    },
    /// An escape sequence write. Arms the guard; no response is awaited.
    Escape { extra: Vec<u8>, reply: Reply },
}

/// Serialises the issuing of commands and awaits their responses.
///
/// The processor is the only writer to the modem. While no command is
/// active, lines forwarded by the router are drained and discarded so late
/// responses (for example after a timeout) never backpressure the router.
pub(crate) struct Processor<W> {
    modem: W,
    lines: mpsc::Receiver<String>,
    /// Expiry of the write guard armed by the most recent escape.
    guard: Option<Instant>,
    default_timeout: Duration,
    esc_time: Duration,
    closed: CancellationToken,
}

impl<W: AsyncWrite + Unpin> Processor<W> {
    pub(crate) fn new(
        modem: W,
        lines: mpsc::Receiver<String>,
        default_timeout: Duration,
        esc_time: Duration,
        closed: CancellationToken,
    ) -> Self {
        Self {
            modem,
            lines,
            guard: None,
            default_timeout,
            esc_time,
            closed,
        }
    }

    /// Runs until the line lane closes, then signals driver shutdown.
    pub(crate) async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        let mut requests_open = true;
        loop {
            tokio::select! {
                request = requests.recv(), if requests_open => match request {
                    Some(request) => self.serve(request).await,
                    None => requests_open = false,
                },
                line = self.lines.recv() => match line {
                    Some(line) => trace!("idle, discarding {:?}", line),
                    None => break,
                },
            }
        }
        self.closed.cancel();
    }

    async fn serve(&mut self, request: Request) {
        match request {
            Request::Command { cmd, timeout, reply } => {
                let rsp = self.process(&cmd, None, timeout).await;
                let _ = reply.send(rsp);
            }
            Request::Sms {
                cmd,
                payload,
                timeout,
                reply,
            } => {
                let rsp = self.process(&cmd, Some(&payload), timeout).await;
                let _ = reply.send(rsp);
            }
            Request::Escape { extra, reply } => {
                let rsp = self.escape(&extra).await.map(|()| Vec::new());
                let _ = reply.send(rsp);
            }
        }
    }

    /// Issues one command and collects its response.
    async fn process(
        &mut self,
        cmd: &str,
        sms: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Vec<String>, Error> {
        let deadline = Instant::now() + timeout.unwrap_or(self.default_timeout);
        self.wait_guard().await;
        self.write_command(cmd, sms.is_some()).await?;

        let cmd_id = line::cmd_id(cmd);
        let mut info = Vec::new();
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    if sms.is_some() {
                        // The modem may be stuck waiting for a payload;
                        // escape it rather than leave it wedged.
                        let _ = self.escape(&[]).await;
                    }
                    return Err(Error::DeadlineExceeded);
                }
                line = self.lines.recv() => {
                    let Some(line) = line else { return Err(Error::Closed) };
                    if line.is_empty() {
                        continue;
                    }
                    match line::classify(&line, cmd_id) {
                        Kind::StatusOk => return Ok(info),
                        Kind::StatusError => return Err(line::status_error(&line)),
                        Kind::SmsPrompt => {
                            if let Some(payload) = sms {
                                if let Err(e) = self.write_payload(payload).await {
                                    let _ = self.escape(&[]).await;
                                    return Err(e.into());
                                }
                            }
                        }
                        Kind::Connect => {
                            info.push(line);
                            return Ok(info);
                        }
                        Kind::ConnectError => return Err(Error::Connect(line)),
                        Kind::EchoCmdLine => {}
                        Kind::Unknown if is_payload_echo(&line, sms) => {}
                        Kind::Info | Kind::Unknown => info.push(line),
                    }
                }
            }
        }
    }

    /// Waits out an armed escape guard, discarding any residue the escaped
    /// command is still emitting.
    async fn wait_guard(&mut self) {
        let Some(expiry) = self.guard else { return };
        loop {
            tokio::select! {
                _ = sleep_until(expiry) => {
                    self.guard = None;
                    return;
                }
                line = self.lines.recv() => match line {
                    Some(line) => trace!("guarded, discarding {:?}", line),
                    None => return,
                },
            }
        }
    }

    async fn write_command(&mut self, cmd: &str, sms: bool) -> Result<(), Error> {
        let mut cmd_line = format!("AT{cmd}\r\n");
        if sms {
            // A bare CR is required to elicit the SMS prompt.
            cmd_line.pop();
        }
        debug!("-> {:?}", cmd_line);
        self.modem.write_all(cmd_line.as_bytes()).await?;
        self.modem.flush().await?;
        Ok(())
    }

    async fn write_payload(&mut self, payload: &str) -> std::io::Result<()> {
        debug!("-> {} byte payload", payload.len() + 1);
        let mut data = Vec::with_capacity(payload.len() + 1);
        data.extend_from_slice(payload.as_bytes());
        data.push(CTRL_Z as u8);
        self.modem.write_all(&data).await?;
        self.modem.flush().await
    }

    /// Writes the escape sequence plus `extra` and arms the guard.
    ///
    /// The guard is armed even when the write fails; the modem state is
    /// unknown either way and the next command must wait it out.
    async fn escape(&mut self, extra: &[u8]) -> Result<(), Error> {
        debug!("-> escape");
        let mut seq = vec![ESC, b'\r', b'\n'];
        seq.extend_from_slice(extra);
        let written = async {
            self.modem.write_all(&seq).await?;
            self.modem.flush().await
        }
        .await;
        self.guard = Some(Instant::now() + self.esc_time);
        written.map_err(Error::from)
    }
}

fn is_payload_echo(line: &str, sms: Option<&str>) -> bool {
    sms.is_some_and(|payload| line.ends_with(CTRL_Z) && line.starts_with(payload))
}
