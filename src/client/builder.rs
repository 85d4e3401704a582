// ABOUTME: ClientBuilder wiring a byte stream into the three driver tasks
// ABOUTME: Holds construction-time configuration with modem-friendly defaults

use std::collections::HashMap;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::AtClient;
use crate::processor::Processor;
use crate::reader;
use crate::router::{self, Indication};

/// Default deadline applied to commands without an explicit timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default interval the driver waits after an escape before writing again,
/// letting residual OK/ERROR tokens from the aborted command drain.
pub const DEFAULT_ESC_TIME: Duration = Duration::from_millis(20);

/// Builder for an [`AtClient`] over a bidirectional byte stream.
///
/// The stream is typically a serial port to a cellular modem, but anything
/// `AsyncRead + AsyncWrite` works, including a TCP connection to a ser2net
/// style forwarder. The driver takes exclusive ownership of the stream for
/// its lifetime.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use std::time::Duration;
/// use atmodem::ClientBuilder;
/// use tokio::net::TcpStream;
///
/// let stream = TcpStream::connect("10.0.0.1:2217").await?;
/// let modem = ClientBuilder::new(stream)
///     .timeout(Duration::from_secs(5))
///     .indication("+CMT:", 1, |lines| tracing::info!("message: {lines:?}"))
///     .build();
/// modem.init().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<S> {
    stream: S,
    timeout: Duration,
    esc_time: Duration,
    init_cmds: Vec<String>,
    indications: HashMap<String, Indication>,
}

impl<S> ClientBuilder<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Creates a builder with default configuration: 1 s command timeout,
    /// 20 ms escape guard, and `ATZ` as the only init command.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            timeout: DEFAULT_TIMEOUT,
            esc_time: DEFAULT_ESC_TIME,
            init_cmds: vec!["Z".to_string()],
            indications: HashMap::new(),
        }
    }

    /// Sets the default deadline for commands issued without an explicit
    /// timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the guard interval enforced between an escape and the next
    /// command write.
    pub fn esc_time(mut self, esc_time: Duration) -> Self {
        self.esc_time = esc_time;
        self
    }

    /// Replaces the init command list issued by [`AtClient::init`].
    ///
    /// The default is the bare factory reset `["Z"]`. Vendor-specific setup
    /// (e.g. `^CURC=0` on Huawei devices) belongs here, supplied by the
    /// layer that knows the device.
    pub fn init_cmds<I, T>(mut self, cmds: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.init_cmds = cmds.into_iter().map(Into::into).collect();
        self
    }

    /// Registers an indication before the driver starts, so no early line
    /// can slip past the handler. Re-registering a prefix replaces it.
    pub fn indication(
        mut self,
        prefix: impl Into<String>,
        trailing_lines: usize,
        handler: impl FnMut(Vec<String>) + Send + 'static,
    ) -> Self {
        self.indications.insert(
            prefix.into(),
            Indication {
                trailing_lines,
                handler: Box::new(handler),
            },
        );
        self
    }

    /// Spawns the reader, router and processor tasks and returns the client
    /// handle. Must be called within a tokio runtime.
    pub fn build(self) -> AtClient {
        let (read_half, write_half) = tokio::io::split(self.stream);
        let (line_tx, line_rx) = mpsc::channel(1);
        let (residual_tx, residual_rx) = mpsc::channel(1);
        let (ops_tx, ops_rx) = mpsc::channel(1);
        let (request_tx, request_rx) = mpsc::channel(1);
        let closed = CancellationToken::new();

        tokio::spawn(reader::line_reader(read_half, line_tx));
        tokio::spawn(router::route_lines(
            self.indications,
            ops_rx,
            line_rx,
            residual_tx,
        ));
        let processor = Processor::new(
            write_half,
            residual_rx,
            self.timeout,
            self.esc_time,
            closed.clone(),
        );
        tokio::spawn(processor.run(request_rx));

        AtClient::new(request_tx, ops_tx, closed, self.init_cmds)
    }
}
