// ABOUTME: AT driver error types covering device, transport and lifecycle failures
// ABOUTME: Every kind a caller may need to distinguish gets its own variant

use thiserror::Error as ThisError;

/// Error type for all driver operations.
///
/// Device-reported failures (`Error`, `Cme`, `Cms`, `Connect`) affect only
/// the command that triggered them; the driver remains usable. `Closed` is
/// terminal: the transport is gone and a fresh driver must be created.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The driver has been closed; no work was performed.
    #[error("closed")]
    Closed,

    /// The command did not complete within its deadline. The modem is left
    /// in an unknown state; late lines are discarded by the driver.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The modem returned a bare `ERROR` in response to the command.
    #[error("ERROR")]
    Error,

    /// GSM equipment related error reported via `+CME ERROR:`. The value may
    /// be numeric or textual depending on the modem configuration.
    #[error("CME Error: {0}")]
    Cme(String),

    /// SMS network related error reported via `+CMS ERROR:`. The value may
    /// be numeric or textual depending on the modem configuration.
    #[error("CMS Error: {0}")]
    Cms(String),

    /// A dial attempt failed; the value is the result line (`BUSY`,
    /// `NO CARRIER`, ...).
    #[error("connect: {0}")]
    Connect(String),

    /// An indication is already registered for the prefix.
    #[error("indication exists")]
    IndicationExists,

    /// The modem acknowledged a command but its response did not contain the
    /// expected info. Produced by layers interpreting command results, not
    /// by the driver core itself.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An init sub-command failed; carries the command text for context.
    #[error("AT{cmd} returned error")]
    Init {
        cmd: String,
        #[source]
        source: Box<Error>,
    },

    /// Transport write or read failure, surfaced verbatim.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;
