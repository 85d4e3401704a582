//! Low level driver for modems controlled by AT commands over a byte stream.
//!
//! The driver sits between a bidirectional stream (typically a serial port
//! to a cellular modem) and higher level code, and takes care of the
//! awkward parts of the dialogue: serialising commands onto the shared
//! stream, telling solicited response lines apart from unsolicited result
//! codes, the newline-less `>` prompt of two stage SMS commands, deadlines
//! with clean cancellation, and the quiesce interval after an escape.
//!
//! Three tasks run for the lifetime of a driver: a reader framing the byte
//! stream into lines, a router matching registered indication prefixes and
//! forwarding the rest, and a processor driving one command at a time to
//! completion. The [`AtClient`] handle submits work to them and can be
//! cloned freely.
//!
//! # Examples
//!
//! Query a modem exposed over TCP (for instance by ser2net):
//!
//! ```rust,no_run
//! use atmodem::ClientBuilder;
//! use tokio::net::TcpStream;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = TcpStream::connect("10.0.0.1:2217").await?;
//!     let modem = ClientBuilder::new(stream)
//!         .indication("+CMT:", 1, |lines| println!("incoming SMS: {lines:?}"))
//!         .build();
//!
//!     // Reset to a known state, then ask for signal quality.
//!     modem.init().await?;
//!     for line in modem.command("+CSQ").await? {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Send a message with a two stage SMS command:
//!
//! ```rust,no_run
//! # use atmodem::AtClient;
//! # async fn example(modem: AtClient) -> Result<(), Box<dyn std::error::Error>> {
//! modem.command("+CMGF=1").await?; // text mode
//! modem.sms_command("+CMGS=\"+12345678901\"", "hello from atmodem").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Commands are given without the `AT` prefix or trailing terminator; the
//! driver adds both. Errors reported by the device map onto dedicated
//! [`Error`] variants (`ERROR`, `+CME ERROR`, `+CMS ERROR`, dial failures),
//! so callers can match on the kind rather than parse strings.

pub mod client;
pub mod info;

mod line;
mod processor;
mod reader;
mod router;


pub use client::{
    AtClient, ClientBuilder, CommandOptions, Error, InitOptions, Result, DEFAULT_ESC_TIME,
    DEFAULT_TIMEOUT,
};
pub use router::IndicationHandler;
