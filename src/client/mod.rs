//! Public driver surface.
//!
//! The client module exposes the pieces an application touches directly:
//!
//! * [`ClientBuilder`] — configuration and task wiring over a byte stream
//! * [`AtClient`] — the cloneable handle issuing commands and managing
//!   indications
//! * [`CommandOptions`] / [`InitOptions`] — per-call overrides
//! * [`Error`] — the failure taxonomy, one variant per kind a caller may
//!   want to match on
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use atmodem::ClientBuilder;
//! use tokio::net::TcpStream;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("10.0.0.1:2217").await?;
//! let modem = ClientBuilder::new(stream).build();
//!
//! modem.init().await?;
//! let info = modem.command("+CSQ").await?;
//! println!("signal quality: {info:?}");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod handle;
pub mod types;

pub use builder::{ClientBuilder, DEFAULT_ESC_TIME, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use handle::AtClient;
pub use types::{CommandOptions, InitOptions};
