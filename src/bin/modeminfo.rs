//! Queries basic identity and status from an AT modem.
//!
//! The modem is expected to be reachable as a TCP byte stream, for example
//! a serial port exported by ser2net:
//!
//! ```text
//! modeminfo 10.0.0.1:2217
//! ```

use std::error::Error;
use std::time::Duration;

use argh::FromArgs;
use tokio::net::TcpStream;

use atmodem::ClientBuilder;

/// Query basic modem information over a TCP-attached serial port.
#[derive(FromArgs)]
struct Args {
    /// modem address as host:port
    #[argh(positional)]
    addr: String,

    /// per-command timeout in milliseconds
    #[argh(option, default = "1000")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let stream = TcpStream::connect(&args.addr).await?;
    let modem = ClientBuilder::new(stream)
        .timeout(Duration::from_millis(args.timeout))
        .build();

    modem.init().await?;

    for cmd in ["I", "+CGMI", "+CGMM", "+CGMR", "+CGSN", "+CSQ"] {
        match modem.command(cmd).await {
            Ok(info) => {
                println!("AT{cmd}:");
                for line in info {
                    println!("  {line}");
                }
            }
            Err(e) => eprintln!("AT{cmd} failed: {e}"),
        }
    }
    Ok(())
}
