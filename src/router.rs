// ABOUTME: Indication router task splitting modem lines into URC bundles and residual lines
// ABOUTME: Owns the prefix table; mutations only arrive through its op inbox

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::client::Error;

/// Callback invoked with each complete indication bundle.
///
/// Handlers run on the router task, so they must return promptly and must
/// not wait for the driver's own command responses (spawn a task for that).
pub type IndicationHandler = Box<dyn FnMut(Vec<String>) + Send>;

/// An unsolicited result code (URC) registration.
///
/// Indications are lines prefixed with a particular pattern and may include
/// a number of trailing lines, which the modem emits in a contiguous block
/// immediately after the prefixed line.
pub(crate) struct Indication {
    pub(crate) trailing_lines: usize,
    pub(crate) handler: IndicationHandler,
}

/// Mutations to the indication table, delivered through the router inbox so
/// the table itself is never shared across tasks.
pub(crate) enum RouterOp {
    Add {
        prefix: String,
        indication: Indication,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Remove {
        prefix: String,
        reply: oneshot::Sender<()>,
    },
}

/// Pulls indications out of the stream of lines read from the modem and
/// forwards them to handlers. Lines matching no registered prefix pass
/// through to the residual lane consumed by the command processor.
///
/// Exits when the incoming lane closes (transport EOF), dropping `residual`
/// so closure keeps propagating. A bundle cut short by closure is discarded
/// rather than delivered incomplete.
pub(crate) async fn route_lines(
    mut table: HashMap<String, Indication>,
    mut ops: mpsc::Receiver<RouterOp>,
    mut lines: mpsc::Receiver<String>,
    residual: mpsc::Sender<String>,
) {
    let mut ops_open = true;
    loop {
        tokio::select! {
            op = ops.recv(), if ops_open => match op {
                Some(op) => apply(&mut table, op),
                // All client handles are gone; keep routing until the
                // transport closes.
                None => ops_open = false,
            },
            incoming = lines.recv() => {
                let Some(line) = incoming else { return };
                if let Some((prefix, ind)) = table
                    .iter_mut()
                    .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                {
                    debug!("indication {:?}", prefix);
                    let mut bundle = Vec::with_capacity(1 + ind.trailing_lines);
                    bundle.push(line);
                    // Trailing lines arrive contiguously; pull them directly
                    // so another indication cannot interleave.
                    for _ in 0..ind.trailing_lines {
                        match lines.recv().await {
                            Some(trailing) => bundle.push(trailing),
                            None => return,
                        }
                    }
                    (ind.handler)(bundle);
                } else if residual.send(line).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn apply(table: &mut HashMap<String, Indication>, op: RouterOp) {
    match op {
        RouterOp::Add {
            prefix,
            indication,
            reply,
        } => {
            let result = match table.entry(prefix) {
                std::collections::hash_map::Entry::Occupied(_) => Err(Error::IndicationExists),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(indication);
                    Ok(())
                }
            };
            let _ = reply.send(result);
        }
        RouterOp::Remove { prefix, reply } => {
            table.remove(&prefix);
            let _ = reply.send(());
        }
    }
}
