//! WebSocket fan-out: every frame a client sends is relayed to all other
//! open clients, and a heartbeat evicts clients that stop answering pings.

mod registry;
mod server;
mod session;

pub use registry::{ConnectionId, ConnectionRegistry, ConnectionState, Frame, Outbound, SweepReport};
pub use server::{BroadcastServer, run_heartbeat};
pub use session::serve_socket;
