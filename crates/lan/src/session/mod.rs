//! Gameplay once discovery has paired two nodes: the host streams
//! snapshots, the client streams controls back.

mod clock;
mod input;
mod node;
mod sync;

pub use clock::TickClock;
pub use input::{INPUT_SIZE, InputFlags};
pub use node::{LanNode, LinkState, NodeEvent, Phase};
pub use sync::{ClientSync, ClientTickReport, HostSync, HostTickReport, Session};
