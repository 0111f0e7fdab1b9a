//! Supervisor-driven orchestration
//!
//! The supervisor picks one route per turn; the dispatcher walks the graph
//! `Supervisor -> Worker -> (Supervisor | Terminal)` until it reaches
//! the terminal node.

mod dispatcher;
mod supervisor;

pub use dispatcher::{after_supervisor, after_worker, DispatchOutcome, Dispatcher, Node};
pub use supervisor::{parse_decision, Supervisor, ROUTE_FUNCTION};
