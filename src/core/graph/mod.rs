//! Graph structures used by the deadlock instrument

mod wait_for_graph;

pub use wait_for_graph::WaitForGraph;
