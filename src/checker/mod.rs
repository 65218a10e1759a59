//! Health-check engine: one polling worker per registered service,
//! supervised by a periodic reconciliation loop.

pub mod counters;
pub mod supervisor;
pub mod worker;

pub use counters::Counters;
pub use supervisor::Supervisor;
