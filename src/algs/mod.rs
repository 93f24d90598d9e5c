//! Communication primitives and parallel algorithms.

pub mod collective;
pub mod communicator;
pub mod distributor;
pub mod wire;

pub use distributor::CommunicationPlan;
