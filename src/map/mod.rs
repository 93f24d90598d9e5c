//! Ordinal ownership maps, transfer operators, and the shared domain map.

pub mod exporter;
pub mod global_map;
pub mod shared_domain;

pub use exporter::Exporter;
pub use global_map::{GlobalMap, GlobalOrdinal};
pub use shared_domain::SharedDomainMap;
