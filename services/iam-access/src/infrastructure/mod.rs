//! 基础设施层

pub mod memory;
pub mod persistence;

pub use memory::InMemoryRbacStore;
pub use persistence::{ColumnMapping, PostgresRbacStore, push_predicate};
