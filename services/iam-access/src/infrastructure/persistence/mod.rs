//! 持久化层模块

pub mod error_mapper;
pub mod predicate_sql;
pub mod rbac_repository;

pub use predicate_sql::{ColumnMapping, push_predicate};
pub use rbac_repository::PostgresRbacStore;
