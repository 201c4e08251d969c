//! 领域层

pub mod actor;
pub mod authorization;
pub mod role;
pub mod scope;

pub use actor::ActorId;
pub use scope::{Effect, ScopeKind, ScopeMemberships, TargetDescriptor};
