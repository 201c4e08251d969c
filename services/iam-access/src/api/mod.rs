//! API 层模块

pub mod http;

pub use http::{ACTOR_HEADER, Actor, ApiError, router};
