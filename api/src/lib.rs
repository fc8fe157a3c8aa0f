//! Data Room API Module
//!
//! HTTP surface: file upload into a session, question answering through the
//! Planner and Executor, and session inspection and reset.

pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use error::ApiError;
pub use handlers::{Agents, ApiState};
pub use server::{bind_listener, create_router, ApiServer, BODY_LIMIT};
