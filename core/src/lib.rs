//! Async API client core for the task-manager service.
//!
//! # Overview
//! Translates typed method calls into HTTP requests against the remote
//! task-management backend, attaches the session's bearer token to every
//! call after login, and deserializes JSON responses into typed values.
//! The presentation layer consumes these operations and owns everything
//! display-related.
//!
//! # Design
//! - `ApiClient` owns the transport (`reqwest::Client` with a cookie
//!   store), the base URL, and the current bearer token.
//! - Every operation is `async`, performs exactly one attempt, and
//!   returns `Result<_, ApiError>` — no retries, caching or fallback
//!   values anywhere.
//! - DTOs are plain data with the service's exact wire names; unset
//!   optionals are omitted from outbound JSON, matching the service's
//!   partial-update semantics.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, TaskFilter};
pub use error::ApiError;
pub use types::{
    Comment, CommentCreate, HttpValidationError, Priority, Project, ProjectCreate, Status,
    TaskCreate, TaskItem, TaskWithDetails, TokenResponse, User, UserRegister, ValidationError,
};
