//! Client-side core for the referral admin surface.
//!
//! This crate owns the state a frontend needs to talk to the admin backend:
//! a persistent bearer-credential session, a JSON HTTP client with a 401
//! interception hook, a TTL'd query cache with single-flight fetches and
//! prefix invalidation, a validated mutation dispatcher, and the route
//! access rules. Rendering is out of scope; everything here is headless.

pub mod api;
pub mod cache;
pub mod error;
pub mod filters;
pub mod guard;
pub mod http;
pub mod models;
pub mod mutation;
pub mod session;

#[cfg(test)]
mod testutil;

pub use api::AdminApi;
pub use cache::{QueryCache, QueryKey, QueryState, RefetchHandle};
pub use error::ClientError;
pub use guard::{Route, RouteDecision};
pub use http::HttpClient;
pub use mutation::{Mutation, MutationDispatcher, Notification};
pub use session::{AuthState, FileTokenStorage, SessionStore};
