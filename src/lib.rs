//! `graphql_remote`
//! =========
//!
//! _Talking to remote GraphQL services from intermediary layers._
//!
//! The **`graphql_remote`** library covers the parts of a GraphQL gateway that face the services
//! behind it:
//!
//! - Reconstructing a service's schema from the result of an introspection query
//! - Flattening the selection sets of incoming queries, so fields and fragments can be planned
//!   against a remote schema
//! - Sending queries to services, either one request at a time or batched into a single request
//!
//! Queries are handled as ASTs of the [`graphql_query`] crate, which is re-exported, and are
//! allocated in its arena-backed `ASTContext`. Schemas on the other hand are owned structures,
//! since they're long-lived and usually shared across many requests.
//!
//! [A good place to start learning more about this crate is the `schema` module...](schema)
//!
//! The other modules are:
//!
//! - [`selection`] for flattening selection sets and collecting variables
//! - [`queryer`] for sending queries, with or without batching and file uploads
//! - [`retry`] for deciding whether a failed introspection is attempted again
//! - [`error`] for the crate's common error type

pub mod error;
pub mod queryer;
pub mod retry;
pub mod schema;
pub mod selection;

pub use bumpalo;
pub use graphql_query;
