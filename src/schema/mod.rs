//! # Reconstructing Remote Schemas
//!
//! The `graphql_remote::schema` module rebuilds the schema of a remote GraphQL service from the
//! result of an introspection query. The [Schema] is a flat map of types by name, alongside two
//! indexes describing which concrete types may satisfy an abstract type and which abstract types
//! a type satisfies.
//!
//! Introspection data may be turned into a [Schema] using the [BuildClientSchema] trait:
//!
//! ```
//! use graphql_remote::schema::*;
//!
//! let introspection_json = include_str!("../../fixture/introspection_query.json");
//! let introspection: IntrospectionQuery = serde_json::from_str(introspection_json).unwrap();
//! let schema = introspection.build_client_schema().unwrap();
//!
//! assert!(schema.is_possible_type("ITodo", "BigTodo"));
//! ```
//!
//! To fetch the introspection data from a service first, use [introspect_remote_schema] or, for a
//! custom [Queryer](crate::queryer::Queryer), [introspect_api].
//!
//! [More information on the Schema struct.](Schema)

pub mod build_client_schema;
mod introspect;
pub mod introspection;
#[allow(clippy::module_inception)]
pub mod schema;
pub mod type_ref;

pub use build_client_schema::BuildClientSchema;
pub use introspect::*;
pub use introspection::{
    IntrospectionQuery, IntrospectionSchema, INTROSPECTION_OPERATION_NAME, INTROSPECTION_QUERY,
};
pub use schema::*;
pub use type_ref::{TypeKind, TypeRef};
