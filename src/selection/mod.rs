//! # Flattening Selection Sets
//!
//! A query may select the same field several times, spread named fragments, or wrap selections
//! in inline fragments. Before a query is forwarded to a remote service it's often necessary to
//! know the canonical set of fields it selects. The [FieldSet] collects a selection set into a
//! tree keyed by response key (the alias if one is given, otherwise the field name), resolving
//! all fragments and merging the sub-selections of fields that share a response key.
//!
//! ```
//! use graphql_query::ast::{ASTContext, Document, ParseNode};
//! use graphql_remote::selection::apply_fragments_in_document;
//!
//! let ctx = ASTContext::new();
//! let document = Document::parse(
//!     &ctx,
//!     "{ user { id } user { ...Name } } fragment Name on User { name }",
//! )
//! .unwrap();
//!
//! let selection_set = apply_fragments_in_document(&ctx, document, None).unwrap();
//! assert_eq!(selection_set.selections.len(), 1);
//! ```
//!
//! The merge is permissive: it doesn't check type conditions against a schema and it keeps the
//! arguments of the first occurrence of a field. Queries are expected to be validated before
//! they're merged.

mod field_set;
mod variables;

pub use field_set::*;
pub use variables::*;
