//! Translates search requests into SPARQL queries.
//!
//! Four query shapes are issued for a search:
//! - [`build_count`] counts the matching entities,
//! - [`build_id_page`] selects the ids of the entities on the requested page,
//! - [`build_entity_construct`] constructs the fields of these entities,
//! - [`build_facet_aggregate`] counts the values of a facet.
//!
//! All of them share the same `WHERE` clause, such that the count, the page, and the facet counts
//! are consistent.

mod ast;
mod builder;
mod error;
mod escape;

pub use ast::*;
pub use builder::*;
pub use error::*;
pub use escape::*;
