//! Configuration and request model of SPARQL Facets.
//!
//! The configuration ([`SearchConfig`]) describes which fields, facets, search fields and sort
//! options exist for one entity class. It is loaded once and validated eagerly, such that building
//! queries from a [`SearchRequest`] can no longer fail because of a malformed field definition.

mod config;
mod error;
mod facet;
mod field;
mod format;
mod frame;
mod prefix;
mod request;
mod search;
mod sort;

pub use config::*;
pub use error::*;
pub use facet::*;
pub use field::*;
pub use format::*;
pub use frame::*;
pub use prefix::*;
pub use request::*;
pub use search::*;
pub use sort::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef, Subject, Term, Triple,
    Variable, VariableNameParseError,
};
