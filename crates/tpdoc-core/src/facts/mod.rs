//! Client facts.
//!
//! A fact source carries one group-level fact bag shared by every entity
//! and one fact record per legal entity. Every fact is tri-state, see
//! [`FactValue`].

mod parser;
mod value;

pub use parser::{ClientInfo, EntityFacts, FactSet, FactView, GroupFacts};
pub use value::{parse_number, FactValue};
