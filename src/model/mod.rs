//! Genealogy domain model and the builder that produces it from legacy drafts.
//!
//! Entities are identified by random UUIDs. Legacy tokens (`P12`, `F3`) never
//! leave [`builder`]; families reference individuals by id only.

mod builder;
mod types;

pub use builder::build;
pub use types::*;
