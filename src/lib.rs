//!
//! # Def21 Design Exchange Format (DEF) Writer
//!
//! Walks an in-memory [DefDesign] and emits it as DEF-format text,
//! targeting any of the six DEF dialects from 5.3 through 5.8.
//!
//! The data model is an arena per entity category, addressed by typed
//! integer identifiers. Writing never mutates the design: all per-pass
//! state (selection sets, the property-definition registry, the running
//! wire-encoder state) lives in a [write::DefWriter] constructed per pass
//! and discarded afterward.
//!

pub(crate) mod utils;

pub mod data;
pub mod wire;
pub mod write;

pub use data::*;
pub use write::{
    placement_to_string, save, save_placement, to_string, DefWriter, DefWriterOptions,
};

#[cfg(test)]
mod tests;
