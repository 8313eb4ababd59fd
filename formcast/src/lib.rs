//! Causal feature engineering and analytic point projection for fantasy football players.
//! Rolling appearance-based form, Elo-derived fixture difficulty and cross-sectional relative
//! features are assembled into leakage-free per-round tables, shared by training and inference.

pub mod config;
pub mod csv;
pub mod dampen;
pub mod dataset;
pub mod derive;
pub mod domain;
pub mod error;
pub mod eval;
pub mod feature;
pub mod file;
pub mod fixture;
pub mod form;
pub mod model;
pub mod print;
pub mod projector;
pub mod schema;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
