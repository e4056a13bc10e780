//! Resolution of free-text Indonesian addresses against a reference gazetteer of
//! administrative regions (province, regency/city, district, village, postal code).
//!
//! Text is normalised, corrected with previously learned corrections, mined for known
//! region names, and then looked up level by level in an index over the gazetteer. Every
//! resolution feeds a small learning store (word and pattern frequencies, spelling
//! corrections) that can be exported and imported between sessions.

pub mod types;
pub mod error;
pub mod normalize;
pub mod distance;
pub mod lexicon;
pub mod index;
pub mod gazetteer;
pub mod extract;
pub mod learning;
pub mod config;
pub mod resolver;
pub mod engine;

pub use crate::types::*;
pub use crate::error::Error;
pub use crate::normalize::*;
pub use crate::distance::*;
pub use crate::lexicon::*;
pub use crate::index::*;
pub use crate::gazetteer::*;
pub use crate::extract::*;
pub use crate::learning::*;
pub use crate::config::*;
pub use crate::engine::*;
