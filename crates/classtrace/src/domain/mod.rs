//! Core data types shared by the scanner, generators, and mutator.

pub mod errors;
pub mod model;
