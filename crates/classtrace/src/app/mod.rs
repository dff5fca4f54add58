//! Application layer: markup scanning, class generation, and tag rewriting.

pub mod attributes;
pub mod classify;
pub mod mutate;
pub mod options;
pub mod release;
pub mod rules;
pub mod scanner;
