// PropVal - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library, util layer, and pure-logic crates
// (chrono, csv, encoding_rs, regex, rayon, serde).
// Must NOT depend on: app, platform, network.

pub mod clean;
pub mod estimate;
pub mod export;
pub mod filter;
pub mod geo;
pub mod model;
pub mod parser;
pub mod score;
pub mod stats;
