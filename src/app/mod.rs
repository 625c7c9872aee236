// PropVal - app/mod.rs
//
// Application layer: dataset store, geocoding, request handling, reporting.
// Dependencies: core, platform, util.

pub mod geocode;
pub mod report;
pub mod request;
pub mod session;
pub mod store;
