// PropVal - lib.rs
//
// Library entry point. The binary in `main.rs` is a thin front end over
// these modules; integration tests drive them directly.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
