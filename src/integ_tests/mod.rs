//! End-to-end compilation scenarios, run in-process with `cargo test --lib`.
//!
//! These go from a raw query string through the parser to both compiled
//! outputs and check the properties the two must share.

mod test_listing;
mod test_self_exclusion;
