//! ponsimd - PON dataplane simulator daemon
//!
//! Builds a simulated trunk/leaf access network and exposes it to a
//! frame-I/O front end. The match/action semantics live in the
//! `pon-dataplane` crate; this crate adds configuration and process
//! scaffolding.

mod config;

pub use config::Config;
