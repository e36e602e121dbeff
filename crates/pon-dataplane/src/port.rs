//! Two-level port addressing.
//!
//! The simulation uses two disjoint numbering schemes: global ports address
//! a device from the external frame-I/O boundary, local ports are meaningful
//! only inside one device's flow table and link map. Keeping them as
//! distinct types stops one being passed where the other is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Port number used by the external boundary to address a device's access
/// side (trunk = 0, leaf *i* = 128 + *i*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalPort(pub u32);

impl fmt::Display for GlobalPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port number scoped to a single device; flow-rule IN_PORT and OUTPUT
/// values are local ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalPort(pub u32);

impl fmt::Display for LocalPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
