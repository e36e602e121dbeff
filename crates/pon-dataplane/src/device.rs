//! A simulated network element: flow table plus forwarding links.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::engine::{FlowTable, Outcome};
use crate::error::Result;
use crate::flow::FlowEntry;
use crate::frame::EthernetFrame;
use crate::port::{GlobalPort, LocalPort};

/// Where a frame goes after leaving a device on a local port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardTarget {
    /// Hand the frame to another device's local ingress port.
    Device { device: GlobalPort, port: LocalPort },
    /// Deliver to the external egress sink at this global port.
    External(GlobalPort),
}

/// One simulated device (the trunk or a leaf).
///
/// The forwarding-link map is wired once at topology build time and
/// read-only afterwards. The flow table is the only state mutated while
/// frames are in flight; it sits behind a lock so an install replaces it
/// atomically and an in-flight evaluation never sees a torn table.
#[derive(Debug)]
pub struct SimDevice {
    name: String,
    links: HashMap<LocalPort, Vec<ForwardTarget>>,
    table: RwLock<FlowTable>,
}

impl SimDevice {
    /// Creates a device with no links and an empty flow table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: HashMap::new(),
            table: RwLock::new(FlowTable::new()),
        }
    }

    /// Device name used in log fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a forwarding target for a local port.
    ///
    /// Multiple targets on one port model a shared medium: every target
    /// receives every frame egressing that port, in append order.
    pub fn link(&mut self, port: LocalPort, target: ForwardTarget) {
        self.links.entry(port).or_default().push(target);
    }

    /// Forwarding targets wired to a local port, in delivery order.
    pub fn targets(&self, port: LocalPort) -> &[ForwardTarget] {
        self.links.get(&port).map(Vec::as_slice).unwrap_or_default()
    }

    /// Atomically replaces the device's flow table.
    pub fn install_flows(&self, flows: Vec<FlowEntry>) {
        self.table.write().install(flows);
    }

    /// Number of installed flow entries.
    pub fn flow_count(&self) -> usize {
        self.table.read().len()
    }

    /// Evaluates the flow table against one frame.
    pub fn process(&self, port: LocalPort, frame: &EthernetFrame) -> Result<Option<Outcome>> {
        self.table.read().process(port, frame)
    }
}
