//! Topology construction and frame forwarding.
//!
//! The fabric owns one trunk device plus N leaf devices and wires their
//! local ports into a two-level tree: leaf-to-trunk links are
//! point-to-point, the trunk's medium-facing port fans out to every leaf
//! (shared-medium broadcast), and each device's access-facing port maps to
//! an external global port. Frames entering at a global port are driven
//! device to device until they reach the external egress sink or drop.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::device::{ForwardTarget, SimDevice};
use crate::error::{DataplaneError, Result};
use crate::flow::FlowEntry;
use crate::frame::EthernetFrame;
use crate::port::{GlobalPort, LocalPort};

/// Global port of the trunk device's access side.
pub const TRUNK_GLOBAL_PORT: GlobalPort = GlobalPort(0);
/// Leaf *i* is addressed at global port `LEAF_GLOBAL_PORT_BASE + i`.
pub const LEAF_GLOBAL_PORT_BASE: u32 = 128;

/// Local port facing the shared medium, on the trunk and on every leaf.
pub const TRUNK_FACING_PORT: LocalPort = LocalPort(1);
/// Local port facing the outside world; external arrivals always enter a
/// device here.
pub const ACCESS_FACING_PORT: LocalPort = LocalPort(2);

/// Callback invoked once per frame delivered to an external egress port.
pub type EgressSink = Box<dyn Fn(GlobalPort, &EthernetFrame) + Send + Sync>;

/// Input accepted at the ingress boundary: raw wire bytes or an
/// already-parsed frame.
#[derive(Debug, Clone)]
pub enum FrameInput {
    Bytes(Vec<u8>),
    Frame(EthernetFrame),
}

impl From<EthernetFrame> for FrameInput {
    fn from(frame: EthernetFrame) -> Self {
        Self::Frame(frame)
    }
}

impl From<Vec<u8>> for FrameInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for FrameInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// The simulated access network: devices, wiring, and the egress sink.
pub struct PonFabric {
    devices: HashMap<GlobalPort, SimDevice>,
    egress: EgressSink,
    /// Serializes forwarding walks: each ingress call runs to completion
    /// before the next starts, so per-port egress order follows submission
    /// order and no two walks interleave on one device.
    walk: Mutex<()>,
}

impl PonFabric {
    /// Builds a trunk plus `leaf_count` leaves over a shared medium.
    ///
    /// Wiring: the trunk's access port egresses externally at global port
    /// 0; its medium-facing port fans out to every leaf's medium-facing
    /// ingress; each leaf's medium-facing port returns to the trunk
    /// point-to-point; each leaf's access port egresses externally at
    /// global port 128 + i.
    pub fn build(leaf_count: usize, egress: EgressSink) -> Self {
        let mut trunk = SimDevice::new("trunk");
        trunk.link(ACCESS_FACING_PORT, ForwardTarget::External(TRUNK_GLOBAL_PORT));

        let mut devices = HashMap::new();
        for i in 0..leaf_count {
            let global = GlobalPort(LEAF_GLOBAL_PORT_BASE + i as u32);
            let mut leaf = SimDevice::new(format!("leaf{i}"));
            leaf.link(
                TRUNK_FACING_PORT,
                ForwardTarget::Device {
                    device: TRUNK_GLOBAL_PORT,
                    port: TRUNK_FACING_PORT,
                },
            );
            leaf.link(ACCESS_FACING_PORT, ForwardTarget::External(global));
            trunk.link(
                TRUNK_FACING_PORT,
                ForwardTarget::Device {
                    device: global,
                    port: TRUNK_FACING_PORT,
                },
            );
            devices.insert(global, leaf);
        }
        devices.insert(TRUNK_GLOBAL_PORT, trunk);

        Self {
            devices,
            egress,
            walk: Mutex::new(()),
        }
    }

    /// All global ports, sorted (trunk first, then leaves).
    pub fn ports(&self) -> Vec<GlobalPort> {
        let mut ports: Vec<GlobalPort> = self.devices.keys().copied().collect();
        ports.sort();
        ports
    }

    /// Number of leaf devices.
    pub fn leaf_count(&self) -> usize {
        self.devices.len() - 1
    }

    /// Replaces the trunk device's flow table.
    pub fn install_trunk_flows(&self, flows: Vec<FlowEntry>) -> Result<()> {
        self.install_flows(TRUNK_GLOBAL_PORT, flows)
    }

    /// Replaces a leaf device's flow table, addressed by its global port.
    pub fn install_leaf_flows(&self, leaf_port: GlobalPort, flows: Vec<FlowEntry>) -> Result<()> {
        self.install_flows(leaf_port, flows)
    }

    fn install_flows(&self, port: GlobalPort, flows: Vec<FlowEntry>) -> Result<()> {
        let device = self.device(port)?;
        debug!(device = device.name(), flows = flows.len(), "installing flow table");
        device.install_flows(flows);
        Ok(())
    }

    fn device(&self, port: GlobalPort) -> Result<&SimDevice> {
        self.devices
            .get(&port)
            .ok_or(DataplaneError::UnknownPort(port))
    }

    /// Accepts one frame at a global port and drives it to completion.
    ///
    /// The frame enters the addressed device through its access-facing
    /// local port and hops device to device until every copy has reached
    /// the external egress sink or dropped. Malformed bytes drop the one
    /// frame with a warning; unsupported flow-rule kinds abort the walk
    /// with an error, leaving the fabric ready for subsequent frames.
    pub fn ingress(&self, port: GlobalPort, input: impl Into<FrameInput>) -> Result<()> {
        let frame = match input.into() {
            FrameInput::Frame(frame) => frame,
            FrameInput::Bytes(bytes) => match EthernetFrame::from_bytes(&bytes) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(%port, %err, "discarding malformed frame");
                    return Ok(());
                }
            },
        };
        // fail before taking the walk lock on a bad address
        self.device(port)?;

        let _walk = self.walk.lock();
        let mut pending = VecDeque::new();
        pending.push_back((port, ACCESS_FACING_PORT, frame));

        while let Some((at, in_port, frame)) = pending.pop_front() {
            let device = self.device(at)?;
            debug!(device = device.name(), port = %in_port, "ingress");

            let Some(outcome) = device.process(in_port, &frame)? else {
                debug!(device = device.name(), "no matching flow, dropped");
                continue;
            };
            let Some(egress_port) = outcome.egress else {
                debug!(device = device.name(), "matched flow selected no egress port, dropped");
                continue;
            };

            let targets = device.targets(egress_port);
            if targets.is_empty() {
                debug!(device = device.name(), port = %egress_port, "no forwarding target");
                continue;
            }
            for target in targets {
                match *target {
                    ForwardTarget::Device { device: next, port: next_port } => {
                        pending.push_back((next, next_port, outcome.frame.clone()));
                    }
                    ForwardTarget::External(global) => {
                        debug!(device = device.name(), port = %global, "egress");
                        (self.egress)(global, &outcome.frame);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Action, MatchField};
    use crate::frame::{MacAddress, ETHERTYPE_IPV4};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    type Captured = Arc<Mutex<Vec<(GlobalPort, EthernetFrame)>>>;

    fn capture_sink() -> (Captured, EgressSink) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let egress: EgressSink = Box::new(move |port, frame: &EthernetFrame| {
            sink.lock().push((port, frame.clone()));
        });
        (captured, egress)
    }

    fn frame() -> EthernetFrame {
        EthernetFrame::new(
            MacAddress([2, 0, 0, 0, 0, 1]),
            MacAddress([2, 0, 0, 0, 0, 2]),
            ETHERTYPE_IPV4,
            vec![0x42],
        )
    }

    #[test]
    fn test_build_assigns_global_ports() {
        let (_, egress) = capture_sink();
        let fabric = PonFabric::build(3, egress);
        assert_eq!(fabric.leaf_count(), 3);
        assert_eq!(
            fabric.ports(),
            vec![
                GlobalPort(0),
                GlobalPort(128),
                GlobalPort(129),
                GlobalPort(130)
            ]
        );
    }

    #[test]
    fn test_ingress_at_unknown_port_is_an_error() {
        let (_, egress) = capture_sink();
        let fabric = PonFabric::build(1, egress);
        let err = fabric.ingress(GlobalPort(200), frame()).unwrap_err();
        assert!(matches!(err, DataplaneError::UnknownPort(GlobalPort(200))));
    }

    #[test]
    fn test_install_at_unknown_port_is_an_error() {
        let (_, egress) = capture_sink();
        let fabric = PonFabric::build(1, egress);
        let err = fabric.install_leaf_flows(GlobalPort(129), vec![]).unwrap_err();
        assert!(matches!(err, DataplaneError::UnknownPort(GlobalPort(129))));
    }

    #[test]
    fn test_empty_tables_drop_everything() {
        let (captured, egress) = capture_sink();
        let fabric = PonFabric::build(1, egress);
        fabric.ingress(GlobalPort(128), frame()).unwrap();
        assert!(captured.lock().is_empty());
    }

    #[test]
    fn test_malformed_bytes_are_dropped_softly() {
        let (captured, egress) = capture_sink();
        let fabric = PonFabric::build(1, egress);
        fabric.ingress(GlobalPort(128), vec![0u8; 5]).unwrap();
        assert!(captured.lock().is_empty());

        // the fabric keeps serving after the bad frame
        fabric
            .install_leaf_flows(
                GlobalPort(128),
                vec![FlowEntry::new(100)
                    .matching(MatchField::InPort(ACCESS_FACING_PORT))
                    .action(Action::Output(ACCESS_FACING_PORT))],
            )
            .unwrap();
        fabric.ingress(GlobalPort(128), frame()).unwrap();
        assert_eq!(captured.lock().len(), 1);
    }

    #[test]
    fn test_hairpin_to_external_egress() {
        let (captured, egress) = capture_sink();
        let fabric = PonFabric::build(1, egress);
        // reflect access ingress straight back out the access port
        fabric
            .install_trunk_flows(vec![FlowEntry::new(100)
                .matching(MatchField::InPort(ACCESS_FACING_PORT))
                .action(Action::Output(ACCESS_FACING_PORT))])
            .unwrap();

        fabric.ingress(TRUNK_GLOBAL_PORT, frame()).unwrap();
        let captured = captured.lock();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0, TRUNK_GLOBAL_PORT);
        assert_eq!(captured[0].1, frame());
    }

    #[test]
    fn test_broadcast_reaches_every_leaf_in_order() {
        let (captured, egress) = capture_sink();
        let fabric = PonFabric::build(3, egress);
        fabric
            .install_trunk_flows(vec![FlowEntry::new(100)
                .matching(MatchField::InPort(ACCESS_FACING_PORT))
                .action(Action::Output(TRUNK_FACING_PORT))])
            .unwrap();
        let forward_down = vec![FlowEntry::new(100)
            .matching(MatchField::InPort(TRUNK_FACING_PORT))
            .action(Action::Output(ACCESS_FACING_PORT))];
        for i in 0..3 {
            fabric
                .install_leaf_flows(GlobalPort(128 + i), forward_down.clone())
                .unwrap();
        }

        fabric.ingress(TRUNK_GLOBAL_PORT, frame()).unwrap();
        let captured = captured.lock();
        let ports: Vec<GlobalPort> = captured.iter().map(|(port, _)| *port).collect();
        assert_eq!(ports, vec![GlobalPort(128), GlobalPort(129), GlobalPort(130)]);
        for (_, delivered) in captured.iter() {
            assert_eq!(*delivered, frame());
        }
    }

    #[test]
    fn test_sequential_ingress_preserves_egress_order() {
        let (captured, egress) = capture_sink();
        let fabric = PonFabric::build(1, egress);
        fabric
            .install_trunk_flows(vec![FlowEntry::new(100)
                .matching(MatchField::InPort(ACCESS_FACING_PORT))
                .action(Action::Output(ACCESS_FACING_PORT))])
            .unwrap();

        for payload in 0u8..4 {
            let mut f = frame();
            f.payload = vec![payload];
            fabric.ingress(TRUNK_GLOBAL_PORT, f).unwrap();
        }
        let payloads: Vec<u8> = captured.lock().iter().map(|(_, f)| f.payload[0]).collect();
        assert_eq!(payloads, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_fabric_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PonFabric>();
    }
}
