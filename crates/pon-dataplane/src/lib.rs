//! pon-dataplane - match/action dataplane simulator for PON access networks
//!
//! Simulates a small access network at the Ethernet frame level: one trunk
//! device (the OLT role) aggregating N leaf devices (the ONU role) over a
//! shared broadcast medium. Each device evaluates an OpenFlow-style
//! match/action flow table; the fabric wires device ports together and
//! drives frames from external ingress to external egress.
//!
//! Modules:
//! - `frame`: Ethernet frame model with single-tag VLAN handling
//! - `flow`: flow-rule types mirroring the OpenFlow 1.3 wire shape
//! - `engine`: per-device first-match evaluation and action execution
//! - `device`: a simulated device (flow table + forwarding links)
//! - `fabric`: topology construction and frame forwarding
//! - `port`: global vs. local port addressing

mod device;
mod engine;
mod error;
mod fabric;
mod flow;
mod frame;
mod port;

pub use device::{ForwardTarget, SimDevice};
pub use engine::{FlowTable, Outcome};
pub use error::{DataplaneError, FrameError, Result};
pub use fabric::{
    EgressSink, FrameInput, PonFabric, ACCESS_FACING_PORT, LEAF_GLOBAL_PORT_BASE,
    TRUNK_FACING_PORT, TRUNK_GLOBAL_PORT,
};
pub use flow::{action_kind, oxm, Action, FlowEntry, MatchField, SetField, VLAN_PRESENT, VLAN_VID_MASK};
pub use frame::{
    EthernetFrame, MacAddress, VlanTag, ETHERTYPE_DOT1Q, ETHERTYPE_IPV4, ETHERTYPE_QINQ,
};
pub use port::{GlobalPort, LocalPort};
