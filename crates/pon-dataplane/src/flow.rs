//! Flow-rule types mirroring the OpenFlow 1.3 flow-mod shape.
//!
//! The numeric kinds below are a compatibility contract with the
//! control-plane protocol that delivers decomposed flow rules; they must
//! not be renumbered or reordered. Kinds the protocol defines but this
//! engine does not execute are representable through the `Other`/`Group`
//! arms and surface as explicit unsupported errors at evaluation time.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::port::LocalPort;

/// OXM basic match-field kind numbers (OpenFlow 1.3 `OFPXMT_OFB_*`).
pub mod oxm {
    pub const IN_PORT: u16 = 0;
    pub const ETH_TYPE: u16 = 5;
    pub const VLAN_VID: u16 = 6;
    pub const VLAN_PCP: u16 = 7;
    pub const IP_PROTO: u16 = 10;
    pub const IPV4_DST: u16 = 12;
    pub const UDP_DST: u16 = 16;
}

/// Action type numbers (OpenFlow 1.3 `OFPAT_*`).
pub mod action_kind {
    pub const OUTPUT: u16 = 0;
    pub const PUSH_VLAN: u16 = 17;
    pub const POP_VLAN: u16 = 18;
    pub const GROUP: u16 = 22;
    pub const SET_FIELD: u16 = 25;
}

/// Presence flag carried in VLAN_VID match values (`OFPVID_PRESENT`): set
/// means "tagged, id = value & VLAN_VID_MASK", clear means "untagged".
pub const VLAN_PRESENT: u16 = 0x1000;
/// Low 12 bits of a VLAN_VID match value.
pub const VLAN_VID_MASK: u16 = 0x0fff;

/// One match condition of a flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchField {
    /// Ingress local port equals.
    InPort(LocalPort),
    /// Non-shim ethertype equals (the shim's inner type on tagged frames).
    EthType(u16),
    /// VLAN id with presence encoding, see [`VLAN_PRESENT`].
    VlanVid(u16),
    /// Shim priority bits equal (requires a tagged frame).
    VlanPcp(u8),
    /// IP protocol number equals (requires an IPv4 payload).
    IpProto(u8),
    /// IPv4 destination equals (requires an IPv4 payload).
    Ipv4Dst(Ipv4Addr),
    /// UDP destination port equals (requires an IPv4/UDP payload).
    UdpDst(u16),
    /// Kind defined by the protocol but not implemented by this engine.
    Other(u16),
}

impl MatchField {
    /// Wire kind number of this field.
    pub fn kind(&self) -> u16 {
        match self {
            Self::InPort(_) => oxm::IN_PORT,
            Self::EthType(_) => oxm::ETH_TYPE,
            Self::VlanVid(_) => oxm::VLAN_VID,
            Self::VlanPcp(_) => oxm::VLAN_PCP,
            Self::IpProto(_) => oxm::IP_PROTO,
            Self::Ipv4Dst(_) => oxm::IPV4_DST,
            Self::UdpDst(_) => oxm::UDP_DST,
            Self::Other(kind) => *kind,
        }
    }

    /// VLAN_VID condition requiring a tagged frame with the given id.
    pub fn vlan_tagged(vid: u16) -> Self {
        Self::VlanVid(VLAN_PRESENT | (vid & VLAN_VID_MASK))
    }

    /// VLAN_VID condition requiring an untagged frame.
    pub fn vlan_untagged() -> Self {
        Self::VlanVid(0)
    }
}

/// Target of a SET_FIELD action. Only VLAN sub-fields are rewritable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetField {
    VlanVid(u16),
    VlanPcp(u8),
    /// Field kind the engine cannot rewrite.
    Other(u16),
}

impl SetField {
    /// Wire kind number of the rewritten field.
    pub fn kind(&self) -> u16 {
        match self {
            Self::VlanVid(_) => oxm::VLAN_VID,
            Self::VlanPcp(_) => oxm::VLAN_PCP,
            Self::Other(kind) => *kind,
        }
    }
}

/// One action of a flow entry, executed in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Record the local egress port for the frame.
    Output(LocalPort),
    /// Remove the VLAN shim (no-op when untagged).
    PopVlan,
    /// Wrap the frame in a new shim with this outer ethertype.
    PushVlan(u16),
    /// Rewrite a field of the existing shim.
    SetField(SetField),
    /// Group tables are not executed by this engine; evaluating this
    /// action is an explicit unsupported error, never a silent drop.
    Group(u32),
    /// Kind defined by the protocol but not implemented by this engine.
    Other(u16),
}

impl Action {
    /// Wire kind number of this action.
    pub fn kind(&self) -> u16 {
        match self {
            Self::Output(_) => action_kind::OUTPUT,
            Self::PushVlan(_) => action_kind::PUSH_VLAN,
            Self::PopVlan => action_kind::POP_VLAN,
            Self::SetField(_) => action_kind::SET_FIELD,
            Self::Group(_) => action_kind::GROUP,
            Self::Other(kind) => *kind,
        }
    }
}

/// One priority-ordered match/action rule.
///
/// Entries with higher priority are evaluated first; equal priorities keep
/// their install order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub priority: i32,
    pub matches: Vec<MatchField>,
    pub actions: Vec<Action>,
    /// Goto-table id from the wire format. Accepted for compatibility;
    /// this engine runs a single flat table and never chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_table: Option<u8>,
}

impl FlowEntry {
    /// Creates an empty entry at the given priority.
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            matches: Vec::new(),
            actions: Vec::new(),
            next_table: None,
        }
    }

    /// Appends a match condition.
    pub fn matching(mut self, field: MatchField) -> Self {
        self.matches.push(field);
        self
    }

    /// Appends an action.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Records the goto-table hint from the wire format.
    pub fn goto_table(mut self, table: u8) -> Self {
        self.next_table = Some(table);
        self
    }
}
