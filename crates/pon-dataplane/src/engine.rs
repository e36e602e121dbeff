//! Per-device match/action evaluation.
//!
//! A [`FlowTable`] holds one device's rules in precedence order and
//! evaluates them against a single frame at a time: first entry whose match
//! conditions are all satisfied wins, and its actions run in list order
//! over a working copy of the frame.

use std::cmp::Reverse;

use crate::error::{DataplaneError, Result};
use crate::flow::{action_kind, Action, FlowEntry, MatchField, SetField, VLAN_PRESENT, VLAN_VID_MASK};
use crate::frame::EthernetFrame;
use crate::port::LocalPort;

/// Result of a matched flow: the candidate egress port and the frame after
/// action execution.
///
/// `egress` is `None` when the matched entry executed no OUTPUT action —
/// distinct from "no entry matched", which `process` reports as `None`
/// overall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub egress: Option<LocalPort>,
    pub frame: EthernetFrame,
}

/// An ordered flow table, highest priority first.
#[derive(Debug, Default)]
pub struct FlowTable {
    entries: Vec<FlowEntry>,
}

impl FlowTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole table.
    ///
    /// Entries are stored by descending priority; the sort is stable so
    /// equal priorities keep their install order.
    pub fn install(&mut self, mut flows: Vec<FlowEntry>) {
        flows.sort_by_key(|flow| Reverse(flow.priority));
        self.entries = flows;
    }

    /// Installed entries in evaluation order.
    pub fn entries(&self) -> &[FlowEntry] {
        &self.entries
    }

    /// Number of installed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are installed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluates the table against one frame.
    ///
    /// Returns `Ok(None)` when no entry matches (the caller drops the
    /// frame), `Ok(Some(outcome))` for the first matching entry, and an
    /// error when an unsupported field or action kind is hit.
    pub fn process(&self, in_port: LocalPort, frame: &EthernetFrame) -> Result<Option<Outcome>> {
        for entry in &self.entries {
            if is_match(entry, in_port, frame)? {
                return execute(entry, frame.clone()).map(Some);
            }
        }
        Ok(None)
    }
}

/// True when every match condition of `entry` is satisfied.
fn is_match(entry: &FlowEntry, in_port: LocalPort, frame: &EthernetFrame) -> Result<bool> {
    for field in &entry.matches {
        let satisfied = match *field {
            MatchField::InPort(port) => port == in_port,
            MatchField::EthType(ethertype) => frame.non_shim_ethertype() == ethertype,
            MatchField::IpProto(proto) => frame.ip_proto() == Some(proto),
            MatchField::VlanVid(value) => {
                let want_tagged = value & VLAN_PRESENT != 0;
                match (&frame.tag, want_tagged) {
                    (Some(tag), true) => tag.vid == value & VLAN_VID_MASK,
                    (None, false) => true,
                    _ => false,
                }
            }
            MatchField::VlanPcp(pcp) => frame.tag.as_ref().map(|tag| tag.pcp) == Some(pcp),
            MatchField::Ipv4Dst(addr) => frame.ipv4_dst() == Some(addr),
            MatchField::UdpDst(port) => frame.udp_dst() == Some(port),
            MatchField::Other(kind) => return Err(DataplaneError::UnsupportedField(kind)),
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Runs the entry's actions in list order over the frame.
fn execute(entry: &FlowEntry, mut frame: EthernetFrame) -> Result<Outcome> {
    let mut egress = None;
    for action in &entry.actions {
        match *action {
            // A later OUTPUT overwrites an earlier one; pinned by tests
            // until the control plane defines multi-output behavior.
            Action::Output(port) => egress = Some(port),
            Action::PopVlan => frame = frame.pop_vlan(),
            Action::PushVlan(ethertype) => frame = frame.push_vlan(ethertype),
            Action::SetField(set) => {
                let rewritten = match set {
                    SetField::VlanVid(vid) => frame.set_vlan_vid(vid),
                    SetField::VlanPcp(pcp) => frame.set_vlan_pcp(pcp),
                    SetField::Other(kind) => return Err(DataplaneError::UnsupportedField(kind)),
                };
                if !rewritten {
                    return Err(DataplaneError::SetFieldUntagged(set.kind()));
                }
            }
            Action::Group(_) => return Err(DataplaneError::UnsupportedAction(action_kind::GROUP)),
            Action::Other(kind) => return Err(DataplaneError::UnsupportedAction(kind)),
        }
    }
    Ok(Outcome { egress, frame })
}
