//! Ethernet frame model with single-tag VLAN handling.
//!
//! A frame carries at most one 802.1Q shim. Tag push/pop/rewrite operate on
//! the structured header fields, so re-encoding after a transformation is
//! byte-exact. The payload stays opaque except for the read-only IPv4/UDP
//! accessors that flow matching needs.

use std::fmt;
use std::net::Ipv4Addr;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// 802.1Q tag protocol identifier.
pub const ETHERTYPE_DOT1Q: u16 = 0x8100;
/// 802.1ad service tag protocol identifier (recognized on decode, never
/// produced by this engine).
pub const ETHERTYPE_QINQ: u16 = 0x88a8;
/// IPv4 ethertype.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

const ETH_HEADER_LEN: usize = 14;
const TAGGED_HEADER_LEN: usize = 18;
const IPV4_MIN_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;
const IP_PROTO_UDP: u8 = 17;

/// MAC address representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Zero MAC address.
    pub const ZERO: Self = Self([0, 0, 0, 0, 0, 0]);

    /// Broadcast MAC address.
    pub const BROADCAST: Self = Self([0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);

    /// Check if this is a broadcast MAC.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST.0
    }

    /// Parse MAC from colon-separated string (e.g., "00:11:22:33:44:55").
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return None;
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// The single VLAN shim a frame may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanTag {
    /// Priority code point (3 bits).
    pub pcp: u8,
    /// Drop eligible indicator.
    pub dei: bool,
    /// VLAN identifier (12 bits).
    pub vid: u16,
    /// Ethertype of the encapsulated payload.
    pub inner_ethertype: u16,
}

impl VlanTag {
    fn tci(&self) -> u16 {
        (u16::from(self.pcp & 0x07) << 13) | (u16::from(self.dei) << 12) | (self.vid & 0x0fff)
    }

    fn from_tci(tci: u16, inner_ethertype: u16) -> Self {
        Self {
            pcp: (tci >> 13) as u8,
            dei: tci & 0x1000 != 0,
            vid: tci & 0x0fff,
            inner_ethertype,
        }
    }
}

/// An Ethernet frame: addresses, ethertype, optional VLAN shim, payload.
///
/// When a tag is present, `ethertype` holds the outer tag protocol
/// identifier (0x8100 for frames this engine produces) and the tag records
/// the encapsulated ethertype. `payload` always starts after the last
/// header byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthernetFrame {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: u16,
    pub tag: Option<VlanTag>,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Creates an untagged frame.
    pub fn new(dst: MacAddress, src: MacAddress, ethertype: u16, payload: Vec<u8>) -> Self {
        Self {
            dst,
            src,
            ethertype,
            tag: None,
            payload,
        }
    }

    /// Decodes a frame from wire bytes.
    ///
    /// A 0x8100 or 0x88a8 ethertype introduces one shim; anything beyond it
    /// (including a second tag) is left in the payload untouched.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < ETH_HEADER_LEN {
            return Err(FrameError::Truncated {
                need: ETH_HEADER_LEN,
                have: bytes.len(),
            });
        }
        let dst = mac_at(bytes, 0);
        let src = mac_at(bytes, 6);
        let ethertype = BigEndian::read_u16(&bytes[12..14]);

        if ethertype == ETHERTYPE_DOT1Q || ethertype == ETHERTYPE_QINQ {
            if bytes.len() < TAGGED_HEADER_LEN {
                return Err(FrameError::Truncated {
                    need: TAGGED_HEADER_LEN,
                    have: bytes.len(),
                });
            }
            let tci = BigEndian::read_u16(&bytes[14..16]);
            let inner = BigEndian::read_u16(&bytes[16..18]);
            Ok(Self {
                dst,
                src,
                ethertype,
                tag: Some(VlanTag::from_tci(tci, inner)),
                payload: bytes[TAGGED_HEADER_LEN..].to_vec(),
            })
        } else {
            Ok(Self {
                dst,
                src,
                ethertype,
                tag: None,
                payload: bytes[ETH_HEADER_LEN..].to_vec(),
            })
        }
    }

    /// Encodes the frame back to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TAGGED_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.dst.0);
        out.extend_from_slice(&self.src.0);
        out.extend_from_slice(&self.ethertype.to_be_bytes());
        if let Some(tag) = &self.tag {
            out.extend_from_slice(&tag.tci().to_be_bytes());
            out.extend_from_slice(&tag.inner_ethertype.to_be_bytes());
        }
        out.extend_from_slice(&self.payload);
        out
    }

    /// True when the frame carries a VLAN shim.
    #[inline]
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// The ethertype of the encapsulated protocol: the shim's inner type on
    /// tagged frames, the outer ethertype otherwise.
    pub fn non_shim_ethertype(&self) -> u16 {
        match &self.tag {
            Some(tag) => tag.inner_ethertype,
            None => self.ethertype,
        }
    }

    /// Removes the shim, restoring its inner ethertype as the frame's
    /// ethertype. No-op on untagged frames.
    pub fn pop_vlan(mut self) -> Self {
        if let Some(tag) = self.tag.take() {
            self.ethertype = tag.inner_ethertype;
        }
        self
    }

    /// Wraps the frame in a new shim with the given tag protocol
    /// identifier as the outer ethertype.
    ///
    /// An existing shim is replaced, never stacked: the previous outer
    /// ethertype survives only as the new shim's inner type. The new shim
    /// starts with vid 0 / pcp 0, to be rewritten by a following set-field.
    pub fn push_vlan(mut self, tag_ethertype: u16) -> Self {
        self.tag = Some(VlanTag {
            pcp: 0,
            dei: false,
            vid: 0,
            inner_ethertype: self.ethertype,
        });
        self.ethertype = tag_ethertype;
        self
    }

    /// Rewrites the shim's VLAN id in place (low 12 bits of `vid`).
    ///
    /// Returns false when the frame has no shim to rewrite.
    pub fn set_vlan_vid(&mut self, vid: u16) -> bool {
        match &mut self.tag {
            Some(tag) => {
                tag.vid = vid & 0x0fff;
                true
            }
            None => false,
        }
    }

    /// Rewrites the shim's priority bits in place (low 3 bits of `pcp`).
    ///
    /// Returns false when the frame has no shim to rewrite.
    pub fn set_vlan_pcp(&mut self, pcp: u8) -> bool {
        match &mut self.tag {
            Some(tag) => {
                tag.pcp = pcp & 0x07;
                true
            }
            None => false,
        }
    }

    /// Offset of the transport header inside the payload, with the IP
    /// protocol number, when the payload is a well-formed IPv4 packet.
    fn ipv4(&self) -> Option<(usize, u8)> {
        if self.non_shim_ethertype() != ETHERTYPE_IPV4 {
            return None;
        }
        let p = &self.payload;
        if p.len() < IPV4_MIN_HEADER_LEN || p[0] >> 4 != 4 {
            return None;
        }
        let ihl = ((p[0] & 0x0f) as usize) * 4;
        if ihl < IPV4_MIN_HEADER_LEN || p.len() < ihl {
            return None;
        }
        Some((ihl, p[9]))
    }

    /// IP protocol number, when the payload is IPv4.
    pub fn ip_proto(&self) -> Option<u8> {
        self.ipv4().map(|(_, proto)| proto)
    }

    /// IPv4 destination address, when the payload is IPv4.
    pub fn ipv4_dst(&self) -> Option<Ipv4Addr> {
        self.ipv4().map(|_| {
            let p = &self.payload;
            Ipv4Addr::new(p[16], p[17], p[18], p[19])
        })
    }

    /// UDP destination port, when the payload is IPv4/UDP.
    pub fn udp_dst(&self) -> Option<u16> {
        let (ihl, proto) = self.ipv4()?;
        if proto != IP_PROTO_UDP || self.payload.len() < ihl + UDP_HEADER_LEN {
            return None;
        }
        Some(BigEndian::read_u16(&self.payload[ihl + 2..ihl + 4]))
    }

    /// Compact hex rendering of the encoded frame, for debug logs.
    pub fn hex(&self) -> String {
        self.to_bytes().iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn mac_at(bytes: &[u8], offset: usize) -> MacAddress {
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&bytes[offset..offset + 6]);
    MacAddress(mac)
}
