//! Error types for the dataplane simulator.

use thiserror::Error;

use crate::port::GlobalPort;

/// Errors surfaced by flow evaluation and frame forwarding.
///
/// Soft conditions (no matching flow, no forwarding target, malformed bytes
/// at ingress) are not represented here; they drop the single frame and are
/// logged. These variants are the fatal ones: they abort the `process` or
/// `ingress` call that hit them so that protocol/engine version skew is
/// visible to the caller instead of masked as a silent drop.
#[derive(Debug, Error)]
pub enum DataplaneError {
    /// Match-field kind defined by the flow-rule protocol but not
    /// implemented by this engine.
    #[error("unsupported match field kind {0}")]
    UnsupportedField(u16),

    /// Action kind defined by the flow-rule protocol but not implemented
    /// by this engine (notably GROUP).
    #[error("unsupported action kind {0}")]
    UnsupportedAction(u16),

    /// SET_FIELD on a frame that carries no VLAN tag to rewrite.
    #[error("set-field kind {0} requires a tagged frame")]
    SetFieldUntagged(u16),

    /// No device is mapped at the addressed global port.
    #[error("no device at global port {0}")]
    UnknownPort(GlobalPort),

    /// Frame bytes failed to decode.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Errors raised while decoding wire bytes into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer bytes than the headers claim.
    #[error("frame truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
}

/// Result type for dataplane operations.
pub type Result<T> = std::result::Result<T, DataplaneError>;
