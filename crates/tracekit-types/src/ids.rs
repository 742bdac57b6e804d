//! Typed identifiers for traces and spans.
//!
//! `TraceId` is 128 bits, `SpanId` is 64 bits, matching the wire shapes
//! tracing backends (OTel-compatible collectors included) expect. Both are
//! opaque on the wire (raw bytes) and render as lowercase hex for logs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 128-bit trace identifier, shared by every span in a trace.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(u128);

/// 64-bit span identifier, unique within its trace.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(u64);

impl TraceId {
    /// Generate a new random trace id.
    ///
    /// Never returns the nil id — a crossed coin-flip against an all-zero
    /// `u128` is astronomically unlikely but checked anyway since `nil()` is
    /// reserved as a sentinel.
    pub fn new() -> Self {
        loop {
            let v: u128 = rand::random();
            if v != 0 {
                return Self(v);
            }
        }
    }

    /// The nil trace id — sentinel only, never assigned to a real trace.
    pub const fn nil() -> Self {
        Self(0)
    }

    pub const fn is_nil(&self) -> bool {
        self.0 == 0
    }

    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    pub const fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    pub const fn from_bytes(b: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(b))
    }

    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }

    /// Parse a 32-character hex string.
    pub fn parse(s: &str) -> Result<Self, ParseIdError> {
        if s.len() != 32 {
            return Err(ParseIdError::WrongLength {
                expected: 32,
                actual: s.len(),
            });
        }
        let v = u128::from_str_radix(s, 16).map_err(|_| ParseIdError::NotHex(s.to_string()))?;
        Ok(Self(v))
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.to_hex())
    }
}

impl SpanId {
    /// Generate a new random span id. Never nil.
    pub fn new() -> Self {
        loop {
            let v: u64 = rand::random();
            if v != 0 {
                return Self(v);
            }
        }
    }

    pub const fn nil() -> Self {
        Self(0)
    }

    pub const fn is_nil(&self) -> bool {
        self.0 == 0
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn to_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub const fn from_bytes(b: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(b))
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// First 8 hex chars — for human-facing display only, never a lookup key.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    pub fn parse(s: &str) -> Result<Self, ParseIdError> {
        if s.len() != 16 {
            return Err(ParseIdError::WrongLength {
                expected: 16,
                actual: s.len(),
            });
        }
        let v = u64::from_str_radix(s, 16).map_err(|_| ParseIdError::NotHex(s.to_string()))?;
        Ok(Self(v))
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.to_hex())
    }
}

/// Error parsing a hex-encoded id.
#[derive(Debug, thiserror::Error)]
pub enum ParseIdError {
    #[error("expected {expected} hex chars, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("not valid hex: '{0}'")]
    NotHex(String),
}
