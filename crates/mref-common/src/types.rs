// ============================================
// File: crates/mref-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the fundamental identifiers used throughout the mref
//! reflector, ensuring type safety and consistent wire representations.
//!
//! ## Main Functionality
//! - `Callsign`: station identifier with base-40 wire packing (6 bytes)
//! - `Module`: a reflector channel letter ('A'..='Z')
//! - `StreamId`: opaque per-transmission identifier (2 bytes)
//! - `ClientId`: stable handle into the client registry arena
//!
//! ## Wire Format
//! Callsigns travel as a 48-bit big-endian base-40 integer. The leftmost
//! character is the least significant digit, so trailing padding encodes
//! to nothing and short callsigns produce small values.
//!
//! ## ⚠️ Important Note for Next Developer
//! - StreamId is an opaque token: never byte-swap it or do arithmetic on
//!   it, copy it verbatim between wire and memory
//! - The 9th callsign character position is reserved for the module
//!   letter by reflector convention
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// The base-40 alphabet from the M17 address encoding.
/// Index 0 is the pad character; indices 1..=26 are 'A'..='Z'.
pub const CALLSIGN_ALPHABET: &[u8; 40] = b" ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-/.";

/// Maximum number of characters a callsign can carry.
pub const CALLSIGN_MAX_CHARS: usize = 9;

/// Size of an encoded callsign on the wire.
pub const CALLSIGN_ENCODED_SIZE: usize = 6;

/// Largest encodable callsign value: 40^9.
const CALLSIGN_VALUE_LIMIT: u64 = 40u64.pow(CALLSIGN_MAX_CHARS as u32);

// ============================================
// Module
// ============================================

/// A reflector module (channel) letter.
///
/// Clients link to exactly one module at a time; audio only fans out
/// between clients linked to the same module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Module(u8);

impl Module {
    /// Creates a `Module` from an ASCII byte.
    ///
    /// # Returns
    /// - `Some(Module)` if the byte is an uppercase ASCII letter
    /// - `None` otherwise
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if byte.is_ascii_uppercase() {
            Some(Self(byte))
        } else {
            None
        }
    }

    /// Creates a `Module` from a char, accepting lowercase input.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        let up = c.to_ascii_uppercase();
        if up.is_ascii_uppercase() {
            Some(Self(up as u8))
        } else {
            None
        }
    }

    /// Returns the module letter as an ASCII byte.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        self.0
    }

    /// Returns the module letter as a char.
    #[must_use]
    pub const fn as_char(&self) -> char {
        self.0 as char
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ============================================
// Callsign
// ============================================

/// A station identifier with optional module annotation.
///
/// # Wire Format
/// ```text
/// ┌───────────────────────────────────────────┐
/// │   48-bit big-endian base-40 integer       │
/// │   digit 0 (least significant) = leftmost  │
/// │   character of the callsign               │
/// └───────────────────────────────────────────┘
/// ```
///
/// # Module Annotation
/// When a module letter is attached (`with_module`), the letter occupies
/// the 9th character position, the convention reflectors use to address
/// a channel ("MREF17  A").
///
/// # Example
/// ```
/// use mref_common::types::Callsign;
///
/// let cs: Callsign = "N7TAE".parse().unwrap();
/// let encoded = cs.encode();
/// let decoded = Callsign::decode(&encoded).unwrap();
/// assert_eq!(cs, decoded);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Callsign {
    /// ASCII characters, space padded to the right.
    chars: [u8; CALLSIGN_MAX_CHARS],
}

impl Callsign {
    /// Creates a `Callsign` from text.
    ///
    /// Input is uppercased. Every character must come from the base-40
    /// alphabet, the text must be 1..=9 characters, and the first
    /// character must not be the pad character.
    ///
    /// # Errors
    /// Returns `CommonError::InvalidCallsign` on any violation.
    pub fn new(text: &str) -> Result<Self, CommonError> {
        if text.is_empty() || text.len() > CALLSIGN_MAX_CHARS {
            return Err(CommonError::invalid_callsign(format!(
                "length {} not in 1..={}",
                text.len(),
                CALLSIGN_MAX_CHARS
            )));
        }

        let mut chars = [b' '; CALLSIGN_MAX_CHARS];
        for (i, c) in text.bytes().enumerate() {
            let up = c.to_ascii_uppercase();
            if char_code(up).is_none() {
                return Err(CommonError::invalid_callsign(format!(
                    "character {:?} not in base-40 alphabet",
                    c as char
                )));
            }
            chars[i] = up;
        }

        if chars[0] == b' ' {
            return Err(CommonError::invalid_callsign("leading pad character"));
        }

        Ok(Self { chars })
    }

    /// Returns a copy with the module letter placed in the 9th position.
    #[must_use]
    pub fn with_module(mut self, module: Module) -> Self {
        self.chars[CALLSIGN_MAX_CHARS - 1] = module.as_byte();
        self
    }

    /// Returns the module letter, if the 9th position carries one.
    #[must_use]
    pub fn module(&self) -> Option<Module> {
        Module::from_byte(self.chars[CALLSIGN_MAX_CHARS - 1])
    }

    /// Returns the base text without module annotation or padding.
    #[must_use]
    pub fn base(&self) -> String {
        let end = CALLSIGN_MAX_CHARS - 1;
        let text: &[u8] = &self.chars[..end];
        String::from_utf8_lossy(text).trim_end().to_string()
    }

    /// Checks structural validity.
    ///
    /// A callsign built through `new`/`decode` is always valid; the
    /// predicate exists so decoded wire data can be gated explicitly.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.chars[0] != b' ' && self.chars.iter().all(|&c| char_code(c).is_some())
    }

    /// Packs the callsign into its 6-byte wire form.
    ///
    /// The leftmost character is the least significant base-40 digit, so
    /// the value is accumulated right-to-left.
    #[must_use]
    pub fn encode(&self) -> [u8; CALLSIGN_ENCODED_SIZE] {
        let mut value: u64 = 0;
        for &c in self.chars.iter().rev() {
            // chars only holds alphabet members, so the lookup cannot miss
            let code = char_code(c).unwrap_or(0);
            value = value * 40 + u64::from(code);
        }

        let be = value.to_be_bytes();
        let mut out = [0u8; CALLSIGN_ENCODED_SIZE];
        out.copy_from_slice(&be[2..8]);
        out
    }

    /// Unpacks a callsign from its 6-byte wire form.
    ///
    /// # Errors
    /// Returns `CommonError::InvalidCallsign` if the value is zero
    /// (empty), at or above 40^9 (out of the address space), or decodes
    /// to a leading pad character.
    pub fn decode(bytes: &[u8; CALLSIGN_ENCODED_SIZE]) -> Result<Self, CommonError> {
        let mut be = [0u8; 8];
        be[2..8].copy_from_slice(bytes);
        let mut value = u64::from_be_bytes(be);

        if value == 0 {
            return Err(CommonError::invalid_callsign("empty address"));
        }
        if value >= CALLSIGN_VALUE_LIMIT {
            return Err(CommonError::invalid_callsign("value above 40^9"));
        }

        let mut chars = [b' '; CALLSIGN_MAX_CHARS];
        let mut i = 0;
        while value > 0 {
            chars[i] = CALLSIGN_ALPHABET[(value % 40) as usize];
            value /= 40;
            i += 1;
        }

        let cs = Self { chars };
        if cs.chars[0] == b' ' {
            return Err(CommonError::invalid_callsign("leading pad character"));
        }
        Ok(cs)
    }

    /// Decodes from an unsized slice, checking the length first.
    ///
    /// # Errors
    /// Returns `CommonError::InvalidLength` if the slice is not exactly
    /// 6 bytes, otherwise defers to [`Callsign::decode`].
    pub fn decode_slice(bytes: &[u8]) -> Result<Self, CommonError> {
        let arr: [u8; CALLSIGN_ENCODED_SIZE] = bytes
            .try_into()
            .map_err(|_| CommonError::invalid_length(CALLSIGN_ENCODED_SIZE, bytes.len()))?;
        Self::decode(&arr)
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.module() {
            Some(m) => write!(f, "{} {}", self.base(), m),
            None => write!(f, "{}", self.base()),
        }
    }
}

impl FromStr for Callsign {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Callsign {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Callsign {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================
// StreamId
// ============================================

/// Opaque per-transmission identifier.
///
/// # Purpose
/// Identifies one continuous transmission (header plus frames). The two
/// bytes are a token chosen by the transmitting node: they are copied
/// verbatim between wire and memory and never interpreted numerically,
/// so there is no byte-order to get wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId([u8; 2]);

impl StreamId {
    /// Creates a `StreamId` from its raw wire bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Returns the raw wire bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // hex of the raw bytes, for log correlation only
        write!(f, "{:02x}{:02x}", self.0[0], self.0[1])
    }
}

// ============================================
// ClientId
// ============================================

/// Stable handle to a client owned by the registry arena.
///
/// Protocol components hold `ClientId`s, never owned client values; the
/// registry is the single owner and the only place clients are created
/// or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u32);

impl ClientId {
    /// Creates a handle from a raw arena index.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================
// Helper Functions
// ============================================

/// Returns the base-40 code of an ASCII byte, or `None` if it is not in
/// the alphabet.
fn char_code(c: u8) -> Option<u8> {
    CALLSIGN_ALPHABET
        .iter()
        .position(|&a| a == c)
        .map(|p| p as u8)
}

// ============================================
// Tests
// ============================================
