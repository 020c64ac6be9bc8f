//! Core identity and location types shared by every store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Opaque, content-derived identity of a logical program entity.
///
/// Two observations of the same entity (e.g. a function declared in a header
/// included by many compilation units) carry an identical id; distinct
/// entities never collide. The analysis front-end owns that guarantee, this
/// crate only transports the key.
///
/// Serialized as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId([u8; 8]);

impl SymbolId {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Derive an id from a USR-style string the way front-ends do:
    /// SHA-256, truncated to 8 bytes.
    pub fn from_usr(usr: &str) -> Self {
        let digest = Sha256::digest(usr.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 16 {
            return None;
        }
        let mut bytes = [0u8; 8];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for SymbolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("invalid symbol id: {s:?}"))
    }
}

impl Serialize for SymbolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SymbolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Zero-based source range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// A range inside a specific source document.
///
/// `file` is whatever the front-end reported: an absolute path or a URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: Box<str>,
    pub range: Range,
}

impl Location {
    pub fn new(file: impl Into<Box<str>>, range: Range) -> Self {
        Self {
            file: file.into(),
            range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Struct,
    Enum,
    Trait,
    Interface,
    Class,
    Module,
    Variable,
    Constant,
    Field,
    Parameter,
    TypeAlias,
    Macro,
    Unknown,
}

bitflags::bitflags! {
    /// How a location refers to a symbol. A single occurrence can carry
    /// several kinds (a spelled call is `CALL | SPELLED`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
    pub struct RefKind: u8 {
        const DECLARATION = 1;
        const DEFINITION  = 1 << 1;
        const READ        = 1 << 2;
        const WRITE       = 1 << 3;
        const CALL        = 1 << 4;
        const SPELLED     = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Boolean properties observed on a symbol. Merging ORs them together.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct SymbolFlags: u8 {
        const IMPLICIT       = 1;
        const DEPRECATED     = 1 << 1;
        const FROM_MAIN_FILE = 1 << 2;
        const GENERATED      = 1 << 3;
    }
}
