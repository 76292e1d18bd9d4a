//! Type-safe identifiers for bus entities.
//!
//! Newtype wrappers keep group numbers, user numbers and correlation tokens
//! from being mixed up at compile time.
//!
//! | Type | Wire form | Example |
//! |------|-----------|---------|
//! | [`GroupId`] | integer | `123456789` |
//! | [`UserId`] | integer | `10001` |
//! | [`EchoToken`] | string `"<seq>:<issued_ms>"` | `"7:1760870400123"` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// GroupId
// ============================================================================

/// QQ group number. Used as the scope of a collection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    /// Creates a group ID.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw group number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

// ============================================================================
// UserId
// ============================================================================

/// QQ user number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a user ID.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw user number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// EchoToken
// ============================================================================

/// Correlation token carried in the `echo` field.
///
/// Minted by the correlator from its own monotonic counter plus the issue
/// time. Unique for the lifetime of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EchoToken {
    seq: u64,
    issued_ms: u64,
}

impl EchoToken {
    /// Creates a token from a sequence number and issue time (epoch millis).
    #[inline]
    #[must_use]
    pub const fn new(seq: u64, issued_ms: u64) -> Self {
        Self { seq, issued_ms }
    }

    /// Returns the sequence number.
    #[inline]
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the issue time in epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn issued_ms(&self) -> u64 {
        self.issued_ms
    }
}

impl fmt::Display for EchoToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.seq, self.issued_ms)
    }
}

impl FromStr for EchoToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (seq, issued_ms) = s
            .split_once(':')
            .ok_or_else(|| Error::malformed(format!("echo without separator: {s}")))?;

        let seq = seq
            .parse()
            .map_err(|_| Error::malformed(format!("echo sequence not numeric: {s}")))?;
        let issued_ms = issued_ms
            .parse()
            .map_err(|_| Error::malformed(format!("echo timestamp not numeric: {s}")))?;

        Ok(Self { seq, issued_ms })
    }
}

impl From<EchoToken> for String {
    fn from(token: EchoToken) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for EchoToken {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Tests
// ============================================================================
