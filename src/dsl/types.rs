use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{DslError, DslResult};
use crate::crypto::sha256_concat;

/// Current wall-clock time in unix seconds
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Credential identifier (`jti`), opaque and unique per credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(String);

impl CredentialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `SHA256(jti)`, the form in which the identifier enters every derivation
    pub fn digest(&self) -> [u8; 32] {
        sha256_concat(&[self.0.as_bytes()])
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CredentialId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CredentialId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Issuer-wide secret every credential seed is derived from
pub struct MasterSecret(SecretBox<[u8; 32]>);

impl MasterSecret {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(SecretBox::new(Box::new(bytes)))
    }

    pub fn expose(&self) -> &[u8; 32] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// Per-credential seed shared between the issuer and the holder
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; 32]);

impl Seed {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> DslResult<Self> {
        let bytes = crate::crypto::hex_to_bytes(hex_str)
            .map_err(|e| DslError::Input(format!("seed is not valid hex: {e}")))?;
        fixed_32(bytes, "seed").map(Self)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// One-epoch token, `HMAC(seed, epoch)`
#[derive(Clone, PartialEq, Eq)]
pub struct Token([u8; 32]);

impl Token {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        B64.encode(self.0)
    }

    pub fn from_base64(encoded: &str) -> DslResult<Self> {
        let bytes = B64
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| DslError::Input(format!("token is not valid base64url: {e}")))?;
        fixed_32(bytes, "token").map(Self)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

/// Index of a fixed-length time bucket, `floor(unix_time / period)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn index(self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// First second of this epoch
    pub fn start(self, period: Period) -> u64 {
        self.0.saturating_mul(period.as_secs())
    }

    /// First second of the following epoch
    pub fn next_start(self, period: Period) -> u64 {
        self.0.saturating_add(1).saturating_mul(period.as_secs())
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token rotation period in seconds, never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period(NonZeroU64);

impl Period {
    pub const DEFAULT_SECS: u64 = 60;

    pub const DEFAULT: Period = match NonZeroU64::new(Self::DEFAULT_SECS) {
        Some(secs) => Period(secs),
        None => unreachable!(),
    };

    pub fn from_secs(secs: u64) -> DslResult<Self> {
        NonZeroU64::new(secs)
            .map(Self)
            .ok_or_else(|| DslError::Input("period must be at least one second".to_string()))
    }

    pub fn as_secs(self) -> u64 {
        self.0.get()
    }

    pub fn epoch_at(self, unix_time: u64) -> Epoch {
        Epoch(unix_time / self.0.get())
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Published identifier; the only status artifact anybody sees
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevocationIdentifier([u8; 32]);

impl RevocationIdentifier {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        B64.encode(self.0)
    }
}

impl fmt::Display for RevocationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for RevocationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevocationIdentifier({})", self.to_base64())
    }
}

impl FromStr for RevocationIdentifier {
    type Err = DslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = B64
            .decode(s.trim_end_matches('='))
            .map_err(|e| DslError::Input(format!("identifier is not valid base64url: {e}")))?;
        fixed_32(bytes, "identifier").map(Self)
    }
}

impl Serialize for RevocationIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for RevocationIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(serde::de::Error::custom)
    }
}

/// Validity of a credential; revocation is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialStatus {
    Valid,
    Revoked,
}

impl CredentialStatus {
    pub fn from_valid_bit(valid: bool) -> Self {
        if valid {
            CredentialStatus::Valid
        } else {
            CredentialStatus::Revoked
        }
    }

    pub fn is_valid(self) -> bool {
        self == CredentialStatus::Valid
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::Valid => f.write_str("valid"),
            CredentialStatus::Revoked => f.write_str("revoked"),
        }
    }
}

fn fixed_32(bytes: Vec<u8>, what: &str) -> DslResult<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| DslError::Input(format!("{what} must be 32 bytes, got {}", b.len())))
}
