use crate::crypto::errors::CryptoResult;
use rand::Rng;

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(length: usize) -> Vec<u8> {
    let mut buf = vec![0u8; length];
    rand::rng().fill(buf.as_mut_slice());
    buf
}

/// Convert hex string to bytes with validation
pub fn hex_to_bytes(hex_str: &str) -> CryptoResult<Vec<u8>> {
    // Remove common prefixes and whitespace
    let cleaned = hex_str
        .trim()
        .strip_prefix("0x")
        .or_else(|| hex_str.trim().strip_prefix("0X"))
        .unwrap_or(hex_str.trim());

    Ok(hex::decode(cleaned)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_bytes() {
        assert_eq!(hex_to_bytes("0x1234").unwrap(), vec![0x12, 0x34]);
        assert_eq!(hex_to_bytes(" 0X1234 ").unwrap(), vec![0x12, 0x34]);
        assert_eq!(hex_to_bytes("1234").unwrap(), vec![0x12, 0x34]);
        assert!(hex_to_bytes("12z4").is_err());
    }

    #[test]
    fn test_random_bytes() {
        let a = generate_random_bytes(16);
        let b = generate_random_bytes(16);
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
