use super::errors::DslResult;
use super::types::{Epoch, Period, Seed, Token};
use crate::crypto::mac::hmac_sha256;

/// Token of the epoch containing `unix_time`: `HMAC-SHA256(seed, BE64(epoch))`.
///
/// Any two instants of the same epoch yield the same token. The only failure
/// is the HMAC primitive itself, which is reported as a crypto error.
pub fn rotate_token(seed: &Seed, unix_time: u64, period: Period) -> DslResult<(Token, Epoch)> {
    let epoch = period.epoch_at(unix_time);
    let tag = hmac_sha256(seed.as_bytes(), epoch.to_be_bytes())?;
    Ok((Token::from_bytes(tag), epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Seed {
        Seed::from_bytes([9u8; 32])
    }

    #[test]
    fn test_same_epoch_same_token() {
        let period = Period::from_secs(60).unwrap();
        let start = 1_700_000_040 - 1_700_000_040 % 60;

        let (first, epoch) = rotate_token(&seed(), start, period).unwrap();
        let (last, last_epoch) = rotate_token(&seed(), start + 59, period).unwrap();
        assert_eq!(first, last);
        assert_eq!(epoch, last_epoch);
    }

    #[test]
    fn test_next_epoch_new_token() {
        let period = Period::from_secs(60).unwrap();
        let t = 1_700_000_000;

        let (now, epoch) = rotate_token(&seed(), t, period).unwrap();
        let (later, next_epoch) = rotate_token(&seed(), t + 60, period).unwrap();
        assert_ne!(now, later);
        assert_eq!(next_epoch.index(), epoch.index() + 1);
    }

    #[test]
    fn test_token_is_hmac_of_big_endian_epoch() {
        let period = Period::from_secs(10).unwrap();
        let (token, epoch) = rotate_token(&seed(), 1234, period).unwrap();
        assert_eq!(epoch.index(), 123);

        let expected = hmac_sha256([9u8; 32], 123u64.to_be_bytes()).unwrap();
        assert_eq!(token.as_bytes(), &expected);
    }
}
