//! Difficulty engine
//!
//! Implements the Bitcoin compact target ("nBits") codec and the epoch
//! retarget rule:
//! - Retarget only at heights divisible by the adjustment interval
//! - Observed timespan clamped to 4x in either direction
//! - Target never eased past the proof-of-work limit

use crate::core::block::Block;
use crate::core::params::DifficultyParams;
use crate::crypto::wrap_to_u32;
use log::debug;
use num_bigint::BigUint;
use num_traits::Zero;

/// Sign bit of the compact mantissa
const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Magnitude bits of the compact mantissa
const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// Maximum retarget factor in either direction
pub const MAX_ADJUSTMENT_FACTOR: i64 = 4;

/// Expand compact bits into the full target.
///
/// The high byte is the size in bytes, the low 23 bits the mantissa. The
/// sign bit is never treated as magnitude.
pub fn decode_target(bits: u32) -> BigUint {
    let exponent = bits >> 24;
    let mantissa = bits & COMPACT_MANTISSA_MASK;

    if mantissa == 0 {
        return BigUint::zero();
    }

    let mantissa = BigUint::from(mantissa);
    if exponent <= 3 {
        mantissa >> (8 * (3 - exponent) as usize)
    } else {
        mantissa << (8 * (exponent - 3) as usize)
    }
}

/// Pack a target into compact bits, keeping its top three bytes.
///
/// A mantissa that would set the sign bit is shifted down a byte and the
/// size bumped, so the packed value always reads as positive.
pub fn encode_target(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }

    let bytes = target.to_bytes_be();
    let mut size = bytes.len();
    let mut mantissa = bytes
        .iter()
        .take(3)
        .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
    if size < 3 {
        mantissa <<= 8 * (3 - size) as u32;
    }

    if mantissa & COMPACT_SIGN_BIT != 0 {
        mantissa >>= 8;
        size += 1;
    }

    let compact = ((size as i128) << 24) | i128::from(mantissa & COMPACT_MANTISSA_MASK);
    wrap_to_u32(compact)
}

/// Compute the bits for the block after a retarget window.
///
/// `next = previous * clamp(actual) / target_timespan`, capped at the
/// proof-of-work limit and quantized through the compact codec.
pub fn retarget(
    previous_bits: u32,
    actual_timespan: i64,
    target_timespan: i64,
    pow_limit_target: &BigUint,
) -> u32 {
    let target_timespan = target_timespan.max(1);
    let min_timespan = target_timespan / MAX_ADJUSTMENT_FACTOR;
    let max_timespan = target_timespan.saturating_mul(MAX_ADJUSTMENT_FACTOR);
    let adjusted_timespan = actual_timespan.clamp(min_timespan, max_timespan);

    let previous_target = decode_target(previous_bits);
    let mut next_target = previous_target * BigUint::from(adjusted_timespan as u64)
        / BigUint::from(target_timespan as u64);

    if &next_target > pow_limit_target {
        next_target = pow_limit_target.clone();
    }

    encode_target(&next_target)
}

/// Bits required for the block that would follow `chain`.
///
/// Outside retarget boundaries the last block's bits carry over unchanged.
pub fn required_bits(chain: &[Block], params: &DifficultyParams) -> u32 {
    let Some(previous) = chain.last() else {
        return params.pow_limit_bits;
    };

    let next_height = chain.len() as u64;
    let interval = params.difficulty_adjustment_interval;
    if interval == 0 || next_height % interval != 0 {
        return previous.bits;
    }

    let first_height = (next_height - interval) as usize;
    let first = &chain[first_height];
    let actual_timespan = previous.time.saturating_sub(first.time).max(1);

    let next_bits = retarget(
        previous.bits,
        actual_timespan,
        params.target_timespan(),
        &decode_target(params.pow_limit_bits),
    );

    debug!(
        "Retarget at height {}: {} -> {} (timespan {}s, expected {}s)",
        next_height,
        format_bits(previous.bits),
        format_bits(next_bits),
        actual_timespan,
        params.target_timespan()
    );

    next_bits
}

/// Render bits as exactly 8 lowercase hex digits
pub fn format_bits(bits: u32) -> String {
    format!("{:08x}", bits)
}

/// Render a target as a zero-padded 64-digit lowercase hex string
pub fn target_hex(target: &BigUint) -> String {
    format!("{:064x}", target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{DIFFICULTY_ADJUSTMENT_INTERVAL, TARGET_SPACING_SECONDS};

    const TARGET_TIMESPAN: i64 = TARGET_SPACING_SECONDS * DIFFICULTY_ADJUSTMENT_INTERVAL as i64;

    fn block_at(height: u64, bits: u32, time: i64) -> Block {
        let mut block = Block::genesis(bits, time);
        block.height = height;
        block
    }

    #[test]
    fn test_compact_roundtrip() {
        for bits in [0x1d00ffff, 0x1b0404cb, 0x1f00ffff, 0x1e0fffff, 0x207fffff] {
            assert_eq!(encode_target(&decode_target(bits)), bits);
        }
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(
            target_hex(&decode_target(0x1d00ffff)),
            "00000000ffff0000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(decode_target(0x1b0404cb), BigUint::from(0x0404cbu32) << 192usize);
        assert_eq!(decode_target(0x03123456), BigUint::from(0x123456u32));
        assert_eq!(decode_target(0x02123456), BigUint::from(0x1234u32));
        assert_eq!(decode_target(0x01123456), BigUint::from(0x12u32));
        assert_eq!(decode_target(0x00123456), BigUint::zero());
    }

    #[test]
    fn test_decode_ignores_sign_bit() {
        assert_eq!(decode_target(0x04923456), BigUint::from(0x123456u32) << 8usize);
        assert_eq!(decode_target(0x1d800000), BigUint::zero());
    }

    #[test]
    fn test_encode_sign_normalization() {
        assert_eq!(encode_target(&BigUint::from(0x80u32)), 0x02008000);
        assert_eq!(encode_target(&BigUint::from(0x12u32)), 0x01120000);
        assert_eq!(encode_target(&BigUint::from(0x1234u32)), 0x02123400);
        assert_eq!(encode_target(&BigUint::from(0x123456u32)), 0x03123456);
        assert_eq!(encode_target(&BigUint::from(0x12345678u32)), 0x04123456);
    }

    #[test]
    fn test_encode_zero() {
        assert_eq!(encode_target(&BigUint::zero()), 0);
    }

    #[test]
    fn test_retarget_clamps_to_4x_faster() {
        let previous_bits = 0x1e0fffff;
        let pow_limit = decode_target(0x1f00ffff);

        let next_bits = retarget(previous_bits, TARGET_TIMESPAN / 20, TARGET_TIMESPAN, &pow_limit);

        let expected = decode_target(encode_target(&(decode_target(previous_bits) / 4u32)));
        assert_eq!(decode_target(next_bits), expected);
    }

    #[test]
    fn test_retarget_clamps_to_4x_slower() {
        let previous_bits = 0x1e0fffff;
        let pow_limit = decode_target(0x1f00ffff);

        let next_bits = retarget(previous_bits, TARGET_TIMESPAN * 20, TARGET_TIMESPAN, &pow_limit);

        let expected = decode_target(encode_target(&(decode_target(previous_bits) * 4u32)));
        assert_eq!(decode_target(next_bits), expected);
    }

    #[test]
    fn test_retarget_never_exceeds_pow_limit() {
        let pow_limit_bits = 0x1f00ffff;
        let pow_limit = decode_target(pow_limit_bits);

        let next_bits = retarget(pow_limit_bits, TARGET_TIMESPAN * 4, TARGET_TIMESPAN, &pow_limit);
        assert_eq!(next_bits, pow_limit_bits);
    }

    #[test]
    fn test_retarget_on_schedule_keeps_target() {
        let pow_limit = decode_target(0x1f00ffff);
        assert_eq!(
            retarget(0x1d00ffff, TARGET_TIMESPAN, TARGET_TIMESPAN, &pow_limit),
            0x1d00ffff
        );
    }

    #[test]
    fn test_required_bits_bootstrap() {
        let params = DifficultyParams::default();
        assert_eq!(required_bits(&[], &params), params.pow_limit_bits);
    }

    #[test]
    fn test_required_bits_between_boundaries() {
        let params = DifficultyParams::new(0x207fffff, 600, 4).unwrap();
        let chain = vec![block_at(0, 0x207fffff, 0), block_at(1, 0x1f00ffff, 60)];
        assert_eq!(required_bits(&chain, &params), 0x1f00ffff);
    }

    #[test]
    fn test_required_bits_retargets_at_boundary() {
        let params = DifficultyParams::new(0x207fffff, 600, 4).unwrap();
        let chain: Vec<Block> = (0..4)
            .map(|h| block_at(h, 0x1f00ffff, h as i64 * 60))
            .collect();

        let expected = retarget(0x1f00ffff, 180, 2400, &decode_target(0x207fffff));
        assert_eq!(required_bits(&chain, &params), expected);
        assert_eq!(
            decode_target(expected),
            decode_target(encode_target(&(decode_target(0x1f00ffff) / 4u32)))
        );
    }

    #[test]
    fn test_required_bits_floors_timespan() {
        let params = DifficultyParams::new(0x207fffff, 600, 2).unwrap();
        // Out-of-order timestamps must not produce a non-positive timespan
        let chain = vec![block_at(0, 0x1f00ffff, 1_000), block_at(1, 0x1f00ffff, 500)];

        let expected = retarget(0x1f00ffff, 1, 1200, &decode_target(0x207fffff));
        assert_eq!(required_bits(&chain, &params), expected);
    }

    #[test]
    fn test_format_bits() {
        assert_eq!(format_bits(0x1f00ffff), "1f00ffff");
        assert_eq!(format_bits(0x0000ffff), "0000ffff");
    }
}
