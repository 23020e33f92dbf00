// ========================= Byte <-> base-8 symbols =========================
//
// Each byte becomes exactly three octal digits, most significant first:
// 0x41 -> [1, 0, 1], 0xFF -> [3, 7, 7]. A digit is one block of one color.

use crate::error::{PaperError, Result};

pub const DIGITS_PER_BYTE: usize = 3;
pub const SYMBOL_COUNT: u8 = 8;

pub fn bytes_to_symbols(data: &[u8]) -> Vec<u8> {
    let mut digits = Vec::with_capacity(data.len() * DIGITS_PER_BYTE);
    for &b in data {
        digits.push(b >> 6);
        digits.push((b >> 3) & 7);
        digits.push(b & 7);
    }
    digits
}

/// Folds one group of three digits back into a byte.
pub fn triplet_to_byte(triplet: &[u8]) -> Result<u8> {
    if triplet.len() != DIGITS_PER_BYTE {
        return Err(PaperError::MalformedSymbolStream(format!("expected 3 digits, got {}", triplet.len())));
    }
    let mut value: u16 = 0;
    for &d in triplet {
        if d >= SYMBOL_COUNT {
            return Err(PaperError::MalformedSymbolStream(format!("digit {d} is not octal")));
        }
        value = value * 8 + d as u16;
    }
    u8::try_from(value)
        .map_err(|_| PaperError::MalformedSymbolStream(format!("triplet {triplet:?} decodes to {value}, above 255")))
}

pub fn symbols_to_bytes(digits: &[u8]) -> Result<Vec<u8>> {
    if digits.len() % DIGITS_PER_BYTE != 0 {
        return Err(PaperError::MalformedSymbolStream(format!(
            "digit count {} is not a multiple of 3",
            digits.len()
        )));
    }
    digits.chunks_exact(DIGITS_PER_BYTE).map(triplet_to_byte).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_survives() -> anyhow::Result<()> {
        for b in 0..=255u8 {
            let digits = bytes_to_symbols(&[b]);
            assert_eq!(digits.len(), 3);
            assert!(digits.iter().all(|&d| d < 8));
            assert_eq!(symbols_to_bytes(&digits)?, vec![b]);
        }
        Ok(())
    }

    #[test]
    fn every_valid_triplet_maps_back() -> anyhow::Result<()> {
        for d0 in 0..8u8 {
            for d1 in 0..8u8 {
                for d2 in 0..8u8 {
                    let value = 64 * d0 as u16 + 8 * d1 as u16 + d2 as u16;
                    let res = triplet_to_byte(&[d0, d1, d2]);
                    if value <= 255 {
                        let b = res?;
                        assert_eq!(b as u16, value);
                        assert_eq!(bytes_to_symbols(&[b]), vec![d0, d1, d2]);
                    } else {
                        assert!(matches!(res, Err(PaperError::MalformedSymbolStream(_))));
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn digits_are_most_significant_first() {
        assert_eq!(bytes_to_symbols(b"A"), vec![1, 0, 1]);
        assert_eq!(bytes_to_symbols(&[0xFF, 0x00]), vec![3, 7, 7, 0, 0, 0]);
    }

    #[test]
    fn ragged_count_is_rejected() {
        let err = symbols_to_bytes(&[1, 0, 1, 7]).unwrap_err();
        assert!(matches!(err, PaperError::MalformedSymbolStream(_)));
    }

    #[test]
    fn non_octal_digit_is_rejected() {
        assert!(matches!(symbols_to_bytes(&[0, 8, 0]), Err(PaperError::MalformedSymbolStream(_))));
    }
}
