// ========================= Internal & external frames =========================
//
// internal: name || '/' || payload          (compressed afterwards)
// external: 0 1 2 3 4 5 6 7 || symbols      (what the grid actually holds)

use crate::error::{PaperError, Result};
use crate::symbol::DIGITS_PER_BYTE;

pub const SEPARATOR: u8 = b'/';
pub const CALIBRATION_MARKER: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

pub fn build_internal_frame(name: &str, payload: &[u8]) -> Result<Vec<u8>> {
    if name.is_empty() || name.as_bytes().contains(&SEPARATOR) {
        return Err(PaperError::InvalidFileName(name.to_string()));
    }
    let mut frame = Vec::with_capacity(name.len() + 1 + payload.len());
    frame.extend_from_slice(name.as_bytes());
    frame.push(SEPARATOR);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Splits at the first separator; later separators belong to the payload.
pub fn parse_internal_frame(frame: &[u8]) -> Result<(String, Vec<u8>)> {
    let split = frame
        .iter()
        .position(|&b| b == SEPARATOR)
        .ok_or_else(|| PaperError::FrameTooShort(format!("no name separator in {} bytes", frame.len())))?;
    let name = std::str::from_utf8(&frame[..split])
        .map_err(|_| PaperError::InvalidFileName(String::from_utf8_lossy(&frame[..split]).into_owned()))?;
    Ok((name.to_string(), frame[split + 1..].to_vec()))
}

pub fn build_external_frame(symbols: &[u8]) -> Vec<u8> {
    let mut digits = Vec::with_capacity(CALIBRATION_MARKER.len() + symbols.len());
    digits.extend_from_slice(&CALIBRATION_MARKER);
    digits.extend_from_slice(symbols);
    digits
}

/// Drops the marker slot. The marker's colors are consumed by the
/// classifier, so only the length is checked here.
pub fn strip_external_frame(digits: &[u8]) -> Result<&[u8]> {
    let marker = CALIBRATION_MARKER.len();
    if digits.len() < marker || (digits.len() - marker) % DIGITS_PER_BYTE != 0 {
        return Err(PaperError::FrameTooShort(format!(
            "{} digits cannot hold the {marker}-digit marker plus whole bytes",
            digits.len()
        )));
    }
    Ok(&digits[marker..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_frame_roundtrip() -> anyhow::Result<()> {
        let frame = build_internal_frame("a.txt", b"hi")?;
        assert_eq!(frame, b"a.txt/hi");
        let (name, payload) = parse_internal_frame(&frame)?;
        assert_eq!(name, "a.txt");
        assert_eq!(payload, b"hi");
        Ok(())
    }

    #[test]
    fn payload_separators_are_kept() -> anyhow::Result<()> {
        let frame = build_internal_frame("f", b"/etc/passwd//")?;
        let (name, payload) = parse_internal_frame(&frame)?;
        assert_eq!(name, "f");
        assert_eq!(payload, b"/etc/passwd//");
        Ok(())
    }

    #[test]
    fn name_with_separator_is_refused() {
        assert!(matches!(build_internal_frame("dir/a.txt", b"x"), Err(PaperError::InvalidFileName(_))));
        assert!(matches!(build_internal_frame("", b"x"), Err(PaperError::InvalidFileName(_))));
    }

    #[test]
    fn missing_separator_is_too_short() {
        assert!(matches!(parse_internal_frame(b"no-separator"), Err(PaperError::FrameTooShort(_))));
    }

    #[test]
    fn external_frame_prefixes_marker() -> anyhow::Result<()> {
        let digits = build_external_frame(&[1, 0, 1]);
        assert_eq!(digits, vec![0, 1, 2, 3, 4, 5, 6, 7, 1, 0, 1]);
        assert_eq!(strip_external_frame(&digits)?, &[1, 0, 1]);
        assert!(strip_external_frame(&CALIBRATION_MARKER)?.is_empty());
        Ok(())
    }

    #[test]
    fn external_frame_length_is_checked() {
        assert!(matches!(strip_external_frame(&[0, 1, 2]), Err(PaperError::FrameTooShort(_))));
        assert!(matches!(strip_external_frame(&[0, 1, 2, 3, 4, 5, 6, 7, 1]), Err(PaperError::FrameTooShort(_))));
    }
}
