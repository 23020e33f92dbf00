// ========================= Palette & self-calibrating classifier =========================

use image::Rgb;
use log::warn;

use crate::error::{PaperError, Result};
use crate::frame::CALIBRATION_MARKER;

/// Rendered color of each digit, indexed by digit value.
pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 255, 255]), // 0 white
    Rgb([0, 0, 0]),       // 1 black
    Rgb([255, 0, 0]),     // 2 red
    Rgb([0, 255, 0]),     // 3 green
    Rgb([0, 0, 255]),     // 4 blue
    Rgb([255, 255, 0]),   // 5 yellow
    Rgb([255, 0, 255]),   // 6 magenta
    Rgb([0, 255, 255]),   // 7 cyan
];

pub const BACKGROUND: Rgb<u8> = PALETTE[0];
pub const INK: Rgb<u8> = PALETTE[1];

/// Reference colors as they actually came out of the printer and camera,
/// read from the calibration blocks instead of assumed.
#[derive(Debug, Clone)]
pub struct Calibration {
    refs: [Rgb<u8>; 8],
}

impl Calibration {
    /// Takes the first 8 samples verbatim as the colors for digits 0..=7.
    pub fn from_samples(samples: &[Rgb<u8>]) -> Result<Self> {
        let n = CALIBRATION_MARKER.len();
        if samples.len() < n {
            return Err(PaperError::FrameTooShort(format!("{} samples, calibration needs {n}", samples.len())));
        }
        let mut refs = [Rgb([0u8; 3]); 8];
        refs.copy_from_slice(&samples[..n]);
        for i in 0..n {
            for j in (i + 1)..n {
                if refs[i] == refs[j] {
                    warn!("calibration colors {i} and {j} are identical ({:?}); digit {j} can never be read", refs[i].0);
                }
            }
        }
        Ok(Self { refs })
    }

    pub fn references(&self) -> &[Rgb<u8>; 8] { &self.refs }

    /// Nearest reference by Euclidean RGB distance; ties go to the lower digit.
    pub fn classify(&self, px: Rgb<u8>) -> u8 {
        let mut best = 0u8;
        let mut best_d = u32::MAX;
        for (i, r) in self.refs.iter().enumerate() {
            let d = dist2(*r, px);
            if d < best_d { best_d = d; best = i as u8; }
        }
        best
    }
}

fn dist2(a: Rgb<u8>, b: Rgb<u8>) -> u32 {
    a.0.iter().zip(b.0.iter()).map(|(&x, &y)| { let d = x as i32 - y as i32; (d * d) as u32 }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_palette_classifies_itself() -> anyhow::Result<()> {
        let cal = Calibration::from_samples(&PALETTE)?;
        for (i, c) in PALETTE.iter().enumerate() {
            assert_eq!(cal.classify(*c), i as u8);
        }
        Ok(())
    }

    #[test]
    fn tolerates_uniform_drift() -> anyhow::Result<()> {
        // yellowish lighting, underexposed camera
        let drift = |c: Rgb<u8>| Rgb([c[0].saturating_sub(40).saturating_add(20), c[1].saturating_sub(45), c[2].saturating_sub(70).saturating_add(10)]);
        let observed: Vec<Rgb<u8>> = PALETTE.iter().map(|&c| drift(c)).collect();
        let cal = Calibration::from_samples(&observed)?;
        for (i, &c) in PALETTE.iter().enumerate() {
            assert_eq!(cal.classify(drift(c)), i as u8);
            // plus sensor noise well inside half the distance between references
            let noisy = Rgb([drift(c)[0].saturating_add(9), drift(c)[1].saturating_sub(7), drift(c)[2].saturating_add(5)]);
            assert_eq!(cal.classify(noisy), i as u8);
        }
        Ok(())
    }

    #[test]
    fn ties_go_to_lowest_digit() -> anyhow::Result<()> {
        let mut refs = PALETTE;
        refs[3] = Rgb([100, 100, 100]);
        refs[5] = Rgb([100, 100, 100]);
        let cal = Calibration::from_samples(&refs)?;
        assert_eq!(cal.classify(Rgb([101, 100, 99])), 3);
        refs[4] = Rgb([2, 2, 2]);
        let cal = Calibration::from_samples(&refs)?;
        assert_eq!(cal.classify(Rgb([1, 1, 1])), 1);
        Ok(())
    }

    #[test]
    fn needs_eight_samples() {
        assert!(matches!(Calibration::from_samples(&PALETTE[..7]), Err(PaperError::FrameTooShort(_))));
    }
}
