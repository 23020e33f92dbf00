// ========================= Out-of-band page geometry =========================
//
// Nothing about the grid is stored in the image itself: the encoder and the
// decoder must be run with matching values. Both halves can be kept together
// in one JSON file and passed to either side.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PaperError, Result};
use crate::layout::GridPlan;

/// Canvas the encoder draws on. Defaults are A4 at 300 dpi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub block_size: u32,
    /// Written into the PNG so it prints at the intended size
    pub dpi: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { width: 2480, height: 3508, margin: 59, block_size: 20, dpi: 300 }
    }
}

/// How the decoder reads a rectified photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Block columns the photo is divided into
    pub w_blocks: u32,
    /// Block rows the photo is divided into
    pub h_blocks: u32,
    /// Gaussian blur sigma applied before sampling; 0 disables
    pub blur_sigma: f32,
    /// Color saturation gain applied before sampling; 1 leaves colors alone
    pub color_gain: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { w_blocks: 118, h_blocks: 169, blur_sigma: 1.0, color_gain: 2.0 }
    }
}

impl SamplingConfig {
    /// Density matching everything `grid` can hold, without preprocessing.
    pub fn for_grid(grid: &GridConfig) -> Result<Self> {
        let plan = GridPlan::new(grid)?;
        Ok(Self { w_blocks: plan.w_cap, h_blocks: plan.h_cap, blur_sigma: 0.0, color_gain: 1.0 })
    }

    pub fn validate(&self) -> Result<()> {
        if self.w_blocks == 0 || self.h_blocks == 0 {
            return Err(PaperError::InvalidGeometry(format!("sampling density {}x{} is empty", self.w_blocks, self.h_blocks)));
        }
        if !(self.blur_sigma >= 0.0 && self.blur_sigma.is_finite()) {
            return Err(PaperError::Config(format!("blur sigma must be a finite value >= 0, got {}", self.blur_sigma)));
        }
        if !(self.color_gain >= 0.0 && self.color_gain.is_finite()) {
            return Err(PaperError::Config(format!("color gain must be a finite value >= 0, got {}", self.color_gain)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub grid: GridConfig,
    pub sampling: SamplingConfig,
}

impl PaperConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| PaperError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_agree_with_each_other() -> anyhow::Result<()> {
        let derived = SamplingConfig::for_grid(&GridConfig::default())?;
        let defaults = SamplingConfig::default();
        assert_eq!((derived.w_blocks, derived.h_blocks), (defaults.w_blocks, defaults.h_blocks));
        Ok(())
    }

    #[test]
    fn partial_json_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("page.json");
        fs::write(&path, r#"{ "grid": { "block_size": 4, "margin": 10 }, "sampling": { "blur_sigma": 0.0 } }"#)?;
        let cfg = PaperConfig::load(&path)?;
        assert_eq!(cfg.grid.block_size, 4);
        assert_eq!(cfg.grid.margin, 10);
        assert_eq!(cfg.grid.width, 2480);
        assert_eq!(cfg.sampling.blur_sigma, 0.0);
        assert_eq!(cfg.sampling.w_blocks, 118);
        Ok(())
    }

    #[test]
    fn broken_json_is_a_config_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("page.json");
        fs::write(&path, "{ grid: ")?;
        assert!(matches!(PaperConfig::load(&path), Err(PaperError::Config(_))));
        Ok(())
    }

    #[test]
    fn sampling_validation() {
        assert!(SamplingConfig::default().validate().is_ok());
        let empty = SamplingConfig { w_blocks: 0, ..SamplingConfig::default() };
        assert!(matches!(empty.validate(), Err(PaperError::InvalidGeometry(_))));
        let negative = SamplingConfig { blur_sigma: -1.0, ..SamplingConfig::default() };
        assert!(matches!(negative.validate(), Err(PaperError::Config(_))));
    }
}
