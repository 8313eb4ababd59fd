//! Numeric policies for every stage of the pipeline, injected by reference rather than read from
//! globals. `Default` carries the published constants.

use std::error::Error;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Position;
use crate::file::read_json;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(#[from] pub Box<dyn Error>);

impl From<anyhow::Error> for ValidationError {
    fn from(value: anyhow::Error) -> Self {
        ValidationError(value.into())
    }
}

fn check_bounds(name: &str, bounds: &RangeInclusive<f64>) -> Result<(), ValidationError> {
    if !(bounds.start().is_finite() && bounds.end().is_finite()) || bounds.start() > bounds.end() {
        return Err(anyhow!("{name} bounds {bounds:?} are not a valid interval").into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fixture: FixtureConfig,
    pub form: FormConfig,
    pub relative: RelativeConfig,
    pub projection: ProjectionConfig,
    pub dampening: DampeningConfig,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.fixture.validate()?;
        self.form.validate()?;
        self.relative.validate()?;
        self.projection.validate()?;
        self.dampening.validate()
    }

    /// Loads a (possibly partial) JSON override; omitted fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let config: Config = read_json(path)?;
        config.validate().map_err(|err| anyhow!("{err}"))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    pub home_advantage: f64,
    pub multiplier_scale: f64,
    pub multiplier_bounds: RangeInclusive<f64>,
    /// Lower (inclusive) effective Elo difference for buckets 1 through 4; anything below the last
    /// threshold is bucket 5.
    pub bucket_thresholds: [f64; 4],
    /// Deliberately separate from the bucket thresholds even though the default magnitudes agree.
    pub clean_sheet_threshold: f64,
    pub clean_sheet_bonus: f64,
    pub clean_sheet_penalty: f64,
}
impl FixtureConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.multiplier_scale <= 0.0 {
            return Err(anyhow!("multiplier scale must be positive").into());
        }
        check_bounds("fixture multiplier", &self.multiplier_bounds)?;
        if self
            .bucket_thresholds
            .windows(2)
            .any(|pair| pair[0] <= pair[1])
        {
            return Err(anyhow!(
                "bucket thresholds {:?} must be strictly descending",
                self.bucket_thresholds
            )
            .into());
        }
        if self.clean_sheet_threshold < 0.0 {
            return Err(anyhow!("clean sheet threshold cannot be negative").into());
        }
        Ok(())
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            home_advantage: 50.0,
            multiplier_scale: 600.0,
            multiplier_bounds: 0.70..=1.30,
            bucket_thresholds: [150.0, 75.0, -75.0, -150.0],
            clean_sheet_threshold: 75.0,
            clean_sheet_bonus: 0.6,
            clean_sheet_penalty: -0.4,
        }
    }
}

/// Appearance counts of the three rolling windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSizes {
    pub short: usize,
    pub medium: usize,
    pub long: usize,
}
impl Default for WindowSizes {
    fn default() -> Self {
        Self {
            short: 1,
            medium: 3,
            long: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub windows: WindowSizes,
    /// Number of rounds preceding a target round that feed its rolling windows.
    pub horizon_rounds: u32,
    pub full_match_minutes: f64,
    pub ppg_damping_bounds: RangeInclusive<f64>,
    pub ppg_bounds: RangeInclusive<f64>,
    pub low_confidence_appearances: u32,
    pub low_confidence_minutes: f64,
}
impl FormConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let WindowSizes {
            short,
            medium,
            long,
        } = self.windows;
        if short == 0 || short > medium || medium > long {
            return Err(anyhow!("window sizes {:?} must satisfy 0 < short ≤ medium ≤ long", self.windows).into());
        }
        if self.horizon_rounds == 0 {
            return Err(anyhow!("form horizon must span at least one round").into());
        }
        if self.full_match_minutes <= 0.0 {
            return Err(anyhow!("full match minutes must be positive").into());
        }
        check_bounds("ppg damping", &self.ppg_damping_bounds)?;
        check_bounds("ppg", &self.ppg_bounds)
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            windows: WindowSizes::default(),
            horizon_rounds: 5,
            full_match_minutes: 90.0,
            ppg_damping_bounds: 0.4..=1.0,
            ppg_bounds: 0.0..=7.0,
            low_confidence_appearances: 3,
            low_confidence_minutes: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeConfig {
    pub z_epsilon: f64,
}
impl RelativeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.z_epsilon <= 0.0 {
            return Err(anyhow!("z-score epsilon must be positive").into());
        }
        Ok(())
    }
}

impl Default for RelativeConfig {
    fn default() -> Self {
        Self { z_epsilon: 1e-6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpgWeights {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionCaps {
    pub goalkeeper: RangeInclusive<f64>,
    pub defender: RangeInclusive<f64>,
    pub midfielder: RangeInclusive<f64>,
    pub forward: RangeInclusive<f64>,
}
impl PositionCaps {
    pub fn get(&self, position: Position) -> &RangeInclusive<f64> {
        match position {
            Position::Goalkeeper => &self.goalkeeper,
            Position::Defender => &self.defender,
            Position::Midfielder => &self.midfielder,
            Position::Forward => &self.forward,
        }
    }
}

impl Default for PositionCaps {
    fn default() -> Self {
        Self {
            goalkeeper: 1.5..=8.0,
            defender: 1.5..=8.5,
            midfielder: 2.0..=10.5,
            forward: 2.0..=9.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub ppg_weights: PpgWeights,
    pub xg_overperformance_weight: f64,
    pub xa_overperformance_weight: f64,
    pub attack_delta_bounds: RangeInclusive<f64>,
    pub defcon_weight: f64,
    pub defence_delta_bounds: RangeInclusive<f64>,
    pub saves_weight: f64,
    pub goals_conceded_weight: f64,
    pub goalkeeper_delta_bounds: RangeInclusive<f64>,
    pub full_match_minutes: f64,
    pub minutes_factor_bounds: RangeInclusive<f64>,
    pub caps: PositionCaps,
}
impl ProjectionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_match_minutes <= 0.0 {
            return Err(anyhow!("full match minutes must be positive").into());
        }
        check_bounds("attack delta", &self.attack_delta_bounds)?;
        check_bounds("defence delta", &self.defence_delta_bounds)?;
        check_bounds("goalkeeper delta", &self.goalkeeper_delta_bounds)?;
        check_bounds("minutes factor", &self.minutes_factor_bounds)?;
        check_bounds("goalkeeper cap", &self.caps.goalkeeper)?;
        check_bounds("defender cap", &self.caps.defender)?;
        check_bounds("midfielder cap", &self.caps.midfielder)?;
        check_bounds("forward cap", &self.caps.forward)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            ppg_weights: PpgWeights {
                short: 0.15,
                medium: 0.30,
                long: 0.55,
            },
            xg_overperformance_weight: 0.6,
            xa_overperformance_weight: 0.4,
            attack_delta_bounds: -0.6..=0.6,
            defcon_weight: 0.4,
            defence_delta_bounds: 0.0..=0.5,
            saves_weight: 0.5,
            goals_conceded_weight: 0.3,
            goalkeeper_delta_bounds: -0.5..=0.8,
            full_match_minutes: 90.0,
            minutes_factor_bounds: 0.4..=1.0,
            caps: PositionCaps::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DampeningConfig {
    pub full_match_minutes: f64,
    pub minutes_factor_bounds: RangeInclusive<f64>,
    pub low_confidence_factor: f64,
}
impl DampeningConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_match_minutes <= 0.0 {
            return Err(anyhow!("full match minutes must be positive").into());
        }
        check_bounds("dampening minutes factor", &self.minutes_factor_bounds)?;
        const FACTOR_RANGE: RangeInclusive<f64> = 0.0..=1.0;
        if !FACTOR_RANGE.contains(&self.low_confidence_factor) {
            return Err(anyhow!(
                "low confidence factor ({}) outside of allowable range {FACTOR_RANGE:?}",
                self.low_confidence_factor
            )
            .into());
        }
        Ok(())
    }
}

impl Default for DampeningConfig {
    fn default() -> Self {
        Self {
            full_match_minutes: 90.0,
            minutes_factor_bounds: 0.3..=1.0,
            low_confidence_factor: 0.7,
        }
    }
}
