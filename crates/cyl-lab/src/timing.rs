//! Timing profiles for the spin cycle
//!
//! All durations are in seconds, speeds in degrees per second.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Timing profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// No waiting at all (headless simulation, tests)
    Instant,
    /// Scaled or hand-written timing
    Custom,
}

impl std::str::FromStr for TimingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "turbo" => Ok(Self::Turbo),
            "instant" => Ok(Self::Instant),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown timing profile '{}'", other)),
        }
    }
}

/// Inclusive range a value is rolled from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollRange {
    pub min: f64,
    pub max: f64,
}

impl RollRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range holding a single value
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Roll a value in `[min, max]`
    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    fn validate(&self, name: &str) -> ConfigResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid(name, "must be finite"));
        }
        if self.min < 0.0 {
            return Err(invalid(name, "must not be negative"));
        }
        if self.min > self.max {
            return Err(invalid(
                name,
                &format!("min {} exceeds max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidTiming {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Detailed timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    #[serde(default)]
    pub profile: TimingProfile,

    /// Accumulated time before each reel start and each reel stop
    pub delay_between_reels: f64,

    /// Time all reels keep spinning before the first stop
    pub hold: RollRange,

    /// Visual spin duration handed to each reel
    pub reel_spin: RollRange,

    /// Rotation speed when random speed is off
    pub spin_speed: f64,

    /// When set, a new speed is rolled for every accepted spin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_speed: Option<RollRange>,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            delay_between_reels: 0.5,
            hold: RollRange::new(2.0, 4.0),
            reel_spin: RollRange::new(2.0, 5.0),
            spin_speed: 400.0,
            random_speed: Some(RollRange::new(350.0, 500.0)),
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            delay_between_reels: 0.15,
            hold: RollRange::new(0.6, 1.2),
            reel_spin: RollRange::new(0.6, 1.5),
            spin_speed: 900.0,
            random_speed: None,
        }
    }

    /// Zero delays, zero hold
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            delay_between_reels: 0.0,
            hold: RollRange::fixed(0.0),
            reel_spin: RollRange::fixed(0.0),
            spin_speed: 400.0,
            random_speed: None,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            delay_between_reels: self.delay_between_reels * factor,
            hold: self.hold.scaled(factor),
            reel_spin: self.reel_spin.scaled(factor),
            spin_speed: self.spin_speed / factor,
            random_speed: self.random_speed.map(|r| r.scaled(1.0 / factor)),
        }
    }

    /// Roll the speed of a new spin
    pub fn roll_speed(&self, rng: &mut dyn RngCore) -> f64 {
        match &self.random_speed {
            Some(range) => range.sample(rng),
            None => self.spin_speed,
        }
    }

    /// Shortest possible cycle for `reel_count` reels
    pub fn min_cycle_duration(&self, reel_count: usize) -> f64 {
        2.0 * reel_count as f64 * self.delay_between_reels + self.hold.min
    }

    /// Longest possible cycle for `reel_count` reels
    pub fn max_cycle_duration(&self, reel_count: usize) -> f64 {
        2.0 * reel_count as f64 * self.delay_between_reels + self.hold.max
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.delay_between_reels.is_finite() || self.delay_between_reels < 0.0 {
            return Err(invalid("delay_between_reels", "must be a non-negative number"));
        }
        if !self.spin_speed.is_finite() || self.spin_speed < 0.0 {
            return Err(invalid("spin_speed", "must be a non-negative number"));
        }
        self.hold.validate("hold")?;
        self.reel_spin.validate("reel_spin")?;
        if let Some(range) = &self.random_speed {
            range.validate("random_speed")?;
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_profiles() {
        let normal = TimingConfig::normal();
        assert_eq!(normal.delay_between_reels, 0.5);
        assert_eq!(TimingConfig::from_profile(TimingProfile::Turbo).profile, TimingProfile::Turbo);
        assert_eq!(TimingConfig::instant().min_cycle_duration(5), 0.0);
        assert_eq!(normal.min_cycle_duration(5), 7.0);
        assert_eq!(normal.max_cycle_duration(5), 9.0);
        assert_eq!("TURBO".parse::<TimingProfile>(), Ok(TimingProfile::Turbo));
        assert!("slow".parse::<TimingProfile>().is_err());
    }

    #[test]
    fn test_scaled() {
        let half = TimingConfig::normal().scaled(0.5);
        assert_eq!(half.profile, TimingProfile::Custom);
        assert_eq!(half.delay_between_reels, 0.25);
        assert_eq!(half.hold, RollRange::new(1.0, 2.0));
        assert_eq!(half.spin_speed, 800.0);
    }

    #[test]
    fn test_rolls_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let timing = TimingConfig::normal();
        for _ in 0..200 {
            let hold = timing.hold.sample(&mut rng);
            assert!((2.0..=4.0).contains(&hold));
            let speed = timing.roll_speed(&mut rng);
            assert!((350.0..=500.0).contains(&speed));
        }
        assert_eq!(RollRange::fixed(1.5).sample(&mut rng), 1.5);

        let fixed = TimingConfig::turbo();
        assert_eq!(fixed.roll_speed(&mut rng), 900.0);
    }

    #[test]
    fn test_validation() {
        assert!(TimingConfig::normal().validate().is_ok());
        assert!(TimingConfig::instant().validate().is_ok());

        let mut bad = TimingConfig::normal();
        bad.hold = RollRange::new(4.0, 2.0);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidTiming { name, .. }) if name == "hold"
        ));

        let mut bad = TimingConfig::normal();
        bad.delay_between_reels = f64::NAN;
        assert!(bad.validate().is_err());
    }
}
