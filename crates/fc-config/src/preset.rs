//! Named strategy presets.

use crate::strategy::StrategyConfig;

/// Common exploration profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Balanced defaults: 1000 samples, bias on, shrinking on.
    Default,
    /// Quick smoke profile: 100 samples, no shrinking rounds beyond one.
    Quick,
    /// Thorough profile: confidence stopping at 0.99 with a large cap and
    /// detailed statistics.
    Thorough,
}

impl Preset {
    /// Materialize the preset as a config.
    pub fn config(self) -> StrategyConfig {
        match self {
            Preset::Default => StrategyConfig::default(),
            Preset::Quick => {
                let mut c = StrategyConfig::default().with_sample_size(100);
                c.shrink_rounds = 1;
                c.shrink_attempts = 200;
                c
            }
            Preset::Thorough => StrategyConfig::default()
                .with_confidence(0.99)
                .with_max_iterations(1_000_000)
                .with_detailed_statistics(),
        }
    }

    /// Parse a preset name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Preset::Default),
            "quick" => Some(Preset::Quick),
            "thorough" => Some(Preset::Thorough),
            _ => None,
        }
    }
}
