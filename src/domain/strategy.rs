//! The four strategy variants: indicator family × position policy.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::IndicatorFamily;
use crate::domain::position::PositionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategyVariant {
    pub family: IndicatorFamily,
    pub policy: PositionPolicy,
}

impl StrategyVariant {
    pub const MACD: Self = Self::new(IndicatorFamily::Macd, PositionPolicy::Crossover);
    pub const MACD_ZERO_CROSS: Self = Self::new(IndicatorFamily::Macd, PositionPolicy::ZeroGated);
    pub const VPVMA: Self = Self::new(IndicatorFamily::Vpvma, PositionPolicy::Crossover);
    pub const VPVMA_ZERO_CROSS: Self =
        Self::new(IndicatorFamily::Vpvma, PositionPolicy::ZeroGated);

    /// Every variant, in reporting order. Ties on Sharpe go to the earlier one.
    pub const ALL: [Self; 4] = [
        Self::MACD,
        Self::MACD_ZERO_CROSS,
        Self::VPVMA,
        Self::VPVMA_ZERO_CROSS,
    ];

    pub const fn new(family: IndicatorFamily, policy: PositionPolicy) -> Self {
        StrategyVariant { family, policy }
    }

    pub fn name(&self) -> &'static str {
        match (self.family, self.policy) {
            (IndicatorFamily::Macd, PositionPolicy::Crossover) => "MACD",
            (IndicatorFamily::Macd, PositionPolicy::ZeroGated) => "MACD Zero-Cross",
            (IndicatorFamily::Vpvma, PositionPolicy::Crossover) => "VPVMA",
            (IndicatorFamily::Vpvma, PositionPolicy::ZeroGated) => "VPVMA Zero-Cross",
        }
    }

    /// Lowercase, underscore-separated name used in file names.
    pub fn slug(&self) -> String {
        self.name().to_lowercase().replace([' ', '-'], "_")
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyVariant {
    type Err = String;

    /// Accepts display names and slugs, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|v| v.slug() == wanted)
            .ok_or_else(|| format!("unknown strategy '{}'", s.trim()))
    }
}

/// Parse a comma-separated strategy list. Duplicates are dropped, first
/// occurrence wins.
pub fn parse_variants(list: &str) -> Result<Vec<StrategyVariant>, String> {
    let mut variants = Vec::new();
    for token in list.split(',') {
        if token.trim().is_empty() {
            return Err("empty strategy name in list".to_string());
        }
        let variant: StrategyVariant = token.parse()?;
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    Ok(variants)
}
