//! Position sides and the indicator → position resolver.
//!
//! Both policies are folds over chronologically ordered weeks: a
//! [`TransitionRule`] receives the previously resolved side and the current
//! week's observation and returns the new side. The resolved series is then
//! lagged one week so a decision made on week t is held during week t+1.

use serde::Serialize;

use crate::domain::indicator::{IndicatorFamily, IndicatorSeries};
use crate::domain::ohlcv::WeeklyBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Side {
    Short,
    #[default]
    Flat,
    Long,
}

impl Side {
    /// -1, 0 or +1.
    pub fn signum(self) -> i8 {
        match self {
            Side::Short => -1,
            Side::Flat => 0,
            Side::Long => 1,
        }
    }

    pub fn factor(self) -> f64 {
        self.signum() as f64
    }

    pub fn is_flat(self) -> bool {
        self == Side::Flat
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Short => "Short",
            Side::Flat => "Flat",
            Side::Long => "Long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionPolicy {
    /// Long when line > signal, short when line < signal, flat otherwise.
    Crossover,
    /// Crossover gated by a level test; holds the previous side when no gate passes.
    ZeroGated,
}

/// What the resolver sees for one week.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// `(line, signal)` once the indicator is defined.
    pub pair: Option<(f64, f64)>,
    pub close: f64,
}

pub trait TransitionRule {
    fn next(&self, prev: Side, obs: &Observation) -> Side;
}

/// Stateless crossover: each week is judged on its own line/signal relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossoverRule;

impl TransitionRule for CrossoverRule {
    fn next(&self, _prev: Side, obs: &Observation) -> Side {
        match obs.pair {
            Some((line, signal)) if line > signal => Side::Long,
            Some((line, signal)) if line < signal => Side::Short,
            _ => Side::Flat,
        }
    }
}

/// Crossover that also requires the line to clear a level.
///
/// MACD is gated on the zero line. VPVMA is gated on the week's close; the
/// two families intentionally keep their different gates.
#[derive(Debug, Clone, Copy)]
pub struct ZeroGatedRule {
    pub family: IndicatorFamily,
}

impl ZeroGatedRule {
    fn level(&self, obs: &Observation) -> f64 {
        match self.family {
            IndicatorFamily::Macd => 0.0,
            IndicatorFamily::Vpvma => obs.close,
        }
    }
}

impl TransitionRule for ZeroGatedRule {
    fn next(&self, prev: Side, obs: &Observation) -> Side {
        let Some((line, signal)) = obs.pair else {
            return prev;
        };
        let level = self.level(obs);
        if line > signal && line > level {
            Side::Long
        } else if line < signal && line < level {
            Side::Short
        } else {
            prev
        }
    }
}

pub fn rule_for(policy: PositionPolicy, family: IndicatorFamily) -> Box<dyn TransitionRule + Send + Sync> {
    match policy {
        PositionPolicy::Crossover => Box::new(CrossoverRule),
        PositionPolicy::ZeroGated => Box::new(ZeroGatedRule { family }),
    }
}

/// Fold `rule` over the observations, starting flat.
pub fn resolve_positions<R: TransitionRule + ?Sized>(rule: &R, observations: &[Observation]) -> Vec<Side> {
    observations
        .iter()
        .scan(Side::Flat, |state, obs| {
            *state = rule.next(*state, obs);
            Some(*state)
        })
        .collect()
}

/// Shift forward one week; the first week has no prior decision and is flat.
pub fn lag_positions(positions: &[Side]) -> Vec<Side> {
    if positions.is_empty() {
        return Vec::new();
    }
    std::iter::once(Side::Flat)
        .chain(positions[..positions.len() - 1].iter().copied())
        .collect()
}

pub fn observations(bars: &[WeeklyBar], series: &IndicatorSeries) -> Vec<Observation> {
    bars.iter()
        .zip(&series.values)
        .map(|(bar, point)| Observation {
            pair: point.pair(),
            close: bar.close,
        })
        .collect()
}

/// Resolve and lag in one step: the position held during each week.
pub fn held_positions(
    bars: &[WeeklyBar],
    series: &IndicatorSeries,
    policy: PositionPolicy,
    family: IndicatorFamily,
) -> Vec<Side> {
    let rule = rule_for(policy, family);
    let resolved = resolve_positions(rule.as_ref(), &observations(bars, series));
    lag_positions(&resolved)
}
