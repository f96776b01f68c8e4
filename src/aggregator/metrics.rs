//! Concentration metrics from participant proportions.
//!
//! Inverse HHI is the effective number of equally sized participants;
//! Shannon entropy (natural log) is the information-theoretic diversity.
//! Both ignore zero shares, and both return 0 for a group with no active
//! participants.

use crate::utils::config::{PROPORTION_SUM_WARN_THRESHOLD, ZERO_PROPORTION_EPSILON};
use log::warn;
use serde::{Deserialize, Serialize};

/// Something odd about a proportion vector that did not stop the calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProportionWarning {
    /// No proportion above zero; both indices are 0
    NoActiveParticipants,
    /// Negative proportions were treated as zero
    NegativeClamped { count: usize },
    /// Proportions sum far above 1, usually a grouping bug upstream
    SumOutOfRange { sum: f64 },
}

/// Both indices for one group, plus what was observed about the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationMetrics {
    pub inverse_hhi: f64,
    pub shannon_entropy: f64,

    /// Proportions that survived the zero filter
    pub active_participants: usize,

    /// Sum of the active proportions (no renormalization is applied)
    pub proportion_sum: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ProportionWarning>,
}

impl ConcentrationMetrics {
    pub fn is_empty(&self) -> bool {
        self.active_participants == 0
    }
}

/// Shares that count: finite and above the zero threshold
fn active_shares(proportions: &[f64]) -> impl Iterator<Item = f64> + '_ {
    proportions
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p > ZERO_PROPORTION_EPSILON)
}

/// Inverse Herfindahl-Hirschman index, `1 / sum(p^2)`
///
/// **Public** - 0 when no proportion is above zero
pub fn inverse_hhi(proportions: &[f64]) -> f64 {
    let hhi: f64 = active_shares(proportions).map(|p| p * p).sum();
    if hhi > 0.0 {
        1.0 / hhi
    } else {
        0.0
    }
}

/// Shannon entropy, `-sum(p * ln p)`
///
/// **Public** - 0 when no proportion is above zero
pub fn shannon_entropy(proportions: &[f64]) -> f64 {
    let entropy: f64 = active_shares(proportions).map(|p| -p * p.ln()).sum();
    // A single share of exactly 1.0 gives -0.0
    entropy.max(0.0)
}

/// Calculate both indices and flag suspicious input
///
/// **Public** - main entry point for metrics calculation
///
/// Negative values are clamped to zero and a sum above
/// `PROPORTION_SUM_WARN_THRESHOLD` is flagged; neither is an error.
pub fn calculate_concentration(proportions: &[f64]) -> ConcentrationMetrics {
    let mut warnings = Vec::new();

    let negatives = proportions.iter().filter(|p| **p < 0.0).count();
    if negatives > 0 {
        warnings.push(ProportionWarning::NegativeClamped { count: negatives });
    }

    let active_participants = active_shares(proportions).count();
    let proportion_sum: f64 = active_shares(proportions).sum();

    if active_participants == 0 {
        warnings.push(ProportionWarning::NoActiveParticipants);
    }

    if proportion_sum > PROPORTION_SUM_WARN_THRESHOLD {
        warn!(
            "Proportions sum to {:.4} (> {}); check upstream grouping",
            proportion_sum, PROPORTION_SUM_WARN_THRESHOLD
        );
        warnings.push(ProportionWarning::SumOutOfRange {
            sum: proportion_sum,
        });
    }

    ConcentrationMetrics {
        inverse_hhi: inverse_hhi(proportions),
        shannon_entropy: shannon_entropy(proportions),
        active_participants,
        proportion_sum,
        warnings,
    }
}
