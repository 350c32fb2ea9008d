//! Guarantee scoring — the deterministic bucket table.
//!
//! This is an informational preview. It is a different computation from the
//! suggested guarantee that an application materializes on first read
//! (a uniform draw from the configured range). The two are not reconciled.

use crate::error::{DeskError, DeskResult};

pub const PRIORITY_SECTOR_GUARANTEE: u8 = 60;

/// priority sector → 60; risk ≥ 80 → 50; risk ≥ 50 → 55; otherwise 60.
pub fn suggest_guarantee_percentage(risk_score: f64, is_priority_sector: bool) -> u8 {
    if is_priority_sector {
        PRIORITY_SECTOR_GUARANTEE
    } else if risk_score >= 80.0 {
        50
    } else if risk_score >= 50.0 {
        55
    } else {
        60
    }
}

/// As above, rejecting scores outside [0, 100].
pub fn score_checked(risk_score: f64, is_priority_sector: bool) -> DeskResult<u8> {
    if !risk_score.is_finite() || !(0.0..=100.0).contains(&risk_score) {
        return Err(DeskError::invalid(format!(
            "riskScore must be between 0 and 100, got {risk_score}"
        )));
    }
    Ok(suggest_guarantee_percentage(risk_score, is_priority_sector))
}
