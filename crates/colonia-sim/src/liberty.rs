//! Sons of Liberty membership derived from a colony's liberty stock.
//!
//! ```text
//! sol    = min(100, liberty * 100 / (liberty_per_rebel * unit_count))   (0 without units)
//! tory   = 100 - sol
//! rebels = floor(unit_count * sol / 100)
//! ```
//!
//! Reaching membership `s` needs `liberty_per_rebel * s * unit_count / 100`
//! liberty. The figures are never stored independently of the stock: they
//! are recomputed every time, and [`Liberty::verify`] rejects any set that
//! does not add up.

use serde::{Deserialize, Serialize};

use colonia_rules::ruleset::Options;
use colonia_types::ColonyId;

use crate::error::SimError;

/// Liberty figures of a colony.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liberty {
    /// Liberty stock the figures were derived from.
    pub liberty: u32,
    /// Colonists working in the colony.
    pub unit_count: u32,
    /// Sons of Liberty membership in percent.
    pub sol: u32,
    /// Tory membership in percent.
    pub tory: u32,
    /// Number of rebel colonists.
    pub rebels: u32,
}

impl Liberty {
    /// Derive the figures from a liberty stock.
    pub fn compute(liberty: u32, unit_count: u32, liberty_per_rebel: u32) -> Self {
        let divisor = u64::from(liberty_per_rebel).saturating_mul(u64::from(unit_count));
        let sol = u64::from(liberty)
            .saturating_mul(100)
            .checked_div(divisor)
            .map_or(0, |sol| sol.min(100));
        let sol = u32::try_from(sol).unwrap_or(100);
        Self {
            liberty,
            unit_count,
            sol,
            tory: 100_u32.saturating_sub(sol),
            rebels: rebels(unit_count, sol),
        }
    }

    /// Liberty needed to reach `sol` percent with `unit_count` colonists.
    pub fn required(sol: u32, unit_count: u32, liberty_per_rebel: u32) -> u32 {
        let needed = u64::from(liberty_per_rebel)
            .saturating_mul(u64::from(sol.min(100)))
            .saturating_mul(u64::from(unit_count))
            .checked_div(100)
            .unwrap_or(0);
        u32::try_from(needed).unwrap_or(u32::MAX)
    }

    /// Number of tory colonists.
    pub const fn tories(&self) -> u32 {
        self.unit_count.saturating_sub(self.rebels)
    }

    /// Production bonus from the colony's government.
    ///
    /// Full membership gives +2, half membership +1. Below that, too many
    /// tories give -1 past the bad government limit and -2 past the very bad
    /// one.
    pub const fn government_bonus(&self, options: &Options) -> i32 {
        if self.sol >= 100 {
            2
        } else if self.sol >= 50 {
            1
        } else if self.tories() > options.very_bad_government_limit {
            -2
        } else if self.tories() > options.bad_government_limit {
            -1
        } else {
            0
        }
    }

    /// Check that the figures add up.
    pub fn verify(&self, colony: ColonyId) -> Result<(), SimError> {
        let fail = |reason: String| SimError::LibertyInconsistency { colony, reason };
        if self.sol > 100 {
            return Err(fail(format!("membership {} above 100", self.sol)));
        }
        if self.sol.saturating_add(self.tory) != 100 {
            return Err(fail(format!("sol {} + tory {} != 100", self.sol, self.tory)));
        }
        if self.rebels != rebels(self.unit_count, self.sol) {
            return Err(fail(format!(
                "{} rebels among {} colonists at {}%",
                self.rebels, self.unit_count, self.sol
            )));
        }
        Ok(())
    }
}

fn rebels(unit_count: u32, sol: u32) -> u32 {
    let rebels = u64::from(unit_count)
        .saturating_mul(u64::from(sol))
        .checked_div(100)
        .unwrap_or(0);
    u32::try_from(rebels).unwrap_or(unit_count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    const PER_REBEL: u32 = 200;

    #[test]
    fn no_colonists_means_no_membership() {
        let liberty = Liberty::compute(5000, 0, PER_REBEL);
        assert_eq!(liberty.sol, 0);
        assert_eq!(liberty.tory, 100);
        assert_eq!(liberty.rebels, 0);
    }

    #[test]
    fn membership_caps_at_100() {
        let liberty = Liberty::compute(1_000_000, 3, PER_REBEL);
        assert_eq!(liberty.sol, 100);
        assert_eq!(liberty.rebels, 3);
        assert_eq!(liberty.tories(), 0);
    }

    #[test]
    fn seven_colonists_step_by_step() {
        for sol in 0..100 {
            let next = Liberty::required(sol + 1, 7, PER_REBEL);
            assert_eq!(Liberty::compute(next, 7, PER_REBEL).sol, sol + 1);
            assert_eq!(Liberty::compute(next - 1, 7, PER_REBEL).sol, sol);
        }
    }

    #[test]
    fn rebels_round_down() {
        // 7 colonists at 50% -> 3.5 rebels -> 3.
        let liberty = Liberty::compute(Liberty::required(50, 7, PER_REBEL), 7, PER_REBEL);
        assert_eq!(liberty.sol, 50);
        assert_eq!(liberty.rebels, 3);
        liberty.verify(ColonyId::new(0)).unwrap();
    }

    #[test]
    fn tampered_figures_fail_verification() {
        let mut liberty = Liberty::compute(700, 7, PER_REBEL);
        liberty.rebels += 1;
        assert!(matches!(
            liberty.verify(ColonyId::new(2)),
            Err(SimError::LibertyInconsistency { .. })
        ));
    }

    #[test]
    fn government_bonus_bands() {
        let options = Options::default();
        assert_eq!(Liberty::compute(1400, 7, PER_REBEL).government_bonus(&options), 2);
        assert_eq!(Liberty::compute(700, 7, PER_REBEL).government_bonus(&options), 1);
        assert_eq!(Liberty::compute(0, 7, PER_REBEL).government_bonus(&options), -1);
        assert_eq!(Liberty::compute(0, 11, PER_REBEL).government_bonus(&options), -2);
        assert_eq!(Liberty::compute(0, 6, PER_REBEL).government_bonus(&options), 0);
    }
}
