//! Mitigability of a quadratic coupling `v_p·v_i`.
//!
//! Every occurrence of the product carries a coefficient polynomial; the
//! coupling disappears under a state condition only if that condition sends
//! every coefficient to zero at once. Checks run in a fixed order:
//!
//! 1. a coefficient equal to `1`         -> [`MitigationClass::UnconditionallyPresent`]
//! 2. two coefficients `p`, `p + 1`       -> [`MitigationClass::ComplementaryPair`]
//! 3. a non-constant GCD of all of them   -> [`MitigationClass::CommonDivisor`]
//! 4. otherwise                           -> [`MitigationClass::Irreducible`]

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::anf::{Polynomial, Variable};
use crate::classifier::CouplingRecord;
use crate::division::gcd_all;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "kebab-case")]
pub enum MitigationClass {
    UnconditionallyPresent,
    /// `p` and `p + 1` both occur; `p` is the smaller of the two.
    ComplementaryPair { p: Polynomial },
    /// Setting `divisor = 0` removes every occurrence.
    CommonDivisor { divisor: Polynomial },
    /// Needs more than one independent condition.
    Irreducible,
}

/// Classifies one coefficient set; `None` for the empty set.
pub fn classify_coefficients(set: &BTreeSet<Polynomial>) -> Option<MitigationClass> {
    if set.is_empty() {
        return None;
    }
    if set.iter().any(Polynomial::is_one) {
        return Some(MitigationClass::UnconditionallyPresent);
    }
    let one = Polynomial::one();
    if let Some(p) = set.iter().find(|p| set.contains(&p.add(&one))) {
        return Some(MitigationClass::ComplementaryPair { p: p.clone() });
    }
    let divisor = gcd_all(set.iter());
    if divisor.is_one() {
        Some(MitigationClass::Irreducible)
    } else {
        Some(MitigationClass::CommonDivisor { divisor })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub classes: BTreeMap<usize, MitigationClass>,
}

impl AnalysisSummary {
    fn select<F: Fn(&MitigationClass) -> bool>(&self, keep: F) -> Vec<usize> {
        self.classes
            .iter()
            .filter(|(_, c)| keep(c))
            .map(|(i, _)| *i)
            .collect()
    }

    pub fn unconditionally_present(&self) -> Vec<usize> {
        self.select(|c| matches!(c, MitigationClass::UnconditionallyPresent))
    }

    pub fn complementary_pairs(&self) -> Vec<usize> {
        self.select(|c| matches!(c, MitigationClass::ComplementaryPair { .. }))
    }

    pub fn common_divisors(&self) -> Vec<usize> {
        self.select(|c| matches!(c, MitigationClass::CommonDivisor { .. }))
    }

    pub fn irreducible(&self) -> Vec<usize> {
        self.select(|c| matches!(c, MitigationClass::Irreducible))
    }

    /// Indices whose common divisor is a multiple of `v`: the condition
    /// `v = 0` alone removes the coupling.
    pub fn divisible_by(&self, v: Variable) -> Vec<usize> {
        let v = Polynomial::from(v);
        self.select(|c| match c {
            MitigationClass::CommonDivisor { divisor } => v.divides(divisor),
            _ => false,
        })
    }

    pub fn divisor(&self, index: usize) -> Option<&Polynomial> {
        match self.classes.get(&index)? {
            MitigationClass::CommonDivisor { divisor } => Some(divisor),
            _ => None,
        }
    }
}

/// Classifies raw coefficient sets keyed by partner index.
pub fn analyze_sets(sets: &BTreeMap<usize, BTreeSet<Polynomial>>) -> AnalysisSummary {
    let classes = sets
        .iter()
        .filter_map(|(i, set)| classify_coefficients(set).map(|c| (*i, c)))
        .collect();
    AnalysisSummary { classes }
}

/// Classifies the flag-free coefficient sets of classifier records.
pub fn analyze(records: &BTreeMap<usize, CouplingRecord>) -> AnalysisSummary {
    let summary = AnalysisSummary {
        classes: records
            .iter()
            .filter_map(|(i, rec)| classify_coefficients(&rec.coefficients).map(|c| (*i, c)))
            .collect(),
    };
    log::debug!(
        "coefficient analysis: {} unconditional, {} complementary, {} common divisor, {} irreducible",
        summary.unconditionally_present().len(),
        summary.complementary_pairs().len(),
        summary.common_divisors().len(),
        summary.irreducible().len()
    );
    summary
}
