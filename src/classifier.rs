//! Quadratic coupling of a primary variable, split by provenance.
//!
//! A cell term qualifies when it contains the primary variable and exactly
//! two variables of the primary's family. Flags and variables of other
//! families do not count toward that degree: flags only decide the
//! provenance, the rest forms the coefficient of `v_p·v_i`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::anf::{Monomial, Polynomial, Provenance, Variable};
use crate::error::{AnfError, Result};
use crate::permutation::State;

/// Everything observed about `v_p·v_i` for one partner index `i`.
///
/// Each set holds one polynomial per cell in which the product occurs: the
/// sum of the coefficients of the qualifying terms of that cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CouplingRecord {
    pub index: usize,
    /// Coefficients with provenance flags removed.
    pub coefficients: BTreeSet<Polynomial>,
    /// Coefficients of terms built from the target-row copy.
    pub target: BTreeSet<Polynomial>,
    /// Coefficients of terms built from any other copy.
    pub other: BTreeSet<Polynomial>,
    /// Coefficients of terms carrying no flag at all.
    pub untagged: BTreeSet<Polynomial>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub primary: Variable,
    /// Indices `0..universe` the partition is taken over.
    pub universe: usize,
    /// `s_tot`: every partner index seen in a qualifying term.
    pub coupled: BTreeSet<usize>,
    /// `s_target`: partners of a target-flagged term.
    pub via_target: BTreeSet<usize>,
    /// `s_other`: partners of a term that is not target-flagged.
    pub via_other: BTreeSet<usize>,
    pub records: BTreeMap<usize, CouplingRecord>,
}

impl Classification {
    /// Indices never multiplied by the primary variable.
    pub fn never_coupled(&self) -> BTreeSet<usize> {
        let primary = self.primary.index();
        (0..self.universe)
            .filter(|i| Some(*i) != primary && !self.coupled.contains(i))
            .collect()
    }

    /// Indices multiplied only through the target-row copy.
    pub fn coupled_only_from_target_row(&self) -> BTreeSet<usize> {
        self.via_target.difference(&self.via_other).copied().collect()
    }

    /// Indices reached through the target copy and another copy.
    pub fn coupled_from_both(&self) -> BTreeSet<usize> {
        self.via_target.intersection(&self.via_other).copied().collect()
    }

    /// `s_tot \ s_target`.
    pub fn coupled_only_from_other_rows(&self) -> BTreeSet<usize> {
        self.coupled.difference(&self.via_target).copied().collect()
    }
}

#[derive(Default)]
struct CellCoefficients {
    stripped: Polynomial,
    target: Polynomial,
    other: Polynomial,
    untagged: Polynomial,
}

/// Scans `state` for degree-2 terms `v_p·v_i·(coefficient)`.
pub fn classify(state: &State, primary: Variable) -> Result<Classification> {
    let Some(family) = primary.family() else {
        return Err(AnfError::InvalidParameters(format!(
            "primary variable must be named, got flag {primary}"
        )));
    };

    let mut out = Classification {
        primary,
        universe: state.width(),
        coupled: BTreeSet::new(),
        via_target: BTreeSet::new(),
        via_other: BTreeSet::new(),
        records: BTreeMap::new(),
    };

    for (r, c, cell) in state.cells() {
        let quadratic = cell
            .involving(primary)
            .filter_family_degree(family, 2);
        if quadratic.is_zero() {
            continue;
        }
        log::trace!("cell ({r}, {c}): {} qualifying terms", quadratic.len());

        let mut per_index: BTreeMap<usize, CellCoefficients> = BTreeMap::new();
        for m in quadratic.terms() {
            let Some(index) = partner_index(m, primary) else {
                continue;
            };
            let provenance = m.provenance();
            let coefficient = Polynomial::from(m.without(|v| v.is_flag() || v.family() == Some(family)));

            out.coupled.insert(index);
            match provenance {
                Some(Provenance::Target) => out.via_target.insert(index),
                _ => out.via_other.insert(index),
            };

            let entry = per_index.entry(index).or_default();
            entry.stripped += &coefficient;
            match provenance {
                Some(Provenance::Target) => entry.target += &coefficient,
                Some(Provenance::Other) => entry.other += &coefficient,
                None => entry.untagged += &coefficient,
            }
        }

        for (index, coeffs) in per_index {
            let record = out.records.entry(index).or_insert_with(|| CouplingRecord {
                index,
                ..CouplingRecord::default()
            });
            for (set, poly) in [
                (&mut record.coefficients, coeffs.stripped),
                (&mut record.target, coeffs.target),
                (&mut record.other, coeffs.other),
                (&mut record.untagged, coeffs.untagged),
            ] {
                if !poly.is_zero() {
                    set.insert(poly);
                }
            }
        }
    }

    log::debug!(
        "classified {primary}: {} coupled, {} via target, {} via other",
        out.coupled.len(),
        out.via_target.len(),
        out.via_other.len()
    );
    Ok(out)
}

/// Index of the second same-family factor of a qualifying term.
fn partner_index(m: &Monomial, primary: Variable) -> Option<usize> {
    let family = primary.family()?;
    m.variables()
        .iter()
        .find(|v| **v != primary && v.family() == Some(family))
        .and_then(|v| v.index())
}
