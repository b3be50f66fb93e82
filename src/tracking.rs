//! End-to-end tracking runs.
//!
//! One run: build the initial state, optionally push it through a first
//! S-box layer, tag the primary variable, apply `pL` then `pS`, classify the
//! quadratic terms and grade their coefficients. Runs share nothing, so a
//! batch of them can go wide with Rayon (feature `parallel`).

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::{analyze, AnalysisSummary};
use crate::anf::{Family, Variable};
use crate::classifier::{classify, Classification, CouplingRecord};
use crate::error::{AnfError, Result};
use crate::permutation::{Permutation, State, ROWS};
use crate::provenance::tag_variable;
use crate::setting::{countermeasure, nonce_misuse, CubeChoice, StateConfig};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracking {
    pub state: StateConfig,
    /// Apply one S-box layer before tagging (initialization-style inputs).
    pub first_sbox: bool,
    /// Index of the primary variable in the public family.
    pub primary: usize,
    /// Row whose copy of the primary variable is the target; `None` skips
    /// tagging altogether.
    pub target_row: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackingReport {
    pub primary: usize,
    pub target_row: Option<usize>,
    pub never_coupled: BTreeSet<usize>,
    pub coupled_only_from_target_row: BTreeSet<usize>,
    pub coupled: BTreeSet<usize>,
    pub via_target: BTreeSet<usize>,
    pub via_other: BTreeSet<usize>,
    pub records: BTreeMap<usize, CouplingRecord>,
    pub analysis: AnalysisSummary,
}

impl TrackingReport {
    fn new(cls: Classification, target_row: Option<usize>) -> Self {
        let analysis = analyze(&cls.records);
        TrackingReport {
            primary: cls.primary.index().unwrap_or_default(),
            target_row,
            never_coupled: cls.never_coupled(),
            coupled_only_from_target_row: cls.coupled_only_from_target_row(),
            coupled: cls.coupled,
            via_target: cls.via_target,
            via_other: cls.via_other,
            records: cls.records,
            analysis,
        }
    }

    /// Cube members that fall in each of the two useful sets:
    /// `(only from target row, never coupled)`.
    pub fn conditional_cube_candidates(&self, cube: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let cube: BTreeSet<usize> = cube.iter().copied().collect();
        (
            self.coupled_only_from_target_row
                .intersection(&cube)
                .copied()
                .collect(),
            self.never_coupled.intersection(&cube).copied().collect(),
        )
    }
}

impl Tracking {
    pub fn new(state: StateConfig, primary: usize, target_row: Option<usize>) -> Self {
        Tracking {
            state,
            first_sbox: false,
            primary,
            target_row,
        }
    }

    pub fn with_first_sbox(mut self) -> Self {
        self.first_sbox = true;
        self
    }

    pub fn primary_variable(&self) -> Result<Variable> {
        Variable::named(Family::Input, self.primary)
    }

    /// State right before the classified `pL ∘ pS` step, tags included.
    pub fn prepare(&self, perm: &Permutation) -> Result<State> {
        let mut st = self.state.build()?;
        if self.first_sbox {
            st = perm.apply_sbox_layer(&st)?;
        }
        if let Some(row) = self.target_row {
            st = tag_variable(&st, row, self.primary, self.primary_variable()?)?;
        }
        Ok(st)
    }

    pub fn run(&self, perm: &Permutation) -> Result<TrackingReport> {
        let st = self.prepare(perm)?;
        let st = perm.apply_linear_layer(&st)?;
        let st = perm.apply_sbox_layer(&st)?;
        let cls = classify(&st, self.primary_variable()?)?;
        log::info!(
            "v{} (target row {:?}): {} never coupled, {} only from target row",
            self.primary,
            self.target_row,
            cls.never_coupled().len(),
            cls.coupled_only_from_target_row().len()
        );
        Ok(TrackingReport::new(cls, self.target_row))
    }
}

impl CubeChoice {
    /// Tracking run of this cube in the initialization setting.
    pub fn tracking(&self, iv: u64) -> Result<Tracking> {
        Ok(Tracking::new(self.state(iv)?, self.primary(), Some(self.target_row)).with_first_sbox())
    }

    /// `(only from target row, never coupled)` restricted to the shifted cube.
    pub fn candidates(&self, perm: &Permutation, iv: u64) -> Result<(Vec<usize>, Vec<usize>)> {
        let report = self.tracking(iv)?.run(perm)?;
        Ok(report.conditional_cube_candidates(&self.shifted().cube))
    }
}

/// Runs independent trackings, in parallel when the `parallel` feature is on.
pub fn run_batch(perm: &Permutation, runs: &[Tracking]) -> Vec<Result<TrackingReport>> {
    #[cfg(feature = "parallel")]
    {
        runs.par_iter().map(|t| t.run(perm)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        runs.iter().map(|t| t.run(perm)).collect()
    }
}

fn complement(universe: usize, primary: usize, taken: &[&BTreeSet<usize>]) -> BTreeSet<usize> {
    (0..universe)
        .filter(|i| *i != primary && taken.iter().all(|s| !s.contains(i)))
        .collect()
}

/// The five index sets used to build nonce-misuse conditional cubes:
///
/// * `S0`: coupled only through the row-0 copy
/// * `S1`: coupled only through the row-4 copy
/// * `S2`: coupled only through the row-3 copy
/// * `S3`: never coupled
/// * `S4`: everything else
pub fn nonce_misuse_sets(perm: &Permutation, primary: usize) -> Result<[BTreeSet<usize>; 5]> {
    let cfg = nonce_misuse(perm.width())?;
    let runs: Vec<Tracking> = [0, 3, 4]
        .into_iter()
        .map(|row| Tracking::new(cfg.clone(), primary, Some(row)))
        .collect();
    let reports = run_batch(perm, &runs)
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    let [row0, row3, row4]: [TrackingReport; 3] = reports
        .try_into()
        .map_err(|_| AnfError::InvalidParameters("expected three tracking runs".into()))?;

    let s0 = row0.coupled_only_from_target_row;
    let s2 = row3.coupled_only_from_target_row;
    let s1 = row4.coupled_only_from_target_row;
    let s3 = row4.never_coupled;
    let s4 = complement(perm.width(), primary, &[&s0, &s1, &s2, &s3]);
    Ok([s0, s1, s2, s3, s4])
}

/// Countermeasure settings: for public variables on `public_row`, the sets
/// coupled only through each row's copy (index = row), then the never
/// coupled set at index 5.
pub fn countermeasure_sets(
    perm: &Permutation,
    public_row: usize,
    primary: usize,
) -> Result<Vec<BTreeSet<usize>>> {
    let cfg = countermeasure(perm.width(), public_row)?;
    let runs: Vec<Tracking> = (0..ROWS)
        .map(|row| Tracking::new(cfg.clone(), primary, Some(row)).with_first_sbox())
        .collect();
    let reports = run_batch(perm, &runs)
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    let mut sets: Vec<BTreeSet<usize>> = reports
        .iter()
        .map(|r| r.coupled_only_from_target_row.clone())
        .collect();
    if let Some(last) = reports.last() {
        sets.push(last.never_coupled.clone());
    }
    Ok(sets)
}
