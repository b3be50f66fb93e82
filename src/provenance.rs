//! Provenance tagging of a variable before it is mixed with anything else.
//!
//! The occurrence of `v` at the chosen (row, column) becomes `v·T`, every
//! other occurrence becomes `v·O`. Because the flag is an ordinary factor it
//! survives every later product, so a monomial of the final state tells
//! which copy of `v` it was built from.

use std::collections::HashMap;

use crate::anf::{Polynomial, Provenance, Variable};
use crate::error::{AnfError, Result};
use crate::permutation::State;

fn tagged(var: Variable, flag: Provenance) -> HashMap<Variable, Polynomial> {
    let image = &Polynomial::from(var) * &Polynomial::from(flag.variable());
    HashMap::from([(var, image)])
}

/// Tags `var` at `(row, column)` as [`Provenance::Target`] and everywhere
/// else as [`Provenance::Other`].
///
/// Must run before any layer that multiplies the tagged cell; fails when
/// `var` is a flag or never occurs in `state`.
pub fn tag_variable(state: &State, row: usize, column: usize, var: Variable) -> Result<State> {
    state.cell(row, column)?;
    if var.is_flag() {
        return Err(AnfError::InvalidParameters(format!(
            "cannot tag the provenance flag {var}"
        )));
    }
    if !state.contains_variable(var) {
        return Err(AnfError::UndefinedVariable(var));
    }

    let target = tagged(var, Provenance::Target);
    let other = tagged(var, Provenance::Other);
    let mut out = state.clone();
    let mut touched = 0usize;
    for (r, c, cell) in state.cells() {
        if !cell.contains_variable(var) {
            continue;
        }
        let map = if (r, c) == (row, column) { &target } else { &other };
        out.set_cell(r, c, cell.substitute(map))?;
        touched += 1;
    }
    log::debug!("tagged {var} at ({row}, {column}); {touched} cells carry a flag");
    Ok(out)
}
