//! Linear diffusion layer `pL`
//! ==========================
//! Each row is XORed with two rotated copies of itself:
//!
//! ```text
//! x_r[i] ← x_r[i] + x_r[i - a_r] + x_r[i - b_r]      (indices mod width)
//! ```
//!
//! Column 0 is the most significant bit, so "rotate right by `a`" moves the
//! bit at column `i - a` to column `i`. The layer is length-preserving and
//! invertible; it never changes the degree of a cell.
//! -------------------------------------------------------------------------

use crate::anf::Polynomial;
use crate::error::Result;
use crate::permutation::{Permutation, State, ROWS};

/// Right rotation of a row by `k` columns: `out[i] = row[(i - k) mod w]`.
pub fn rotate_right(row: &[Polynomial], k: usize) -> Vec<Polynomial> {
    let w = row.len();
    if w == 0 {
        return Vec::new();
    }
    let k = k % w;
    (0..w).map(|i| row[(i + w - k) % w].clone()).collect()
}

/// `Σ_r(x) = x + (x ⋙ a) + (x ⋙ b)` on one row.
pub fn sigma(row: &[Polynomial], (a, b): (usize, usize)) -> Vec<Polynomial> {
    let ra = rotate_right(row, a);
    let rb = rotate_right(row, b);
    row.iter()
        .zip(ra.iter().zip(rb.iter()))
        .map(|(x, (xa, xb))| &(x + xa) + xb)
        .collect()
}

impl Permutation {
    pub fn apply_linear_layer(&self, state: &State) -> Result<State> {
        self.check(state)?;
        let rotations = self.rotations();
        let rows: [Vec<Polynomial>; ROWS] = std::array::from_fn(|r| sigma(&state.rows()[r], rotations[r]));
        let out = State::from_array(rows);
        log::debug!(
            "linear layer: {} -> {} monomials",
            state.monomial_count(),
            out.monomial_count()
        );
        Ok(out)
    }
}
