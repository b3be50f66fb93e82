//! ASCON permutation on a symbolic state
//! ====================================
//! The 320-bit state is five 64-bit rows. Here every bit is a [`Polynomial`]
//! so the layers below propagate algebraic normal forms instead of values.
//!
//! * `pC` : round constant added to row 2
//! * `pS` : 5-bit S-box applied to every column independently
//! * `pL` : row-wise linear diffusion (see [`crate::diffusion`])
//!
//! Column 0 holds the most significant bit of each row. Every layer takes a
//! `&State` and returns a new one; nothing is mutated in place.

use serde::Serialize;

use crate::anf::{Polynomial, Variable};
use crate::error::{AnfError, Result};

// ---------------------------------------------------------------------------
// Constants & parameters
// ---------------------------------------------------------------------------

pub const ROWS: usize = 5;
pub const WIDTH: usize = 64;

/// Upper bound on the rounds of one ASCON permutation call (`p^12`).
pub const MAX_ROUNDS: usize = 12;

/// Rotation pairs of the linear layer, one pair per row:
/// `x_r ← x_r ⊕ (x_r ⋙ a) ⊕ (x_r ⋙ b)`.
pub const ASCON_ROTATIONS: [(usize, usize); ROWS] = [(19, 28), (61, 39), (1, 6), (10, 17), (7, 41)];

/// Permutation parameters: state width and linear-layer rotations.
///
/// `Permutation::ascon()` is the real 64-column instance. Narrower widths
/// model truncated instances whose rotation amounts are taken modulo the
/// width, which keeps hand-checkable examples small.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Permutation {
    width: usize,
    rotations: [(usize, usize); ROWS],
}

impl Default for Permutation {
    fn default() -> Self {
        Permutation::ascon()
    }
}

impl Permutation {
    pub fn ascon() -> Self {
        Permutation {
            width: WIDTH,
            rotations: ASCON_ROTATIONS,
        }
    }

    pub fn new(width: usize, rotations: [(usize, usize); ROWS]) -> Result<Self> {
        if width == 0 {
            return Err(AnfError::InvalidParameters(
                "state width must be positive".to_string(),
            ));
        }
        let rotations = rotations.map(|(a, b)| (a % width, b % width));
        Ok(Permutation { width, rotations })
    }

    /// ASCON rotations reduced modulo `width`.
    pub fn truncated(width: usize) -> Result<Self> {
        Permutation::new(width, ASCON_ROTATIONS)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rotations(&self) -> &[(usize, usize); ROWS] {
        &self.rotations
    }

    pub(crate) fn check(&self, state: &State) -> Result<()> {
        if state.width() != self.width {
            return Err(AnfError::MalformedState(format!(
                "state has {} columns, permutation expects {}",
                state.width(),
                self.width
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Five rows of equal width; `rows[r][c]` is the bit at row `r`, column `c`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct State {
    rows: [Vec<Polynomial>; ROWS],
}

impl State {
    /// All-zero state of the given width.
    pub fn zero(width: usize) -> Self {
        State {
            rows: std::array::from_fn(|_| vec![Polynomial::zero(); width]),
        }
    }

    /// Rejects anything other than five rows of one common, non-zero width.
    pub fn from_rows(rows: Vec<Vec<Polynomial>>) -> Result<Self> {
        if rows.len() != ROWS {
            return Err(AnfError::MalformedState(format!(
                "expected {ROWS} rows, found {}",
                rows.len()
            )));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(AnfError::MalformedState("rows are empty".to_string()));
        }
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(AnfError::MalformedState(format!(
                "row {r} has {} columns, row 0 has {width}",
                row.len()
            )));
        }
        let mut it = rows.into_iter();
        Ok(State {
            rows: std::array::from_fn(|_| it.next().unwrap_or_default()),
        })
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn row(&self, r: usize) -> Result<&[Polynomial]> {
        self.position(r, 0)?;
        Ok(&self.rows[r])
    }

    pub fn rows(&self) -> &[Vec<Polynomial>; ROWS] {
        &self.rows
    }

    fn position(&self, row: usize, column: usize) -> Result<()> {
        if row >= ROWS || column >= self.width() {
            return Err(AnfError::PositionOutOfRange {
                row,
                column,
                rows: ROWS,
                width: self.width(),
            });
        }
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<&Polynomial> {
        self.position(row, column)?;
        Ok(&self.rows[row][column])
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: Polynomial) -> Result<()> {
        self.position(row, column)?;
        self.rows[row][column] = value;
        Ok(())
    }

    /// `(row, column, cell)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Polynomial)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, p)| (r, c, p)))
    }

    pub fn contains_variable(&self, v: Variable) -> bool {
        self.cells().any(|(_, _, p)| p.contains_variable(v))
    }

    /// Total number of monomials over all cells.
    pub fn monomial_count(&self) -> usize {
        self.cells().map(|(_, _, p)| p.len()).sum()
    }

    /// Largest non-flag degree over all cells.
    pub fn degree(&self) -> usize {
        self.cells().map(|(_, _, p)| p.degree()).max().unwrap_or(0)
    }

    pub(crate) fn from_array(rows: [Vec<Polynomial>; ROWS]) -> Self {
        State { rows }
    }
}

// ---------------------------------------------------------------------------
// pS : substitution layer
// ---------------------------------------------------------------------------

/// Bit-sliced ASCON S-box on one column `(x0, .., x4)`.
///
/// Same operation order as the reference bit-sliced code; `t_i` is
/// `(x_i + 1)·x_{i+1}` computed from the pre-χ values.
pub fn sbox_column(x: [Polynomial; ROWS]) -> [Polynomial; ROWS] {
    let [mut x0, mut x1, mut x2, mut x3, mut x4] = x;

    x0 += &x4;
    x4 += &x3;
    x2 += &x1;

    let t0 = x1.mul_plus_one(&x0);
    let t1 = x2.mul_plus_one(&x1);
    let t2 = x3.mul_plus_one(&x2);
    let t3 = x4.mul_plus_one(&x3);
    let t4 = x0.mul_plus_one(&x4);

    x0 += &t1;
    x1 += &t2;
    x2 += &t3;
    x3 += &t4;
    x4 += &t0;

    x1 += &x0;
    x3 += &x2;
    x0 += &x4;
    x2 += &Polynomial::one();

    [x0, x1, x2, x3, x4]
}

impl Permutation {
    /// Applies the S-box to every column. No cross-column interaction.
    pub fn apply_sbox_layer(&self, state: &State) -> Result<State> {
        self.check(state)?;
        let width = state.width();
        let mut rows: [Vec<Polynomial>; ROWS] = std::array::from_fn(|_| Vec::with_capacity(width));
        for c in 0..width {
            let column = std::array::from_fn(|r| state.rows[r][c].clone());
            for (r, bit) in sbox_column(column).into_iter().enumerate() {
                rows[r].push(bit);
            }
        }
        let out = State::from_array(rows);
        log::debug!(
            "sbox layer: {} -> {} monomials, degree {}",
            state.monomial_count(),
            out.monomial_count(),
            out.degree()
        );
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // pC : constant addition
    // -----------------------------------------------------------------------

    /// Round constant of round `round` in a `p^total` call. Bit `k` (weight
    /// `2^k`) lands on column `width - 1 - k` of row 2.
    pub fn round_constant(round: usize, total: usize) -> Result<u8> {
        if total == 0 || total > MAX_ROUNDS || round >= total {
            return Err(AnfError::InvalidParameters(format!(
                "round {round} of p^{total} (at most {MAX_ROUNDS} rounds)"
            )));
        }
        let r = (round + MAX_ROUNDS - total) as u8;
        Ok(r | ((15 - r) << 4))
    }

    pub fn apply_constant_layer(&self, state: &State, round: usize, total: usize) -> Result<State> {
        self.check(state)?;
        let rc = Permutation::round_constant(round, total)?;
        let mut out = state.clone();
        let width = out.width();
        for k in 0..8usize.min(width) {
            if (rc >> k) & 1 == 1 {
                out.rows[2][width - 1 - k] += &Polynomial::one();
            }
        }
        Ok(out)
    }

    /// One round `pL ∘ pS ∘ pC`; either outer layer may be skipped.
    pub fn apply_round(
        &self,
        state: &State,
        round: usize,
        total: usize,
        constants: bool,
        linear: bool,
    ) -> Result<State> {
        let mut st = if constants {
            self.apply_constant_layer(state, round, total)?
        } else {
            state.clone()
        };
        st = self.apply_sbox_layer(&st)?;
        if linear {
            st = self.apply_linear_layer(&st)?;
        }
        Ok(st)
    }

    /// `p^total`, optionally without the final linear layer.
    pub fn apply_rounds(
        &self,
        state: &State,
        total: usize,
        constants: bool,
        last_linear: bool,
    ) -> Result<State> {
        let mut st = state.clone();
        for round in 0..total {
            let linear = round + 1 != total || last_linear;
            st = self.apply_round(&st, round, total, constants, linear)?;
        }
        Ok(st)
    }
}

// -----------------------------------------------------------------------
//  TESTS
// -----------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::anf::{Provenance, Variable};

    /// ASCON S-box table, input bit x0 is the most significant.
    const SBOX: [u8; 32] = [
        0x04, 0x0b, 0x1f, 0x14, 0x1a, 0x15, 0x09, 0x02, 0x1b, 0x05, 0x08, 0x12, 0x1d, 0x03, 0x06,
        0x1c, 0x1e, 0x13, 0x07, 0x0e, 0x00, 0x0d, 0x11, 0x18, 0x10, 0x0c, 0x01, 0x19, 0x16, 0x0a,
        0x0f, 0x17,
    ];

    fn bits(v: u8) -> [Polynomial; ROWS] {
        std::array::from_fn(|i| Polynomial::constant((v >> (4 - i)) & 1 == 1))
    }

    #[test]
    fn sbox_matches_lookup_table_on_constants() {
        for v in 0..32u8 {
            let out = sbox_column(bits(v));
            let expected = bits(SBOX[v as usize]);
            assert_eq!(out, expected, "S-box mismatch on input {v:#04x}");
        }
    }

    #[test]
    fn sbox_is_quadratic_on_variables() {
        let column = std::array::from_fn(|i| Polynomial::from(Variable::input(i as u16)));
        let out = sbox_column(column);
        for bit in &out {
            assert_eq!(bit.degree(), 2);
        }
        // y2 = x4*x3 + x4 + x2 + x1 + 1
        assert_eq!(out[2], "v3*v4 + v4 + v2 + v1 + 1".parse().unwrap());
    }

    #[test]
    fn sbox_layer_rejects_wrong_width() {
        let st = State::zero(63);
        let err = Permutation::ascon().apply_sbox_layer(&st).unwrap_err();
        assert!(matches!(err, AnfError::MalformedState(_)));
    }

    #[test]
    fn from_rows_validates_shape() {
        assert!(State::from_rows(vec![vec![Polynomial::zero(); 64]; 4]).is_err());
        let mut ragged = vec![vec![Polynomial::zero(); 64]; 5];
        ragged[3].pop();
        assert!(matches!(
            State::from_rows(ragged),
            Err(AnfError::MalformedState(_))
        ));
        assert_eq!(State::from_rows(vec![vec![Polynomial::zero(); 64]; 5]).unwrap().width(), 64);
    }

    #[test]
    fn cell_access_is_bounds_checked() {
        let mut st = State::zero(8);
        assert!(st.set_cell(5, 0, Polynomial::one()).is_err());
        assert!(st.cell(0, 8).is_err());
        st.set_cell(4, 7, Polynomial::one()).unwrap();
        assert!(st.cell(4, 7).unwrap().is_one());
    }

    #[test]
    fn row_access_is_bounds_checked() {
        let st = State::zero(64);
        assert_eq!(st.row(4).unwrap().len(), 64);
        assert!(matches!(
            st.row(5),
            Err(AnfError::PositionOutOfRange { row: 5, .. })
        ));
    }

    #[test]
    fn sbox_layer_stays_quadratic_with_flags() {
        // degree-1 cells on every row, v0 tagged before the layer
        let mut st = State::zero(WIDTH);
        for c in 0..WIDTH {
            let v = Polynomial::from(Variable::input(c as u16));
            let k = Polynomial::from(Variable::key(c as u16));
            let a = Polynomial::from(Variable::nonce(c as u16));
            let next = Polynomial::from(Variable::input(((c + 1) % WIDTH) as u16));
            st.set_cell(0, c, v.clone()).unwrap();
            st.set_cell(1, c, k).unwrap();
            st.set_cell(2, c, &v + &a).unwrap();
            st.set_cell(3, c, Variable::error(c as u16).into()).unwrap();
            st.set_cell(4, c, &next + &Polynomial::one()).unwrap();
        }
        let st = crate::provenance::tag_variable(&st, 0, 0, Variable::input(0)).unwrap();
        let out = Permutation::ascon().apply_sbox_layer(&st).unwrap();

        assert!(out.contains_variable(Provenance::Target.variable()));
        assert!(out.contains_variable(Provenance::Other.variable()));
        assert!(out.degree() <= 2);
        assert!(out
            .cells()
            .all(|(_, _, p)| p.terms().all(|m| m.variables().len() - m.degree() <= 2)));
    }

    #[test]
    fn round_constants_match_reference_sequence() {
        // p^12 uses 0xf0, 0xe1, ..., 0x4b
        let expected = [
            0xf0, 0xe1, 0xd2, 0xc3, 0xb4, 0xa5, 0x96, 0x87, 0x78, 0x69, 0x5a, 0x4b,
        ];
        for (i, &c) in expected.iter().enumerate() {
            assert_eq!(Permutation::round_constant(i, 12).unwrap(), c);
        }
        // p^6 starts half way
        assert_eq!(Permutation::round_constant(0, 6).unwrap(), 0x96);
        assert!(Permutation::round_constant(6, 6).is_err());
        assert!(Permutation::round_constant(0, 13).is_err());
    }

    #[test]
    fn constant_layer_flips_low_columns_of_row_two() {
        let st = State::zero(64);
        let out = Permutation::ascon().apply_constant_layer(&st, 0, 12).unwrap();
        // 0xf0: bits 4..7 set -> columns 59..56
        for c in 0..64 {
            let expected = (56..=59).contains(&c);
            assert_eq!(out.cell(2, c).unwrap().is_one(), expected, "column {c}");
        }
        assert_eq!(out.row(0).unwrap(), st.row(0).unwrap());
    }

    #[test]
    fn rounds_are_deterministic() {
        let mut st = State::zero(64);
        for c in 0..64 {
            st.set_cell(1, c, Variable::input(c as u16).into()).unwrap();
        }
        let p = Permutation::ascon();
        let a = p.apply_rounds(&st, 1, true, true).unwrap();
        let b = p.apply_rounds(&st, 1, true, true).unwrap();
        assert_eq!(a, b);
        let skipped = p.apply_rounds(&st, 1, true, false).unwrap();
        let c = p.apply_constant_layer(&st, 0, 1).unwrap();
        assert_eq!(skipped, p.apply_sbox_layer(&c).unwrap());
    }
}
