//! Construction of initial states
//! ==============================
//! A [`StateConfig`] says, cell by cell, what enters the permutation: nothing,
//! a constant bit, a single variable or a whole expression. The experiment
//! settings studied for ASCON are provided as plain constructor functions so
//! a driver can pick one, tweak it, and pass it around by value.

use serde::{Deserialize, Serialize};

use crate::anf::{Family, Polynomial, Variable};
use crate::error::{AnfError, Result};
use crate::permutation::{State, ROWS, WIDTH};

/// ASCON-128 initialization vector, column 0 = most significant bit.
pub const ASCON_128_IV: u64 = 0x8040_0c06_0000_0000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSpec {
    #[default]
    Absent,
    Constant(bool),
    Variable(Variable),
    Expr(Polynomial),
}

impl CellSpec {
    fn check(&self) -> Result<()> {
        let vars = match self {
            CellSpec::Absent | CellSpec::Constant(_) => return Ok(()),
            CellSpec::Variable(v) => vec![*v],
            CellSpec::Expr(p) => p.variables().into_iter().collect(),
        };
        for v in vars {
            if let (Some(family), Some(index)) = (v.family(), v.index()) {
                Variable::named(family, index)?;
            }
        }
        Ok(())
    }

    pub fn to_polynomial(&self) -> Polynomial {
        match self {
            CellSpec::Absent => Polynomial::zero(),
            CellSpec::Constant(bit) => Polynomial::constant(*bit),
            CellSpec::Variable(v) => Polynomial::from(*v),
            CellSpec::Expr(p) => p.clone(),
        }
    }
}

/// Five rows of cell descriptions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    pub rows: Vec<Vec<CellSpec>>,
}

impl StateConfig {
    /// Every cell absent.
    pub fn absent(width: usize) -> Self {
        StateConfig {
            rows: vec![vec![CellSpec::Absent; width]; ROWS],
        }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn set(&mut self, row: usize, column: usize, spec: CellSpec) -> Result<()> {
        let width = self.width();
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(AnfError::PositionOutOfRange {
                row,
                column,
                rows: ROWS,
                width,
            })?;
        *cell = spec;
        Ok(())
    }

    /// Fills a whole row from a per-column function.
    pub fn with_row<F: Fn(usize) -> CellSpec>(mut self, row: usize, f: F) -> Result<Self> {
        for column in 0..self.width() {
            self.set(row, column, f(column))?;
        }
        Ok(self)
    }

    /// Builds the symbolic state, validating shape and variable indices.
    pub fn build(&self) -> Result<State> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut cells = Vec::with_capacity(row.len());
            for spec in row {
                spec.check()?;
                cells.push(spec.to_polynomial());
            }
            rows.push(cells);
        }
        State::from_rows(rows)
    }
}

fn var(family: Family, index: usize) -> Polynomial {
    Polynomial::from(Variable::Named {
        family,
        index: index as u16,
    })
}

// ---------------------------------------------------------------------------
// Experiment settings
// ---------------------------------------------------------------------------

/// Nonce-misuse setting, state *after* the first S-box layer, keeping the
/// degree-1 terms in the public variables:
///
/// ```text
/// x0 = v_i·(a_i + 1)   x1 = v_i   x2 = 0   x3 = v_i·e_i   x4 = v_i·a_i
/// ```
pub fn nonce_misuse(width: usize) -> Result<StateConfig> {
    let one = Polynomial::one();
    StateConfig::absent(width)
        .with_row(0, |i| CellSpec::Expr(&var(Family::Input, i) * &(&var(Family::Nonce, i) + &one)))?
        .with_row(1, |i| CellSpec::Variable(Variable::input(i as u16)))?
        .with_row(3, |i| CellSpec::Expr(&var(Family::Input, i) * &var(Family::Error, i)))?
        .with_row(4, |i| CellSpec::Expr(&var(Family::Input, i) * &var(Family::Nonce, i)))
}

/// Nonce-misuse setting under the condition `a_p = 0` on the primary column:
/// `x0[p] = v_p`, `x4[p] = 0`.
pub fn nonce_misuse_with_condition(width: usize, primary: usize) -> Result<StateConfig> {
    let mut cfg = nonce_misuse(width)?;
    cfg.set(0, primary, CellSpec::Variable(Variable::input(primary as u16)))?;
    cfg.set(4, primary, CellSpec::Absent)?;
    Ok(cfg)
}

/// Initialization setting, state *before* the first S-box layer:
/// `x0 = IV`, `x1 = k_0..k_63`, `x2 = k_64..k_127`, and public variables on
/// the listed columns of rows 3 and 4.
pub fn initialization(iv: u64, row3: &[usize], row4: &[usize]) -> Result<StateConfig> {
    let mut cfg = StateConfig::absent(WIDTH)
        .with_row(0, |i| CellSpec::Constant((iv >> (WIDTH - 1 - i)) & 1 == 1))?
        .with_row(1, |i| CellSpec::Variable(Variable::key(i as u16)))?
        .with_row(2, |i| CellSpec::Variable(Variable::key((i + WIDTH) as u16)))?;
    for (row, columns) in [(3, row3), (4, row4)] {
        for &i in columns {
            let v = Variable::named(Family::Input, i)?;
            cfg.set(row, i, CellSpec::Variable(v))?;
        }
    }
    Ok(cfg)
}

/// Countermeasure setting, state *before* the first S-box layer: every row
/// receives its own family, the public variables go to `public_row` and
/// the remaining rows get `a`, `b`, `c`, `d` in order.
pub fn countermeasure(width: usize, public_row: usize) -> Result<StateConfig> {
    if public_row >= ROWS {
        return Err(AnfError::InvalidParameters(format!(
            "public row {public_row} is not a state row"
        )));
    }
    let mut order = vec![Family::Nonce, Family::Aux('b'), Family::Aux('c'), Family::Aux('d')];
    order.insert(public_row, Family::Input);
    let mut cfg = StateConfig::absent(width);
    for (row, family) in order.into_iter().enumerate() {
        cfg = cfg.with_row(row, |i| CellSpec::Expr(var(family, i)))?;
    }
    Ok(cfg)
}

// ---------------------------------------------------------------------------
// Conditional cubes of the 5/6-round initialization attack
// ---------------------------------------------------------------------------

/// A published conditional cube: its indices, the columns receiving public
/// variables on rows 3 and 4, and the row whose copy of the primary variable
/// carries the useful coefficient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeChoice {
    pub name: String,
    pub cube: Vec<usize>,
    pub row3: Vec<usize>,
    pub row4: Vec<usize>,
    pub target_row: usize,
    /// Cyclic shift to apply before tracking (the cube is never used for
    /// primary variable 0 when non-zero).
    pub shift: usize,
}

impl CubeChoice {
    fn new(name: &str, cube: &[usize], row3: &[usize], row4: &[usize], target_row: usize) -> Self {
        CubeChoice {
            name: name.to_string(),
            cube: cube.to_vec(),
            row3: row3.to_vec(),
            row4: row4.to_vec(),
            target_row,
            shift: 0,
        }
    }

    /// Primary variable the cube is built around.
    pub fn primary(&self) -> usize {
        self.shift % WIDTH
    }

    /// Cube indices and row-4 columns rotated by [`Self::shift`]. Row 3 is
    /// either empty or full in every published choice and is left alone.
    pub fn shifted(&self) -> CubeChoice {
        let rot = |xs: &[usize]| xs.iter().map(|x| (x + self.shift) % WIDTH).collect();
        CubeChoice {
            cube: rot(&self.cube),
            row4: rot(&self.row4),
            ..self.clone()
        }
    }

    pub fn state(&self, iv: u64) -> Result<StateConfig> {
        let c = self.shifted();
        initialization(iv, &c.row3, &c.row4)
    }
}

/// The ten conditional cubes of Li, Dong and Wang (ToSC 2017).
pub fn ldw17_cubes() -> Vec<CubeChoice> {
    let all: Vec<usize> = (0..WIDTH).collect();
    let mut cube5_deg16 = CubeChoice::new(
        "cube5_deg16",
        &[0, 5, 8, 14, 15, 27, 29, 30, 34, 36, 37, 38, 39, 45, 49, 50],
        &all,
        &[],
        1,
    );
    cube5_deg16.shift = 1;
    let mut cube5_deg32 = CubeChoice::new(
        "cube5_deg32",
        &[
            0, 1, 4, 5, 6, 8, 9, 11, 14, 15, 16, 18, 24, 26, 27, 29, 30, 34, 36, 37, 38, 39, 45,
            47, 48, 49, 50, 56, 58, 59, 60, 63,
        ],
        &all,
        &[9, 11, 18, 24, 47],
        1,
    );
    cube5_deg32.shift = 1;

    vec![
        // primary variable and all others on row 4
        CubeChoice::new(
            "cube1_deg16",
            &[0, 5, 8, 12, 14, 15, 18, 19, 21, 27, 28, 30, 34, 37, 49, 50],
            &[],
            &all,
            0,
        ),
        CubeChoice::new(
            "cube2_deg16",
            &[0, 5, 7, 8, 14, 15, 24, 27, 30, 34, 37, 41, 43, 49, 50, 52],
            &[],
            &all,
            4,
        ),
        // primary variable and all others on row 3
        CubeChoice::new(
            "cube4_deg16",
            &[0, 5, 8, 14, 15, 16, 17, 20, 27, 29, 30, 33, 34, 35, 37, 38],
            &all,
            &[],
            1,
        ),
        CubeChoice::new(
            "cube4_deg32",
            &[
                0, 1, 3, 4, 5, 6, 8, 14, 15, 16, 17, 20, 26, 27, 29, 30, 33, 34, 35, 37, 38, 39,
                40, 46, 49, 50, 55, 58, 59, 60, 62, 63,
            ],
            &all,
            &[],
            1,
        ),
        cube5_deg16,
        cube5_deg32,
        // row 3 public, row 4 empty except on the primary column
        CubeChoice::new(
            "cube3_deg16",
            &[0, 1, 4, 5, 6, 8, 14, 15, 16, 17, 20, 26, 27, 29, 30, 33],
            &all,
            &[0],
            1,
        ),
        CubeChoice::new(
            "cube3_deg32",
            &[
                0, 1, 4, 5, 6, 8, 14, 15, 16, 17, 20, 26, 27, 29, 30, 33, 34, 35, 37, 38, 39, 40,
                46, 48, 49, 50, 55, 56, 58, 59, 62, 63,
            ],
            &all,
            &[0],
            1,
        ),
        CubeChoice::new(
            "cube1_deg32",
            &[
                0, 1, 4, 5, 6, 7, 8, 10, 13, 14, 15, 16, 17, 24, 26, 27, 30, 34, 35, 37, 40, 41,
                43, 46, 48, 49, 50, 52, 56, 59, 60, 63,
            ],
            &all,
            &[0, 60, 63],
            4,
        ),
        CubeChoice::new(
            "cube2_deg32",
            &[
                0, 1, 4, 5, 6, 8, 9, 12, 14, 15, 16, 17, 18, 19, 21, 26, 27, 28, 30, 34, 35, 37,
                40, 46, 48, 49, 50, 53, 56, 59, 60, 63,
            ],
            &all,
            &[0, 60, 63],
            0,
        ),
    ]
}

pub fn ldw17_cube(name: &str) -> Option<CubeChoice> {
    ldw17_cubes().into_iter().find(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_misuse_rows() {
        let st = nonce_misuse(WIDTH).unwrap().build().unwrap();
        assert_eq!(*st.cell(0, 7).unwrap(), "v7*a7 + v7".parse().unwrap());
        assert_eq!(*st.cell(1, 7).unwrap(), "v7".parse().unwrap());
        assert!(st.cell(2, 7).unwrap().is_zero());
        assert_eq!(*st.cell(3, 7).unwrap(), "v7*e7".parse().unwrap());
        assert_eq!(*st.cell(4, 7).unwrap(), "v7*a7".parse().unwrap());
    }

    #[test]
    fn condition_clears_primary_column() {
        let st = nonce_misuse_with_condition(WIDTH, 5).unwrap().build().unwrap();
        assert_eq!(*st.cell(0, 5).unwrap(), "v5".parse().unwrap());
        assert!(st.cell(4, 5).unwrap().is_zero());
        assert_eq!(*st.cell(4, 6).unwrap(), "v6*a6".parse().unwrap());
    }

    #[test]
    fn initialization_places_iv_msb_first() {
        let cfg = initialization(ASCON_128_IV, &[1, 2], &[0]).unwrap();
        let st = cfg.build().unwrap();
        // 0x80 -> column 0 set, 0x40 -> column 9 set
        assert!(st.cell(0, 0).unwrap().is_one());
        assert!(st.cell(0, 1).unwrap().is_zero());
        assert!(st.cell(0, 9).unwrap().is_one());
        assert_eq!(*st.cell(2, 3).unwrap(), "k67".parse().unwrap());
        assert_eq!(*st.cell(3, 2).unwrap(), "v2".parse().unwrap());
        assert!(st.cell(3, 0).unwrap().is_zero());
        assert_eq!(*st.cell(4, 0).unwrap(), "v0".parse().unwrap());
        let ones = st.row(0).unwrap().iter().filter(|p| p.is_one()).count();
        assert_eq!(ones as u32, ASCON_128_IV.count_ones());
    }

    #[test]
    fn initialization_rejects_bad_index() {
        assert!(matches!(
            initialization(0, &[64], &[]),
            Err(AnfError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn countermeasure_orders_families() {
        let st = countermeasure(WIDTH, 2).unwrap().build().unwrap();
        assert_eq!(*st.cell(0, 1).unwrap(), "a1".parse().unwrap());
        assert_eq!(*st.cell(1, 1).unwrap(), "b1".parse().unwrap());
        assert_eq!(*st.cell(2, 1).unwrap(), "v1".parse().unwrap());
        assert_eq!(*st.cell(4, 1).unwrap(), "d1".parse().unwrap());
        assert!(countermeasure(WIDTH, 5).is_err());
    }

    #[test]
    fn build_rejects_out_of_range_variables() {
        let mut cfg = StateConfig::absent(4);
        cfg.set(1, 1, CellSpec::Variable(Variable::input(70))).unwrap();
        assert!(matches!(cfg.build(), Err(AnfError::IndexOutOfRange { .. })));
        assert!(cfg.set(5, 0, CellSpec::Absent).is_err());
    }

    #[test]
    fn cube_table_is_consistent() {
        let cubes = ldw17_cubes();
        assert_eq!(cubes.len(), 10);
        for c in &cubes {
            let deg: usize = if c.name.ends_with("deg16") { 16 } else { 32 };
            assert_eq!(c.cube.len(), deg, "{}", c.name);
            assert!(c.cube.iter().all(|&i| i < WIDTH));
        }
        let c5 = ldw17_cube("cube5_deg32").unwrap().shifted();
        assert_eq!(c5.row4, vec![10, 12, 19, 25, 48]);
        assert_eq!(c5.cube[0], 1);
        assert_eq!(c5.cube[31], 0);
        assert_eq!(ldw17_cube("cube5_deg16").unwrap().primary(), 1);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = nonce_misuse(4).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: StateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);

        let cfg = countermeasure(4, 1).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: StateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn build_rejects_aux_family_shadowing_a_builtin() {
        let shadow = Variable::Named {
            family: Family::Aux('v'),
            index: 3,
        };
        let mut cfg = StateConfig::absent(4);
        cfg.set(0, 3, CellSpec::Variable(shadow)).unwrap();
        assert!(matches!(cfg.build(), Err(AnfError::InvalidParameters(_))));

        let mut cfg = StateConfig::absent(4);
        cfg.set(2, 1, CellSpec::Expr(Polynomial::from(shadow))).unwrap();
        assert!(matches!(cfg.build(), Err(AnfError::InvalidParameters(_))));
    }
}
