//! ASCON-ANF: symbolic propagation through the ASCON permutation
//! ==============================================================
//! Tracks Boolean polynomials in **algebraic normal form** through one or two
//! rounds of the ASCON permutation and tells, for a chosen public variable
//! `v_p`, which other public variables it gets multiplied with and under
//! which conditions on the inner state that multiplication can be removed.
//! This is the bookkeeping behind conditional cube attacks in the
//! nonce-misuse and initialization settings.
//!
//! ## Pipeline
//! * [`setting`]: build an initial state ([`StateConfig`]) from constants,
//!   single variables or whole expressions.
//! * [`provenance`]: tag the copy of `v_p` on a target row with `T`, every
//!   other copy with `O`.
//! * [`permutation`] / [`diffusion`]: `pC`, `pS` (bit-sliced, symbolic) and
//!   `pL` on a state of 5 rows × `width` columns.
//! * [`classifier`]: read off degree-2 terms `v_p·v_i` with their
//!   coefficients and provenance.
//! * [`analyzer`]: grade each coefficient set (constant, complementary
//!   pair, common divisor, irreducible) using exact GCDs from [`division`].
//! * [`tracking`]: the whole run end to end, plus the set constructions used
//!   to pick cubes.
//!
//! Polynomials live in GF(2)[x]/(x² + x): monomials are square-free and
//! every operation reduces on the fly.
//!
//! ```
//! use ascon_anf::{nonce_misuse_sets, Permutation};
//!
//! let sets = nonce_misuse_sets(&Permutation::ascon(), 0).unwrap();
//! assert_eq!(sets[3].len(), 22);
//! ```
//!
//! Enable the `parallel` feature to run batches of trackings on Rayon's pool.

pub mod analyzer;
pub mod anf;
pub mod classifier;
pub mod diffusion;
pub mod division;
pub mod error;
pub mod permutation;
pub mod provenance;
pub mod setting;
pub mod tracking;

pub use analyzer::{analyze, analyze_sets, classify_coefficients, AnalysisSummary, MitigationClass};
pub use anf::{Family, Monomial, Polynomial, Provenance, Variable};
pub use classifier::{classify, Classification, CouplingRecord};
pub use division::gcd_all;
pub use error::{AnfError, Result};
pub use permutation::{Permutation, State, MAX_ROUNDS, ROWS, WIDTH};
pub use provenance::tag_variable;
pub use setting::{
    countermeasure, initialization, ldw17_cube, ldw17_cubes, nonce_misuse,
    nonce_misuse_with_condition, CellSpec, CubeChoice, StateConfig, ASCON_128_IV,
};
pub use tracking::{countermeasure_sets, nonce_misuse_sets, run_batch, Tracking, TrackingReport};
