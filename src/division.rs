//! Exact division and GCD for multilinear GF(2) polynomials.
//!
//! Coefficient polynomials are read in the ordinary ring `GF(2)[x1..xn]`
//! (not modulo `x² = x`). A product of multilinear polynomials is
//! multilinear only when the factors have disjoint supports, so every
//! divisor of a multilinear polynomial is multilinear and shares no variable
//! with its cofactor. Both algorithms below lean on that fact and recurse on
//! one variable at a time, `f = f1·x + f0`.

use std::collections::BTreeSet;

use crate::anf::{Polynomial, Variable};

impl Polynomial {
    /// Exact quotient `self / d`, or `None` when `d` does not divide `self`.
    pub fn divide(&self, d: &Polynomial) -> Option<Polynomial> {
        if d.is_zero() {
            return None;
        }
        if d.is_one() {
            return Some(self.clone());
        }
        if self.is_zero() {
            return Some(Polynomial::zero());
        }
        let pivot = *d.variables().iter().next_back()?;
        let (d1, _) = d.split_on(pivot);
        let (f1, _) = self.split_on(pivot);
        // the quotient has no `pivot`, so f1 = q·d1
        let q = f1.divide(&d1)?;
        let disjoint = q.variables().is_disjoint(&d.variables());
        if disjoint && &q * d == *self {
            Some(q)
        } else {
            None
        }
    }

    pub fn divides(&self, f: &Polynomial) -> bool {
        f.divide(self).is_some()
    }

    /// Greatest common divisor; `gcd(0, f) = f`, and `1` means "no common
    /// divisor". Units of GF(2)[x] are trivial so the result is unique.
    pub fn gcd(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() || self == other {
            return self.clone();
        }
        if self.is_one() || other.is_one() {
            return Polynomial::one();
        }
        let Some(x) = pivot(self, other) else {
            // both constant and non-zero
            return Polynomial::one();
        };

        let (f1, f0) = self.split_on(x);
        let (g1, g0) = other.split_on(x);
        let cf = f1.gcd(&f0);
        let cg = g1.gcd(&g0);
        let content = cf.gcd(&cg);

        // Primitive parts have x-degree at most one; two primitive degree-one
        // polynomials share a factor only if they are equal.
        let (Some(pf), Some(pg)) = (self.divide(&cf), other.divide(&cg)) else {
            return content;
        };
        if pf.contains_variable(x) && pf == pg {
            &content * &pf
        } else {
            content
        }
    }
}

fn pivot(f: &Polynomial, g: &Polynomial) -> Option<Variable> {
    let vars: BTreeSet<Variable> = f.variables().union(&g.variables()).copied().collect();
    vars.into_iter().next_back()
}

/// GCD of a whole family of polynomials; the empty family yields `0`.
pub fn gcd_all<'a, I>(polys: I) -> Polynomial
where
    I: IntoIterator<Item = &'a Polynomial>,
{
    let mut acc = Polynomial::zero();
    for p in polys {
        acc = acc.gcd(p);
        if acc.is_one() {
            break;
        }
    }
    acc
}
