//! Boolean polynomials in algebraic normal form
//! ===========================================
//! Exact GF(2) arithmetic on symbols that are never assigned a value.
//!
//! * A [`Monomial`] is a *set* of variables: `x·x = x`, so a factor never
//!   repeats and the empty set is the constant `1`.
//! * A [`Polynomial`] is a *set* of monomials: `m + m = 0`, so equal terms
//!   cancel and the empty set is the constant `0`.
//!
//! Both invariants are maintained by construction; every operation returns a
//! fresh value.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AnfError, Result};

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Semantic family of a named variable. The display symbol is the family
/// letter followed by the index (`v3`, `k70`, `a12`, `e0`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    /// Public (cube) variables, `v`.
    Input,
    /// 128 key bits, `k`.
    Key,
    /// Nonce / IV-derived bits, `a`.
    Nonce,
    /// Error bits, `e`.
    Error,
    /// Any other single-letter family (`b`, `c`, `d`, ...).
    Aux(char),
}

impl Family {
    pub fn symbol(self) -> char {
        match self {
            Family::Input => 'v',
            Family::Key => 'k',
            Family::Nonce => 'a',
            Family::Error => 'e',
            Family::Aux(c) => c,
        }
    }

    /// Number of distinct indices in the family.
    pub fn width(self) -> usize {
        match self {
            Family::Key => 128,
            _ => 64,
        }
    }

    /// Auxiliary families must use a lowercase letter that no built-in
    /// family claims, or the text form would read back as another family.
    pub fn is_valid(self) -> bool {
        match self {
            Family::Aux(c) => c.is_ascii_lowercase() && !matches!(c, 'v' | 'k' | 'a' | 'e'),
            _ => true,
        }
    }

    pub fn from_symbol(c: char) -> Option<Family> {
        match c {
            'v' => Some(Family::Input),
            'k' => Some(Family::Key),
            'a' => Some(Family::Nonce),
            'e' => Some(Family::Error),
            c if c.is_ascii_lowercase() => Some(Family::Aux(c)),
            _ => None,
        }
    }
}

/// Row-of-origin marker carried multiplicatively by a tagged variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provenance {
    Target,
    Other,
}

impl Provenance {
    pub fn symbol(self) -> char {
        match self {
            Provenance::Target => 'T',
            Provenance::Other => 'O',
        }
    }

    pub fn variable(self) -> Variable {
        Variable::Flag(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    Named { family: Family, index: u16 },
    Flag(Provenance),
}

impl Variable {
    /// Checked constructor: `index` must lie inside the family's width.
    pub fn named(family: Family, index: usize) -> Result<Self> {
        if !family.is_valid() {
            return Err(AnfError::InvalidParameters(format!(
                "`{}` is not usable as an auxiliary family symbol",
                family.symbol()
            )));
        }
        if index >= family.width() {
            return Err(AnfError::IndexOutOfRange {
                family: family.symbol(),
                index,
                width: family.width(),
            });
        }
        Ok(Variable::Named {
            family,
            index: index as u16,
        })
    }

    // Unchecked shortcuts for indices already known to be in range.

    pub const fn input(index: u16) -> Self {
        Variable::Named {
            family: Family::Input,
            index,
        }
    }

    pub const fn key(index: u16) -> Self {
        Variable::Named {
            family: Family::Key,
            index,
        }
    }

    pub const fn nonce(index: u16) -> Self {
        Variable::Named {
            family: Family::Nonce,
            index,
        }
    }

    pub const fn error(index: u16) -> Self {
        Variable::Named {
            family: Family::Error,
            index,
        }
    }

    pub fn is_flag(self) -> bool {
        matches!(self, Variable::Flag(_))
    }

    pub fn family(self) -> Option<Family> {
        match self {
            Variable::Named { family, .. } => Some(family),
            Variable::Flag(_) => None,
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Variable::Named { index, .. } => Some(index as usize),
            Variable::Flag(_) => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Named { family, index } => write!(f, "{}{}", family.symbol(), index),
            Variable::Flag(p) => write!(f, "{}", p.symbol()),
        }
    }
}

impl FromStr for Variable {
    type Err = AnfError;

    fn from_str(s: &str) -> Result<Self> {
        let parse_err = |reason: &str| AnfError::Parse {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        match s {
            "T" => return Ok(Variable::Flag(Provenance::Target)),
            "O" => return Ok(Variable::Flag(Provenance::Other)),
            _ => {}
        }
        let mut chars = s.chars();
        let family = chars
            .next()
            .and_then(Family::from_symbol)
            .ok_or_else(|| parse_err("expected a family letter"))?;
        let index = chars
            .as_str()
            .parse::<usize>()
            .map_err(|_| parse_err("expected a decimal index"))?;
        Variable::named(family, index)
    }
}

// ---------------------------------------------------------------------------
// Monomials
// ---------------------------------------------------------------------------

/// Product of distinct variables, kept sorted. The empty product is `1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Monomial(Vec<Variable>);

impl Monomial {
    pub fn one() -> Self {
        Monomial(Vec::new())
    }

    pub fn from_variables<I: IntoIterator<Item = Variable>>(vars: I) -> Self {
        let mut v: Vec<Variable> = vars.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Monomial(v)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.0
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, v: Variable) -> bool {
        self.0.binary_search(&v).is_ok()
    }

    /// Number of non-flag factors. Flags are markers, not content.
    pub fn degree(&self) -> usize {
        self.0.iter().filter(|v| !v.is_flag()).count()
    }

    /// Number of factors belonging to `family`.
    pub fn family_degree(&self, family: Family) -> usize {
        self.0
            .iter()
            .filter(|v| v.family() == Some(family))
            .count()
    }

    /// `Target` wins over `Other` when both flags are present.
    pub fn provenance(&self) -> Option<Provenance> {
        if self.contains(Provenance::Target.variable()) {
            Some(Provenance::Target)
        } else if self.contains(Provenance::Other.variable()) {
            Some(Provenance::Other)
        } else {
            None
        }
    }

    /// Set union of the two factor lists (sorted merge).
    pub fn product(&self, other: &Monomial) -> Monomial {
        if self.is_one() {
            return other.clone();
        }
        if other.is_one() {
            return self.clone();
        }
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        Monomial(out)
    }

    /// Monomial with every factor matching `drop` removed.
    pub fn without<F: Fn(Variable) -> bool>(&self, drop: F) -> Monomial {
        Monomial(self.0.iter().copied().filter(|v| !drop(*v)).collect())
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Polynomials
// ---------------------------------------------------------------------------

/// Sum of distinct monomials over GF(2). The empty sum is `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Polynomial {
    terms: BTreeSet<Monomial>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Polynomial::default()
    }

    pub fn one() -> Self {
        Polynomial::from_monomial(Monomial::one())
    }

    pub fn constant(bit: bool) -> Self {
        if bit {
            Polynomial::one()
        } else {
            Polynomial::zero()
        }
    }

    pub fn from_monomial(m: Monomial) -> Self {
        let mut terms = BTreeSet::new();
        terms.insert(m);
        Polynomial { terms }
    }

    /// Builds a polynomial from arbitrary terms; repeated terms cancel in pairs.
    pub fn from_terms<I: IntoIterator<Item = Monomial>>(terms: I) -> Self {
        let mut out = BTreeSet::new();
        for m in terms {
            if !out.remove(&m) {
                out.insert(m);
            }
        }
        Polynomial { terms: out }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.terms.len() == 1 && self.terms.iter().all(Monomial::is_one)
    }

    /// Number of monomials.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &Monomial> {
        self.terms.iter()
    }

    pub fn contains_term(&self, m: &Monomial) -> bool {
        self.terms.contains(m)
    }

    pub fn contains_variable(&self, v: Variable) -> bool {
        self.terms.iter().any(|m| m.contains(v))
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        self.terms
            .iter()
            .flat_map(|m| m.variables().iter().copied())
            .collect()
    }

    /// GF(2) addition: symmetric difference of the term sets.
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        Polynomial {
            terms: self
                .terms
                .symmetric_difference(&other.terms)
                .cloned()
                .collect(),
        }
    }

    /// Distributive expansion followed by pairwise cancellation.
    ///
    /// Cross products are toggled in a hash set so coinciding unions cancel
    /// without a second pass.
    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        if self.is_one() {
            return other.clone();
        }
        if other.is_one() {
            return self.clone();
        }
        let mut acc: HashSet<Monomial> = HashSet::with_capacity(self.len() * other.len());
        for m in &self.terms {
            for n in &other.terms {
                let p = m.product(n);
                if !acc.remove(&p) {
                    acc.insert(p);
                }
            }
        }
        Polynomial {
            terms: acc.into_iter().collect(),
        }
    }

    /// `(v + 1) * self`, the S-box's recurring `~x & y` pattern.
    pub fn mul_plus_one(&self, v: &Polynomial) -> Polynomial {
        v.mul(self).add(self)
    }

    /// Largest monomial degree, flags excluded. Zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.terms.iter().map(Monomial::degree).max().unwrap_or(0)
    }

    pub fn family_degree(&self, family: Family) -> usize {
        self.terms
            .iter()
            .map(|m| m.family_degree(family))
            .max()
            .unwrap_or(0)
    }

    fn filter<F: Fn(&Monomial) -> bool>(&self, keep: F) -> Polynomial {
        Polynomial {
            terms: self.terms.iter().filter(|m| keep(m)).cloned().collect(),
        }
    }

    /// Terms whose non-flag degree is exactly `k`.
    pub fn filter_degree_exactly(&self, k: usize) -> Polynomial {
        self.filter(|m| m.degree() == k)
    }

    /// Terms with exactly `k` factors from `family`.
    pub fn filter_family_degree(&self, family: Family, k: usize) -> Polynomial {
        self.filter(|m| m.family_degree(family) == k)
    }

    /// Terms containing `v`.
    pub fn involving(&self, v: Variable) -> Polynomial {
        self.filter(|m| m.contains(v))
    }

    /// Replaces each mapped variable by its image. Terms without a mapped
    /// variable are carried over unchanged.
    pub fn substitute(&self, mapping: &HashMap<Variable, Polynomial>) -> Polynomial {
        let mut out = Polynomial::zero();
        let mut untouched = Vec::new();
        for m in &self.terms {
            if !m.variables().iter().any(|v| mapping.contains_key(v)) {
                untouched.push(m.clone());
                continue;
            }
            let mut term = Polynomial::one();
            let mut rest = Vec::new();
            for v in m.variables() {
                match mapping.get(v) {
                    Some(image) => term = term.mul(image),
                    None => rest.push(*v),
                }
            }
            let term = term.mul(&Polynomial::from_monomial(Monomial::from_variables(rest)));
            out += &term;
        }
        out + Polynomial::from_terms(untouched)
    }

    /// Writes `self = q·v + r` with neither `q` nor `r` containing `v`.
    pub fn split_on(&self, v: Variable) -> (Polynomial, Polynomial) {
        let mut q = BTreeSet::new();
        let mut r = BTreeSet::new();
        for m in &self.terms {
            if m.contains(v) {
                q.insert(m.without(|x| x == v));
            } else {
                r.insert(m.clone());
            }
        }
        (Polynomial { terms: q }, Polynomial { terms: r })
    }

    /// Drops every provenance flag; terms that become equal cancel.
    pub fn strip_flags(&self) -> Polynomial {
        Polynomial::from_terms(self.terms.iter().map(|m| m.without(Variable::is_flag)))
    }
}

impl From<Variable> for Polynomial {
    fn from(v: Variable) -> Self {
        Polynomial::from_monomial(Monomial::from_variables([v]))
    }
}

impl From<Monomial> for Polynomial {
    fn from(m: Monomial) -> Self {
        Polynomial::from_monomial(m)
    }
}

impl std::ops::Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        Polynomial::add(self, rhs)
    }
}

impl std::ops::Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        Polynomial::add(&self, &rhs)
    }
}

impl std::ops::AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        for m in &rhs.terms {
            if !self.terms.remove(m) {
                self.terms.insert(m.clone());
            }
        }
    }
}

impl std::ops::Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        Polynomial::mul(self, rhs)
    }
}

impl std::ops::Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        Polynomial::mul(&self, &rhs)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        // constant term last, as in the usual printed ANF
        let mut first = true;
        let terms = self.terms.iter().filter(|m| !m.is_one());
        let constant = self.terms.iter().filter(|m| m.is_one());
        for m in terms.chain(constant) {
            if !first {
                write!(f, " + ")?;
            }
            write!(f, "{m}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Polynomial {
    type Err = AnfError;

    /// Parses `"v0*a3 + e1 + 1"`. Repeated terms cancel, repeated factors
    /// collapse.
    fn from_str(s: &str) -> Result<Self> {
        let mut terms = Vec::new();
        for raw in s.split('+') {
            let term = raw.trim();
            if term.is_empty() {
                return Err(AnfError::Parse {
                    input: s.to_string(),
                    reason: "empty term".to_string(),
                });
            }
            match term {
                "0" => continue,
                "1" => terms.push(Monomial::one()),
                _ => {
                    let vars = term
                        .split('*')
                        .map(|f| f.trim().parse::<Variable>())
                        .collect::<Result<Vec<_>>>()?;
                    terms.push(Monomial::from_variables(vars));
                }
            }
        }
        Ok(Polynomial::from_terms(terms))
    }
}

impl Serialize for Polynomial {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Polynomial {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// -----------------------------------------------------------------------
//  TESTS
// -----------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Polynomial {
        s.parse().unwrap()
    }

    #[test]
    fn aux_family_symbols_are_restricted() {
        for c in ['v', 'k', 'a', 'e', 'T', 'O', 'B', '3', '*'] {
            assert!(
                matches!(
                    Variable::named(Family::Aux(c), 3),
                    Err(AnfError::InvalidParameters(_))
                ),
                "{c:?}"
            );
        }
        let b3 = Variable::named(Family::Aux('b'), 3).unwrap();
        assert_eq!(b3.to_string().parse::<Variable>().unwrap(), b3);
    }

    #[test]
    fn addition_cancels_equal_terms() {
        let a = p("v0*v1 + a3 + 1");
        let b = p("a3 + v2");
        assert_eq!(&a + &b, p("v0*v1 + v2 + 1"));
        assert!((&a + &a).is_zero());
    }

    #[test]
    fn multiplication_collapses_squares_and_cancels_cross_terms() {
        let v0 = Polynomial::from(Variable::input(0));
        assert_eq!(&v0 * &v0, v0);

        // (v0 + v1)(v0 + v1) = v0 + v1 in the Boolean ring
        let s = p("v0 + v1");
        assert_eq!(&s * &s, s);

        // (v0 + v1)(v1 + v2) = v0*v1 + v0*v2 + v1 + v1*v2
        assert_eq!(&p("v0 + v1") * &p("v1 + v2"), p("v0*v1 + v0*v2 + v1 + v1*v2"));
    }

    #[test]
    fn mul_plus_one_matches_expansion() {
        let x = p("v0 + a1");
        let y = p("v2*e3 + 1");
        assert_eq!(y.mul_plus_one(&x), &(&x + &Polynomial::one()) * &y);
    }

    #[test]
    fn degree_ignores_flags() {
        let t = p("v0*v5*T + v1*O + a2*e2*v3");
        assert_eq!(t.degree(), 3);
        assert_eq!(t.filter_degree_exactly(2), p("v0*v5*T"));
        assert_eq!(t.filter_family_degree(Family::Input, 1), p("v1*O + a2*e2*v3"));
        assert_eq!(t.family_degree(Family::Input), 2);
    }

    #[test]
    fn involving_selects_terms() {
        let q = p("v0*v1 + v1*v2 + v0 + 1");
        assert_eq!(q.involving(Variable::input(0)), p("v0*v1 + v0"));
    }

    #[test]
    fn substitution_tags_every_occurrence() {
        let q = p("v0*a0 + v0 + v1");
        let mut map = HashMap::new();
        map.insert(Variable::input(0), p("v0*T"));
        assert_eq!(q.substitute(&map), p("v0*a0*T + v0*T + v1"));
    }

    #[test]
    fn substitution_can_cancel() {
        // v0 -> v1 turns v0 + v1 into zero
        let mut map = HashMap::new();
        map.insert(Variable::input(0), p("v1"));
        assert!(p("v0 + v1").substitute(&map).is_zero());
    }

    #[test]
    fn split_on_variable() {
        let (q, r) = p("a0*e1 + a0 + e2 + 1").split_on(Variable::nonce(0));
        assert_eq!(q, p("e1 + 1"));
        assert_eq!(r, p("e2 + 1"));
    }

    #[test]
    fn strip_flags_merges_terms() {
        assert!(p("v0*v1*T + v0*v1*O").strip_flags().is_zero());
        assert_eq!(p("v0*v1*T + a2").strip_flags(), p("v0*v1 + a2"));
    }

    #[test]
    fn display_round_trips_through_parser() {
        let q = p("1 + v3*k70 + e0*T");
        assert_eq!(q.to_string().parse::<Polynomial>().unwrap(), q);
        assert_eq!(Polynomial::zero().to_string(), "0");
        assert!(q.to_string().ends_with(" + 1"));
    }

    #[test]
    fn parser_rejects_garbage() {
        assert!(matches!("v0 + ".parse::<Polynomial>(), Err(AnfError::Parse { .. })));
        assert!(matches!("v64".parse::<Polynomial>(), Err(AnfError::IndexOutOfRange { .. })));
        assert!("k127".parse::<Polynomial>().is_ok());
        assert!("Xy".parse::<Polynomial>().is_err());
    }

    #[test]
    fn monomial_provenance_prefers_target() {
        assert_eq!(p("v0*T*O").terms().next().unwrap().provenance(), Some(Provenance::Target));
        assert_eq!(p("v0*O").terms().next().unwrap().provenance(), Some(Provenance::Other));
        assert_eq!(p("v0").terms().next().unwrap().provenance(), None);
    }
}
