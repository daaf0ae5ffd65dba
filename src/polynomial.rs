use crate::tree::Label;
use std::collections::{BTreeMap, btree_map::Entry};

/// An atom of a monomial.
///
/// Symbols are ordered by their labels. Opaque factors stand in for
/// subtrees that cannot be expanded into a polynomial, and refer to the index
/// of that subtree's node. They are ordered after all symbols.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Factor {
    Symbol(Label),
    Opaque(usize),
}

/// Product of factors, each raised to a positive integer exponent.
pub type Monomial = BTreeMap<Factor, u32>;

/// Sum of monomials with non-zero coefficients.
///
/// The terms are kept sorted by their monomials, which makes the polynomial
/// canonical: two expressions that expand to the same sum of products produce
/// identical polynomials.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    pub fn zero() -> Polynomial {
        Polynomial {
            terms: BTreeMap::new(),
        }
    }

    pub fn constant(value: f64) -> Polynomial {
        let mut poly = Polynomial::zero();
        poly.add_term(Monomial::new(), value);
        poly
    }

    pub fn factor(factor: Factor) -> Polynomial {
        let mut poly = Polynomial::zero();
        poly.add_term(Monomial::from([(factor, 1)]), 1.);
        poly
    }

    fn add_term(&mut self, mono: Monomial, coeff: f64) {
        match self.terms.entry(mono) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += coeff;
                if *entry.get() == 0. {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                if coeff != 0. {
                    entry.insert(coeff);
                }
            }
        }
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of this polynomial if it has no factors.
    pub fn as_constant(&self) -> Option<f64> {
        let mut terms = self.terms.iter();
        match (terms.next(), terms.next()) {
            (None, _) => Some(0.),
            (Some((mono, coeff)), None) if mono.is_empty() => Some(*coeff),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.terms.values().all(|c| c.is_finite())
    }

    /// Terms in ascending order of their monomials.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(mono, coeff)| (mono, *coeff))
    }

    pub fn add(mut self, other: &Polynomial) -> Polynomial {
        for (mono, coeff) in other.terms.iter() {
            self.add_term(mono.clone(), *coeff);
        }
        self
    }

    pub fn sub(mut self, other: &Polynomial) -> Polynomial {
        for (mono, coeff) in other.terms.iter() {
            self.add_term(mono.clone(), -*coeff);
        }
        self
    }

    pub fn scale(mut self, factor: f64) -> Polynomial {
        if factor == 0. {
            return Polynomial::zero();
        }
        for coeff in self.terms.values_mut() {
            *coeff *= factor;
        }
        self
    }

    pub fn negate(self) -> Polynomial {
        self.scale(-1.)
    }

    /// Product of two polynomials. Returns `None` if the product could have
    /// more than `max_terms` terms.
    pub fn checked_mul(&self, other: &Polynomial, max_terms: usize) -> Option<Polynomial> {
        if self.len().saturating_mul(other.len()) > max_terms {
            return None;
        }
        let mut out = Polynomial::zero();
        for (lmono, lcoeff) in self.terms.iter() {
            for (rmono, rcoeff) in other.terms.iter() {
                let mut mono = lmono.clone();
                for (factor, exp) in rmono {
                    *mono.entry(*factor).or_insert(0) += exp;
                }
                out.add_term(mono, lcoeff * rcoeff);
            }
        }
        Some(out)
    }

    /// Raise this polynomial to a non-negative integer power. Returns `None` if
    /// any intermediate product could have more than `max_terms` terms.
    pub fn checked_pow(&self, exponent: u32, max_terms: usize) -> Option<Polynomial> {
        let mut out = Polynomial::constant(1.);
        for _ in 0..exponent {
            out = out.checked_mul(self, max_terms)?;
        }
        Some(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sym(c: char) -> Polynomial {
        Polynomial::factor(Factor::Symbol(Label::scalar(c)))
    }

    #[test]
    fn t_like_terms() {
        let x = sym('x');
        let sum = x.clone().add(&x).add(&Polynomial::constant(3.));
        assert_eq!(sum.len(), 2);
        assert_eq!(sum.as_constant(), None);
        let coeffs: Vec<f64> = sum.terms().map(|(_, c)| c).collect();
        // The constant term has the smallest monomial.
        assert_eq!(coeffs, vec![3., 2.]);
        let zero = sum.sub(&x).sub(&x).sub(&Polynomial::constant(3.));
        assert!(zero.is_zero());
        assert_eq!(zero.as_constant(), Some(0.));
    }

    #[test]
    fn t_binomial() {
        let (x, y) = (sym('x'), sym('y'));
        let square = x.add(&y).checked_pow(2, 16).unwrap();
        assert_eq!(square.len(), 3);
        let xkey = Factor::Symbol(Label::scalar('x'));
        let ykey = Factor::Symbol(Label::scalar('y'));
        let terms: Vec<(Monomial, f64)> = square.terms().map(|(m, c)| (m.clone(), c)).collect();
        assert_eq!(
            terms,
            vec![
                (Monomial::from([(xkey, 1), (ykey, 1)]), 2.),
                (Monomial::from([(xkey, 2)]), 1.),
                (Monomial::from([(ykey, 2)]), 1.),
            ]
        );
    }

    #[test]
    fn t_term_limit() {
        let sum = sym('a').add(&sym('b')).add(&sym('c'));
        assert!(sum.checked_mul(&sum, 8).is_none());
        assert!(sum.checked_mul(&sum, 9).is_some());
        assert!(sum.checked_pow(3, 9).is_none());
        assert_eq!(sum.checked_pow(0, 1), Some(Polynomial::constant(1.)));
    }

    #[test]
    fn t_factor_order() {
        assert!(Factor::Symbol(Label::entry('x', 3, 0)) < Factor::Opaque(0));
        assert!(Factor::Symbol(Label::entry('A', 0, 1)) < Factor::Symbol(Label::entry('x', 0, 0)));
    }
}
