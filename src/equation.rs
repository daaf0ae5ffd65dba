use crate::{
    error::Error,
    tree::{MatrixSymbol, Tree},
};

/// Assignment of an expression to a matrix symbol, i.e. `lhs = rhs`.
///
/// The left hand side names where the value of the expression goes, for
/// example the output argument of a generated routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    lhs: MatrixSymbol,
    rhs: Tree,
}

impl Equation {
    /// Create an equation. The dimensions of `lhs` and `rhs` must match.
    pub fn new(lhs: MatrixSymbol, rhs: Tree) -> Result<Equation, Error> {
        if lhs.dims() != rhs.dims() {
            return Err(Error::DimensionMismatch(lhs.dims(), rhs.dims()));
        }
        Ok(Equation { lhs, rhs })
    }

    pub fn lhs(&self) -> &MatrixSymbol {
        &self.lhs
    }

    pub fn rhs(&self) -> &Tree {
        &self.rhs
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::deftree;

    #[test]
    fn t_dimensions() {
        let g = MatrixSymbol::new('g', 2, 1).unwrap();
        let eq = Equation::new(g, deftree!(concat x y).unwrap()).unwrap();
        assert_eq!(eq.lhs().name(), 'g');
        assert_eq!(eq.rhs().dims(), (2, 1));
        assert_eq!(
            Equation::new(g, deftree!(concat x y z).unwrap()),
            Err(Error::DimensionMismatch((2, 1), (3, 1)))
        );
    }
}
