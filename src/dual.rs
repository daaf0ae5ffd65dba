use crate::{
    error::Error,
    eval::{Evaluator, ValueType},
    tree::{
        BinaryOp::{self, *},
        Label, Tree,
        UnaryOp::{self, *},
    },
};

fn map2<const DIM: usize>(
    a: [f64; DIM],
    b: [f64; DIM],
    func: impl Fn(f64, f64) -> f64,
) -> [f64; DIM] {
    let mut out = [0.; DIM];
    for i in 0..DIM {
        out[i] = func(a[i], b[i]);
    }
    out
}

/// A value together with its partial derivatives with respect to `DIM`
/// variables, i.e. `real + dual . E` where `E * E = 0`.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Dual<const DIM: usize> {
    real: f64,
    dual: [f64; DIM],
}

impl<const DIM: usize> Dual<DIM> {
    /// Create a dual number with value `val`. If `idx` is given, the number is
    /// the variable with that index, and its derivative with respect to
    /// itself is 1. Otherwise all the derivatives are zero.
    pub fn scalar(val: f64, idx: Option<usize>) -> Self {
        Dual {
            real: val,
            dual: match idx {
                Some(idx) if idx < DIM => {
                    let mut dual = [0.; DIM];
                    dual[idx] = 1.;
                    dual
                }
                _ => [0.; DIM],
            },
        }
    }

    pub fn real(&self) -> f64 {
        self.real
    }

    /// The partial derivatives.
    pub fn dual(&self) -> &[f64; DIM] {
        &self.dual
    }
}

impl<const DIM: usize> ValueType for Dual<DIM> {
    fn from_scalar(val: f64) -> Self {
        Dual::scalar(val, None)
    }

    fn unary_op(op: UnaryOp, val: Self) -> Self {
        // f(a + bE) = f(a) + f'(a) . bE
        let Dual { real, dual } = val;
        let (real, slope) = match op {
            Negate => (-real, -1.),
            Sqrt => {
                let root = f64::sqrt(real);
                (root, 0.5 / root)
            }
            Sin => (f64::sin(real), f64::cos(real)),
            Cos => (f64::cos(real), -f64::sin(real)),
            Log => (f64::ln(real), 1. / real),
            Exp => {
                let ex = f64::exp(real);
                (ex, ex)
            }
        };
        Dual {
            real,
            dual: dual.map(|d| slope * d),
        }
    }

    fn binary_op(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        // f(a + bE, c + dE) = f(a, c) + (df / da) . bE + (df / dc) . dE
        let (Dual { real: a, dual: b }, Dual { real: c, dual: d }) = (lhs, rhs);
        match op {
            Add => Dual {
                real: a + c,
                dual: map2(b, d, |b, d| b + d),
            },
            Subtract => Dual {
                real: a - c,
                dual: map2(b, d, |b, d| b - d),
            },
            Multiply => Dual {
                real: a * c,
                dual: map2(b, d, |b, d| b * c + a * d),
            },
            Divide => Dual {
                real: a / c,
                dual: map2(b, d, |b, d| (b * c - d * a) / (c * c)),
            },
            Pow => {
                let ac = Pow.apply(a, c);
                let slope = c * Pow.apply(a, c - 1.);
                Dual {
                    real: ac,
                    // The exponent term only exists where the exponent varies,
                    // which keeps negative bases with constant exponents finite.
                    dual: map2(b, d, |b, d| {
                        slope * b + if d != 0. { f64::ln(a) * ac * d } else { 0. }
                    }),
                }
            }
        }
    }
}

pub type DualEvaluator<const DIM: usize> = Evaluator<Dual<DIM>>;

/// Compute the Jacobian of `tree` in forward mode, at the point where the
/// symbols take the given `values`. The tree is evaluated once for every `DIM`
/// parameters. The roots of the tree are flattened in column major order, and
/// the Jacobian is returned in row major order, with one row per root and one
/// column per entry of `params`.
pub fn jacobian<const DIM: usize>(
    tree: &Tree,
    params: &[Label],
    values: &[(Label, f64)],
) -> Result<Vec<f64>, Error> {
    if params.is_empty() || DIM == 0 {
        return Err(Error::InvalidDimensions);
    }
    let nroots = tree.num_roots();
    let mut jac = vec![0.; nroots * params.len()];
    let mut eval = DualEvaluator::<DIM>::new(tree);
    for (ci, chunk) in params.chunks(DIM).enumerate() {
        for (label, value) in values {
            eval.set_value(
                *label,
                Dual::scalar(*value, chunk.iter().position(|p| p == label)),
            );
        }
        for (row, root) in eval.run()?.iter().enumerate() {
            for (k, partial) in root.dual().iter().take(chunk.len()).enumerate() {
                jac[row * params.len() + ci * DIM + k] = *partial;
            }
        }
    }
    tracing::trace!(
        roots = nroots,
        params = params.len(),
        passes = params.len().div_ceil(DIM),
        "forward mode jacobian"
    );
    Ok(jac)
}
