use crate::{
    compile::{Instructions, compile},
    error::Error,
    tree::{
        BinaryOp::{self, *},
        Label,
        Node::*,
        Node, Tree,
        UnaryOp::{self, *},
    },
};

impl UnaryOp {
    /// Compute the result of the operation on `value`.
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Negate => -value,
            Sqrt => f64::sqrt(value),
            Sin => f64::sin(value),
            Cos => f64::cos(value),
            Log => f64::ln(value),
            Exp => f64::exp(value),
        }
    }
}

impl BinaryOp {
    /// Compute the result of the operation on `lhs` and `rhs`.
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Add => lhs + rhs,
            Subtract => lhs - rhs,
            Multiply => lhs * rhs,
            Divide => lhs / rhs,
            Pow => match integer_exponent(rhs) {
                Some(exp) => f64::powi(lhs, exp),
                None => f64::powf(lhs, rhs),
            },
        }
    }
}

/// The exponent as an `i32` if it is a whole number small enough to fit.
pub(crate) fn integer_exponent(value: f64) -> Option<i32> {
    if value.fract() == 0. && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

/// Values an `Evaluator` can compute with. Constants in the tree are converted
/// with `from_scalar`, and the ops of the tree are applied with `unary_op` and
/// `binary_op`.
pub trait ValueType: Copy {
    fn from_scalar(val: f64) -> Self;
    fn unary_op(op: UnaryOp, val: Self) -> Self;
    fn binary_op(op: BinaryOp, lhs: Self, rhs: Self) -> Self;
}

impl ValueType for f64 {
    fn from_scalar(val: f64) -> Self {
        val
    }

    fn unary_op(op: UnaryOp, val: Self) -> Self {
        op.apply(val)
    }

    fn binary_op(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        op.apply(lhs, rhs)
    }
}

/// This can be used to compute the value(s) of the tree.
pub struct Evaluator<T: ValueType> {
    ops: Vec<(Node, usize)>,
    regs: Vec<T>,
    vars: Vec<(Label, T)>,
    root_regs: Vec<usize>,
    outputs: Vec<T>,
}

impl<T: ValueType> Evaluator<T> {
    /// Create a new evaluator for `tree`.
    pub fn new(tree: &Tree) -> Evaluator<T> {
        let Instructions {
            ops,
            num_regs,
            out_regs: root_regs,
        } = compile(tree);
        let num_roots = root_regs.len();
        return Evaluator {
            ops,
            regs: vec![T::from_scalar(0.); num_regs],
            vars: Vec::new(),
            root_regs,
            outputs: Vec::with_capacity(num_roots),
        };
    }

    /// Get the number of registers used by this evaluator. This is not the same
    /// as the number of nodes in the tree, because registers are allocated as
    /// needed, and reused where possible.
    pub fn num_regs(&self) -> usize {
        return self.regs.len();
    }

    /// Set the value of the symbol with the given label. You'd do this for all
    /// the inputs before running the evaluator.
    pub fn set_value<L: Into<Label>>(&mut self, label: L, value: T) {
        let label = label.into();
        for (l, v) in self.vars.iter_mut() {
            if *l == label {
                *v = value;
                return;
            }
        }
        self.vars.push((label, value));
    }

    /// Run the evaluator and return the values of the roots, in column major
    /// order. `VariableNotFound(label)` error means the variable matching
    /// `label` hasn't been assigned a value using `set_value`.
    pub fn run(&mut self) -> Result<&[T], Error> {
        for (node, out) in &self.ops {
            self.regs[*out] = match node {
                Constant(val) => T::from_scalar(*val),
                Symbol(label) => match self.vars.iter().find(|(l, _v)| *l == *label) {
                    Some((_l, v)) => *v,
                    None => return Err(Error::VariableNotFound(*label)),
                },
                Unary(op, input) => T::unary_op(*op, self.regs[*input]),
                Binary(op, lhs, rhs) => T::binary_op(*op, self.regs[*lhs], self.regs[*rhs]),
            };
        }
        self.outputs.clear();
        self.outputs
            .extend(self.root_regs.iter().map(|r| self.regs[*r]));
        return Ok(&self.outputs);
    }
}

pub type ValueEvaluator = Evaluator<f64>;
