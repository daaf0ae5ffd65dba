pub mod codegen;
pub mod derivative;
pub mod dual;
pub mod equation;
pub mod error;
pub mod eval;
pub mod matrix_ops;
pub mod polynomial;
pub mod prune;
pub mod quadform;
pub mod simplify;
pub mod tree;

mod compile;
mod dedup;
mod display;
mod fold;
mod latex;
mod macros;

#[cfg(test)]
mod test;

pub use codegen::{CodeGen, Dialect, Routine, RoutineExpr, make_routine};
pub use equation::Equation;
pub use error::Error;
pub use matrix_ops::{dot_product, matmul, transpose};
pub use quadform::{GradientProblem, GradientReport};
pub use simplify::simplify;
pub use tree::{
    BinaryOp, Label, MatrixSymbol, MaybeTree, Node, Tree, UnaryOp, add, cos, div, exp, log, mul,
    negate, pow, reshape, sin, sqrt, sub,
};
