use crate::tree::Label;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Nodes are not in a valid topological order.
    #[error("nodes are not in topological order")]
    WrongNodeOrder,
    /// A constant node contains NaN.
    #[error("tree contains a NaN constant")]
    ContainsNaN,
    /// Tree conains no nodes.
    #[error("tree is empty")]
    EmptyTree,
    /// Root nodes depend on each other. They must be isolated from each other
    /// in a valid tree.
    #[error("root nodes depend on other root nodes")]
    DependentRootNodes,
    /// The roots of the tree are invalid. They must be at the end of the tree.
    #[error("roots must be at the end of the tree")]
    InvalidRoots,
    /// A mismatch between two dimensions, for example, during a reshape operation.
    #[error("dimension mismatch: {0:?} and {1:?}")]
    DimensionMismatch((usize, usize), (usize, usize)),
    #[error("invalid dimensions")]
    InvalidDimensions,
    /// Index out of bounds,
    #[error("index ({0}, {1}) is out of bounds")]
    IndexOutOfBounds(usize, usize),

    // Evaluation related errors
    /// A symbol was not assigned a value before evaluating.
    #[error("no value assigned to {0}")]
    VariableNotFound(Label),

    // Derivatives.
    #[error("cannot compute symbolic derivative")]
    CannotComputeSymbolicDerivative,
    /// Derivatives can only be taken with respect to symbols.
    #[error("cannot differentiate with respect to an expression that is not a symbol")]
    NotASymbol,

    // Code generation.
    /// A symbol used by a routine does not belong to any of its arguments.
    #[error("symbol {0} is not part of the argument sequence")]
    MissingArgument(Label),
    #[error("argument '{0}' appears more than once")]
    DuplicateArgument(char),
    /// The output of an equation is not in the argument sequence.
    #[error("output '{0}' is not part of the argument sequence")]
    UnknownOutput(char),
    #[error("output argument '{0}' is also read as an input")]
    OutputUsedAsInput(char),
    /// A routine can return at most one scalar value.
    #[error("a routine can return at most one scalar expression")]
    InvalidReturnValue,
    #[error("a routine needs at least one expression")]
    EmptyRoutine,
    #[error("failed to write generated code")]
    Format(#[from] std::fmt::Error),
}
