use crate::{dedup::Deduplicater, error::Error, fold::fold, prune::Pruner};
use std::ops::Range;

/// Identifies a symbol in a tree.
///
/// A scalar symbol is identified by a single character. An entry of a matrix
/// symbol additionally carries its (row, column) index inside the
/// matrix. Labels are ordered by name first, and then by index. This order is
/// used when sorting terms during simplification, so it directly affects how
/// simplified expressions are printed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    name: char,
    index: Option<(usize, usize)>,
}

impl Label {
    /// Label of a scalar symbol.
    pub const fn scalar(name: char) -> Label {
        Label { name, index: None }
    }

    /// Label of the entry at (`row`, `col`) of the matrix symbol `name`.
    pub const fn entry(name: char, row: usize, col: usize) -> Label {
        Label {
            name,
            index: Some((row, col)),
        }
    }

    pub fn name(&self) -> char {
        self.name
    }

    /// The (row, column) index if this is the label of a matrix entry.
    pub fn index(&self) -> Option<(usize, usize)> {
        self.index
    }
}

/// Represents an operation with one input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Sqrt,
    Sin,
    Cos,
    Log,
    Exp,
}

/// Represents an operation with two inputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Pow,
}

impl BinaryOp {
    /// Check if the binary op is commutative.
    pub fn is_commutative(&self) -> bool {
        use BinaryOp::*;
        match self {
            Add => true,
            Subtract => false,
            Multiply => true,
            Divide => false,
            Pow => false,
        }
    }
}

use {BinaryOp::*, UnaryOp::*};

/// Represents a node in an abstract syntax `Tree`.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Node {
    Constant(f64),
    Symbol(Label),
    Unary(UnaryOp, usize),
    Binary(BinaryOp, usize, usize),
}

use Node::*;

pub(crate) fn is_topological_order(nodes: &[Node]) -> bool {
    nodes.iter().enumerate().all(|(i, node)| match node {
        Constant(_) | Symbol(_) => true,
        Unary(_, input) => *input < i,
        Binary(_, l, r) => *l < i && *r < i,
    })
}

/// Append `src` to `dst`, offsetting the inputs of the appended nodes so they
/// keep pointing at the nodes they pointed to in `src`. Returns the offset,
/// i.e. the index in `dst` of the first appended node.
pub(crate) fn extend_nodes_from_slice(dst: &mut Vec<Node>, src: &[Node]) -> usize {
    let offset = dst.len();
    dst.extend(src.iter().map(|node| match node {
        Constant(value) => Constant(*value),
        Symbol(label) => Symbol(*label),
        Unary(op, input) => Unary(*op, *input + offset),
        Binary(op, lhs, rhs) => Binary(*op, *lhs + offset, *rhs + offset),
    }));
    offset
}

/// Represents an abstract syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    dims: (usize, usize),
}

pub type MaybeTree = Result<Tree, Error>;

const fn matsize(dims: (usize, usize)) -> usize {
    dims.0 * dims.1
}

impl Tree {
    pub fn from_nodes(nodes: Vec<Node>, dims: (usize, usize)) -> MaybeTree {
        let t = Tree { nodes, dims };
        return t.validated();
    }

    /// Create a tree representing a constant value.
    pub fn constant(val: f64) -> Tree {
        Tree {
            nodes: vec![Constant(val)],
            dims: (1, 1),
        }
    }

    /// Create a tree representing a symbol with the given `label`.
    pub fn symbol(label: Label) -> Tree {
        Tree {
            nodes: vec![Symbol(label)],
            dims: (1, 1),
        }
    }

    /// Fold the constants, deduplicate subtrees, prune unused subtrees and
    /// return a topologically sorted compacted equivalent to this tree.
    pub fn compacted(self) -> MaybeTree {
        let roots = self.root_indices();
        let (mut nodes, dims) = self.take();
        fold(&mut nodes)?;
        let mut pruner = Pruner::new();
        let roots = pruner.run_from_range(&mut nodes, roots);
        let mut deduper = Deduplicater::new();
        // We don't need to check because we just ran the pruner on these
        // nodes, which sorts them topologically.
        deduper.run(&mut nodes)?;
        pruner.run_from_range(&mut nodes, roots);
        return Tree::from_nodes(nodes, dims);
    }

    /// Prunes the tree and topologically sorts the nodes.
    pub fn prune(self, pruner: &mut Pruner) -> MaybeTree {
        let roots = self.root_indices();
        let (mut nodes, dims) = self.take();
        pruner.run_from_range(&mut nodes, roots);
        return Tree::from_nodes(nodes, dims);
    }

    /// Concatenate the two trees into a vector. If the input trees are
    /// matrices, they are flattened and then concatenated into a flat
    /// vector. If the caller doesn't want a vector, they can use the `reshape`
    /// function to reshape the tree after concatenation.
    pub fn concat(lhs: MaybeTree, rhs: MaybeTree) -> MaybeTree {
        let mut lhs = lhs?;
        let rhs = rhs?;
        let (llen, lsize) = (lhs.len(), lhs.num_roots());
        let (rlen, rsize) = (rhs.len(), rhs.num_roots());
        // The roots of `lhs` are ignored when computing the offset, because
        // they are rotated to the end of the buffer right after.
        let offset = llen - lsize;
        lhs.nodes.extend(rhs.nodes.iter().map(|n| match n {
            Constant(_) | Symbol(_) => *n,
            Unary(op, input) => Unary(*op, input + offset),
            Binary(op, l, r) => Binary(*op, l + offset, r + offset),
        }));
        lhs.nodes[(llen - lsize)..(llen + rlen - rsize)].rotate_left(lsize);
        lhs.dims = (lsize + rsize, 1);
        return Ok(lhs);
    }

    /// The number of nodes in this tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of roots in this tree.
    pub fn num_roots(&self) -> usize {
        matsize(self.dims)
    }

    /// Get the dimensions of this tree.
    pub fn dims(&self) -> (usize, usize) {
        self.dims
    }

    /// Change the shape of this tree. If the new shape doesn't correspond to
    /// the same number of elements, an error is returned.
    pub fn reshape(self, rows: usize, cols: usize) -> MaybeTree {
        if matsize((rows, cols)) == self.num_roots() {
            Ok(Tree {
                nodes: self.nodes,
                dims: (rows, cols),
            })
        } else {
            Err(Error::DimensionMismatch(self.dims, (rows, cols)))
        }
    }

    /// Get a reference to the root nodes of the tree. These are the last nodes
    /// of the tree, in column major order.
    pub fn roots(&self) -> &[Node] {
        &self.nodes[(self.nodes.len() - self.num_roots())..]
    }

    /// Indices of the root nodes of the tree. These nodes will be at the end of
    /// the tree.
    pub fn root_indices(&self) -> Range<usize> {
        (self.len() - self.num_roots())..self.len()
    }

    /// Get a reference to the node at `index`.
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Reference to the nodes of this tree.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The nodes and the dimensions of the tree. This drops the tree and gives
    /// the ownership of the data to the caller.
    ///
    /// This is meant to be used by algorithms that want to perform direct
    /// surgery on the nodes of the tree, rearrange them etc. Our goal is to
    /// make sure it is impossible for an invalid tree to ever exist. For this
    /// reason, these algos are expected to take full owner ship of the data in
    /// the tree, do what they want to do and construct a new tree from the
    /// modified data. When they construct the new tree, we perform checks to
    /// make sure the tree is valid. Once constructed, the tree must remain
    /// immutable, unless someone calls this function to take ownership.
    pub fn take(self) -> (Vec<Node>, (usize, usize)) {
        (self.nodes, self.dims)
    }

    /// Get a unique list of all symbols in this tree. The symbols will appear
    /// in the same order as they first appear in the tree.
    pub fn symbols(&self) -> Vec<Label> {
        let symbols: Vec<_> = self
            .nodes
            .iter()
            .filter_map(|n| {
                if let Symbol(label) = n {
                    Some(*label)
                } else {
                    None
                }
            })
            .collect();
        let mut indices: Vec<usize> = (0..symbols.len()).collect();
        indices.sort_by(|a, b| symbols[*a].cmp(&symbols[*b]));
        indices.dedup_by(|a, b| symbols[*a] == symbols[*b]);
        indices.sort();
        return indices.iter().map(|i| symbols[*i]).collect();
    }

    /// Check the tree for errors and return a Result that contains the tree if
    /// no errors were found, or the first error encountered with the tree.
    fn validated(self) -> MaybeTree {
        /* We make sure the inputs of every node appear before that node
         * itself. This is important when evaluating the tree, but also ensures
         * there are no cycles in the tree.
         */
        if self.nodes.is_empty() {
            return Err(Error::EmptyTree);
        }
        if self.num_roots() == 0 || self.num_roots() > self.nodes.len() {
            return Err(Error::InvalidRoots);
        }
        let roots = self.root_indices();
        if self
            .nodes
            .iter()
            .any(|node| matches!(node, Constant(val) if val.is_nan()))
        {
            return Err(Error::ContainsNaN);
        }
        if !is_topological_order(&self.nodes) {
            return Err(Error::WrongNodeOrder);
        }
        // Check if any nodes depend on roots as their inputs. This is not allowed.
        if self.nodes.iter().any(|node| match node {
            Constant(_) | Symbol(_) => false,
            Unary(_, input) => roots.contains(input),
            Binary(_, l, r) => roots.contains(l) || roots.contains(r),
        }) {
            return Err(Error::DependentRootNodes);
        }
        return Ok(self);
    }

    fn unary_op(mut self, op: UnaryOp) -> MaybeTree {
        for root in self.root_indices() {
            self.nodes.push(Unary(op, root));
        }
        return Ok(self);
    }

    fn binary_op(mut self, other: Tree, op: BinaryOp) -> MaybeTree {
        let nroots = self.num_roots();
        let other_nroots = other.num_roots();
        if nroots != 1 && other_nroots != 1 && self.dims != other.dims {
            return Err(Error::DimensionMismatch(self.dims, other.dims));
        }
        self.nodes
            .reserve(other.nodes.len() + usize::max(nroots, other_nroots));
        let offset = extend_nodes_from_slice(&mut self.nodes, &other.nodes);
        if nroots == 1 {
            let root = offset - 1;
            for r in other.root_indices() {
                self.nodes.push(Binary(op, root, r + offset));
            }
            self.dims = other.dims;
        } else if other_nroots == 1 {
            let root = self.len() - 1;
            for r in (offset - nroots)..offset {
                self.nodes.push(Binary(op, r, root));
            }
        } else {
            for (l, r) in ((offset - nroots)..offset).zip(other.root_indices()) {
                self.nodes.push(Binary(op, l, r + offset));
            }
        }
        return Ok(self);
    }
}

macro_rules! unary_func {
    ($name:ident, $op:ident) => {
        pub fn $name(tree: MaybeTree) -> MaybeTree {
            tree?.unary_op($op)
        }
    };
}

unary_func!(negate, Negate);
unary_func!(sqrt, Sqrt);
unary_func!(sin, Sin);
unary_func!(cos, Cos);
unary_func!(log, Log);
unary_func!(exp, Exp);

macro_rules! binary_func {
    ($name:ident, $op:ident) => {
        pub fn $name(lhs: MaybeTree, rhs: MaybeTree) -> MaybeTree {
            lhs?.binary_op(rhs?, $op)
        }
    };
}

binary_func!(add, Add);
binary_func!(sub, Subtract);
binary_func!(mul, Multiply);
binary_func!(div, Divide);
binary_func!(pow, Pow);

pub fn reshape(tree: MaybeTree, rows: usize, cols: usize) -> MaybeTree {
    tree?.reshape(rows, cols)
}

/// A named symbolic matrix with no values bound to its entries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MatrixSymbol {
    name: char,
    rows: usize,
    cols: usize,
}

impl MatrixSymbol {
    pub fn new(name: char, rows: usize, cols: usize) -> Result<MatrixSymbol, Error> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions);
        }
        Ok(MatrixSymbol { name, rows, cols })
    }

    pub fn name(&self) -> char {
        self.name
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of entries in this matrix.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Label of the entry at (`row`, `col`).
    pub fn label(&self, row: usize, col: usize) -> Result<Label, Error> {
        if row < self.rows && col < self.cols {
            Ok(Label::entry(self.name, row, col))
        } else {
            Err(Error::IndexOutOfBounds(row, col))
        }
    }

    /// Check if `label` refers to an entry of this matrix.
    pub fn contains(&self, label: &Label) -> bool {
        self.flat_index(label).is_some()
    }

    /// Row major index of the entry referred to by `label`, if the label refers
    /// to an entry of this matrix.
    pub fn flat_index(&self, label: &Label) -> Option<usize> {
        match label.index() {
            Some((r, c)) if label.name() == self.name && r < self.rows && c < self.cols => {
                Some(r * self.cols + c)
            }
            _ => None,
        }
    }

    /// A tree with the same dimensions as this matrix, whose roots are the
    /// symbols of the entries.
    pub fn tree(&self) -> Tree {
        let mut nodes = Vec::with_capacity(self.len());
        // Roots are stored in column major order.
        for c in 0..self.cols {
            for r in 0..self.rows {
                nodes.push(Symbol(Label::entry(self.name, r, c)));
            }
        }
        Tree {
            nodes,
            dims: (self.rows, self.cols),
        }
    }
}

impl From<char> for Label {
    fn from(name: char) -> Self {
        Label::scalar(name)
    }
}

impl From<f64> for Tree {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<i32> for Tree {
    fn from(value: i32) -> Self {
        Self::constant(value as f64)
    }
}

impl From<char> for Tree {
    fn from(c: char) -> Self {
        return Self::symbol(Label::scalar(c));
    }
}

impl From<Label> for Tree {
    fn from(label: Label) -> Self {
        return Self::symbol(label);
    }
}

impl From<&MatrixSymbol> for Tree {
    fn from(mat: &MatrixSymbol) -> Self {
        mat.tree()
    }
}
