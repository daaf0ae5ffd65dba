use crate::{
    error::Error,
    tree::{BinaryOp, Label, MaybeTree, Node, Node::*, Tree, UnaryOp, extend_nodes_from_slice},
};
use std::collections::HashMap;

/// A node with its inputs replaced by the representatives of their
/// equivalence classes. The inputs of commutative ops are sorted, so `x + y`
/// and `y + x` have the same key.
#[derive(PartialEq, Eq, Hash)]
enum Key {
    Constant(u64),
    Symbol(Label),
    Unary(UnaryOp, usize),
    Binary(BinaryOp, usize, usize),
}

/// Helper struct for deduplicating common subtrees.
///
/// Deduplication requires allocations. Those buffers are owned by this struct,
/// so reusing the same instance of `Deduplicater` avoids unnecessary
/// allocations.
#[derive(Default)]
pub struct Deduplicater {
    indices: Vec<usize>,
    classes: HashMap<Key, usize>,
}

impl Deduplicater {
    pub fn new() -> Self {
        Deduplicater {
            indices: Vec::new(),
            classes: HashMap::new(),
        }
    }

    /// Find the first node equivalent to each node of `nodes`.
    ///
    /// Two nodes are equivalent if they represent the same expression, for
    /// example two constants holding the same value, or two nodes with the
    /// same op and equivalent inputs. Inputs of commutative ops are compared
    /// irrespective of their order.
    fn classify(&mut self, nodes: &[Node]) -> Result<&[usize], Error> {
        self.indices.clear();
        self.classes.clear();
        for (index, node) in nodes.iter().enumerate() {
            let key = match *node {
                // Zero and negative zero compare equal.
                Constant(val) if val == 0. => Key::Constant(0),
                Constant(val) => Key::Constant(val.to_bits()),
                Symbol(label) => Key::Symbol(label),
                Unary(op, input) => {
                    if input >= index {
                        return Err(Error::WrongNodeOrder);
                    }
                    Key::Unary(op, self.indices[input])
                }
                Binary(op, lhs, rhs) => {
                    if lhs >= index || rhs >= index {
                        return Err(Error::WrongNodeOrder);
                    }
                    let (lhs, rhs) = (self.indices[lhs], self.indices[rhs]);
                    if op.is_commutative() && rhs < lhs {
                        Key::Binary(op, rhs, lhs)
                    } else {
                        Key::Binary(op, lhs, rhs)
                    }
                }
            };
            let first = *self.classes.entry(key).or_insert(index);
            self.indices.push(first);
        }
        Ok(&self.indices)
    }

    /// Deduplicate `nodes`, which must be topologically sorted.
    ///
    /// Any node whose input is a repeat of an earlier subtree is rewired to the
    /// earlier subtree. That leaves the repeated subtrees disconnected, so the
    /// nodes should be pruned afterwards.
    pub fn run(&mut self, nodes: &mut [Node]) -> Result<(), Error> {
        let indices = self.classify(nodes)?;
        for node in nodes.iter_mut() {
            match node {
                Constant(_) | Symbol(_) => {}
                Unary(_, input) => *input = indices[*input],
                Binary(_, lhs, rhs) => {
                    *lhs = indices[*lhs];
                    *rhs = indices[*rhs];
                }
            }
        }
        Ok(())
    }

    /// Check if the subtrees at `left` and `right` are equivalent.
    pub fn equivalent(
        &mut self,
        left: usize,
        right: usize,
        nodes: &[Node],
    ) -> Result<bool, Error> {
        let indices = self.classify(nodes)?;
        Ok(indices[left] == indices[right])
    }
}

impl Tree {
    /// Deduplicate the common subtrees in this tree.
    pub fn deduplicate(self, dedup: &mut Deduplicater) -> MaybeTree {
        let (mut nodes, dims) = self.take();
        dedup.run(&mut nodes)?;
        Tree::from_nodes(nodes, dims)
    }

    /// Check if this tree is structurally equivalent to `other`, treating the
    /// inputs of commutative ops as unordered.
    pub fn equivalent(&self, other: &Tree) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        let mut nodes = self.nodes().to_vec();
        let offset = extend_nodes_from_slice(&mut nodes, other.nodes());
        let mut dedup = Deduplicater::new();
        match dedup.classify(&nodes) {
            Ok(indices) => self
                .root_indices()
                .zip(other.root_indices())
                .all(|(l, r)| indices[l] == indices[r + offset]),
            Err(_) => false,
        }
    }
}
