use crate::tree::{BinaryOp::*, Label, Node, Node::*, Tree, UnaryOp::*};
use std::fmt::{Display, Formatter, Result, Write};

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.index() {
            Some((row, col)) => write!(f, "{}[{}, {}]", self.name(), row, col),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Scalar trees are written as infix expressions. Matrices are written row by
/// row, as a list of lists: `[[a, b], [c, d]]`.
impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let (rows, cols) = self.dims();
        let roots = self.root_indices();
        if rows == 1 && cols == 1 {
            return write_node(f, roots.start, self.nodes());
        }
        f.write_char('[')?;
        for row in 0..rows {
            if row > 0 {
                f.write_str(", ")?;
            }
            f.write_char('[')?;
            for col in 0..cols {
                if col > 0 {
                    f.write_str(", ")?;
                }
                write_node(f, roots.start + col * rows + row, self.nodes())?;
            }
            f.write_char(']')?;
        }
        f.write_char(']')
    }
}

/// Binding strength of the node when written as infix. Higher binds tighter.
fn precedence(node: &Node) -> u8 {
    match node {
        Constant(val) if *val < 0. => 3,
        Binary(Add, ..) | Binary(Subtract, ..) => 1,
        Binary(Multiply, ..) | Binary(Divide, ..) => 2,
        Unary(Negate, _) => 3,
        Binary(Pow, ..) => 4,
        Constant(_) | Symbol(_) | Unary(..) => 5,
    }
}

/// Write the node at `index`, wrapped in parentheses if it binds weaker than
/// `min_prec`.
fn write_operand(f: &mut Formatter<'_>, index: usize, nodes: &[Node], min_prec: u8) -> Result {
    if precedence(&nodes[index]) < min_prec {
        f.write_char('(')?;
        write_node(f, index, nodes)?;
        f.write_char(')')
    } else {
        write_node(f, index, nodes)
    }
}

fn write_node(f: &mut Formatter<'_>, index: usize, nodes: &[Node]) -> Result {
    match &nodes[index] {
        Constant(val) => write!(f, "{val}"),
        Symbol(label) => write!(f, "{label}"),
        Unary(op, input) => {
            let name = match op {
                Negate => {
                    f.write_char('-')?;
                    return match nodes[*input] {
                        // Nested negations would read as a decrement.
                        Unary(Negate, _) => write_operand(f, *input, nodes, 4),
                        Constant(val) if val < 0. => write_operand(f, *input, nodes, 4),
                        _ => write_operand(f, *input, nodes, 2),
                    };
                }
                Sqrt => "sqrt",
                Sin => "sin",
                Cos => "cos",
                Log => "log",
                Exp => "exp",
            };
            write!(f, "{name}(")?;
            write_node(f, *input, nodes)?;
            f.write_char(')')
        }
        Binary(op, lhs, rhs) => match op {
            Add | Subtract => {
                write_operand(f, *lhs, nodes, 1)?;
                f.write_str(if *op == Add { " + " } else { " - " })?;
                write_operand(f, *rhs, nodes, 2)
            }
            Multiply => {
                write_operand(f, *lhs, nodes, 2)?;
                f.write_char('*')?;
                write_operand(f, *rhs, nodes, 4)
            }
            Divide => {
                write_operand(f, *lhs, nodes, 2)?;
                f.write_char('/')?;
                write_operand(f, *rhs, nodes, 4)
            }
            Pow => {
                write_operand(f, *lhs, nodes, 5)?;
                f.write_char('^')?;
                write_operand(f, *rhs, nodes, 5)
            }
        },
    }
}
