use crate::{
    equation::Equation,
    tree::{BinaryOp, BinaryOp::*, Label, Node, Node::*, Tree, UnaryOp::*},
};

impl Tree {
    /// Produce the latex expression for the tree.
    pub fn to_latex(&self) -> String {
        // We produce the latex for one root node at a time, and wrap them
        // inside appropriate vector / matrix brackets according to the
        // dimensions of the tree.
        let roots = self.roots();
        let (rows, cols) = self.dims();
        if rows == 1 && cols == 1 {
            to_latex(&roots[0], self.nodes())
        } else {
            let mut lx = "\\begin{bmatrix}".to_string();
            for row in 0..rows {
                for col in 0..cols {
                    lx.push('{');
                    lx.push_str(&to_latex(&roots[col * rows + row], self.nodes()));
                    lx.push('}');
                    if col < cols - 1 {
                        lx.push_str(" & ");
                    }
                }
                if row < rows - 1 {
                    lx.push_str(" \\\\ ");
                }
            }
            lx.push_str("\\end{bmatrix}");
            lx
        }
    }
}

impl Equation {
    /// Latex of the equation, with the name of the symbol on the left hand
    /// side, i.e. `g = ...`.
    pub fn to_latex(&self) -> String {
        format!("{} = {}", self.lhs().name(), self.rhs().to_latex())
    }
}

impl Label {
    /// Latex of the label. Matrix entries are written with their indices as
    /// subscripts, i.e. `A_{0, 1}`.
    pub fn to_latex(&self) -> String {
        match self.index() {
            Some((row, col)) => format!("{}_{{{row}, {col}}}", self.name()),
            None => self.name().to_string(),
        }
    }
}

/// Produce the latex expression for the subtree of a single node in a tree.
fn to_latex(node: &Node, nodes: &[Node]) -> String {
    match node {
        Constant(val) => val.to_string(),
        Symbol(label) => label.to_latex(),
        Unary(op, i) => {
            let inode = &nodes[*i];
            let ix = to_latex(inode, nodes);
            match op {
                Negate => format!("-{{{}}}", {
                    match inode {
                        // Special cases that require braces.
                        Binary(Add, ..) | Binary(Subtract, ..) => with_parens(ix),
                        Constant(_) | Symbol(_) | Unary(..) | Binary(..) => ix,
                    }
                }),
                Sqrt => format!("\\sqrt{{{ix}}}"),
                Sin => format!("\\sin\\left({{{ix}}}\\right)"),
                Cos => format!("\\cos\\left({{{ix}}}\\right)"),
                Log => format!("\\ln\\left({{{ix}}}\\right)"),
                Exp => format!("e^{{{}}}", {
                    match inode {
                        Constant(_) | Symbol(_) | Unary(..) => ix,
                        Binary(..) => with_parens(ix),
                    }
                }),
            }
        }
        Binary(op, lhs, rhs) => {
            let rnode = &nodes[*rhs];
            let lnode = &nodes[*lhs];
            let (lx, rx) = parens_binary(
                *op,
                lnode,
                rnode,
                to_latex(lnode, nodes),
                to_latex(rnode, nodes),
            );
            match op {
                Add => format!("{{{lx}}} + {{{rx}}}"),
                Subtract => format!("{{{lx}}} - {{{rx}}}"),
                Multiply => format!("{{{lx}}}\\cdot{{{rx}}}"),
                Divide => format!("\\dfrac{{{lx}}}{{{rx}}}"),
                Pow => format!("{{{lx}}}^{{{rx}}}"),
            }
        }
    }
}

/// Look at the two operands (`lnode` and `rnode`) of a binary op, and decide if
/// the latex strings of the operands (`lx` and `rx` respectively) should be
/// wrapped in parentheses. Wrap `lx` and `rx` as necessary and return them as a
/// tuple.
fn parens_binary(
    op: BinaryOp,
    lnode: &Node,
    rnode: &Node,
    lx: String,
    rx: String,
) -> (String, String) {
    match op {
        Add => (lx, parens_add_sub(rnode, rx)),
        Subtract => (lx, parens_add_sub(rnode, rx)),
        Multiply => (parens_mul(lnode, lx), parens_mul(rnode, rx)),
        Divide => (parens_div(lnode, lx), parens_div(rnode, rx)),
        Pow => (
            {
                match lnode {
                    Unary(..) | Binary(..) => with_parens(lx),
                    Constant(_) if lx.len() > 1 => with_parens(lx),
                    Constant(_) | Symbol(_) => lx,
                }
            },
            {
                match rnode {
                    Binary(Add, ..) | Binary(Subtract, ..) => with_parens(rx),
                    Constant(_) | Symbol(_) | Unary(_, _) | Binary(_, _, _) => rx,
                }
            },
        ),
    }
}

/// Given `node` that is an operand of a division, either a numerator or a
/// denominator, wrap its `latex` string in parentheses if necessary.
fn parens_div(node: &Node, latex: String) -> String {
    match node {
        Binary(Divide, ..) => with_parens(latex),
        _ => latex,
    }
}

/// Given `node` that is an operand of a multiplication and wrap its `latex`
/// string in parentheses if necessary.
fn parens_mul(node: &Node, latex: String) -> String {
    match node {
        Binary(Add, ..) | Binary(Subtract, ..) | Unary(Negate, ..) => with_parens(latex),
        Constant(val) if *val < 0. => with_parens(latex),
        Binary(..) | Unary(..) | Symbol(_) | Constant(_) => latex,
    }
}

/// Given a `node` that is the right operand of an addition or subtraction, wrap
/// its `latex` string in parentheses if necessary. The left operand never needs
/// them.
fn parens_add_sub(node: &Node, latex: String) -> String {
    match node {
        Binary(Add, ..) | Binary(Subtract, ..) | Unary(Negate, _) => with_parens(latex),
        Constant(val) if *val < 0. => with_parens(latex),
        Binary(..) | Constant(_) | Symbol(_) | Unary(..) => latex,
    }
}

fn with_parens(latex: String) -> String {
    format!("\\left({latex}\\right)")
}

#[cfg(test)]
mod test {
    use crate::{Equation, MatrixSymbol, MaybeTree, deftree};

    fn check(cases: Vec<(MaybeTree, &str)>) {
        for (tree, expected) in cases {
            assert_eq!(tree.unwrap().to_latex(), expected);
        }
    }

    #[test]
    fn t_unary() {
        check(vec![
            (deftree!(- x), "-{x}"),
            (deftree!(- (sqrt 2.)), "-{\\sqrt{2}}"),
            (deftree!(- (+ x y)), "-{\\left({x} + {y}\\right)}"),
            (deftree!(- (* x y)), "-{{x}\\cdot{y}}"),
            (deftree!(sqrt (- x)), "\\sqrt{-{x}}"),
            (deftree!(sqrt (/ x y)), "\\sqrt{\\dfrac{x}{y}}"),
            (deftree!(sin (* 2 x)), "\\sin\\left({{2}\\cdot{x}}\\right)"),
            (deftree!(log (pow x 2)), "\\ln\\left({{x}^{2}}\\right)"),
            (deftree!(exp (pow x 2)), "e^{\\left({x}^{2}\\right)}"),
        ]);
    }

    #[test]
    fn t_binary() {
        check(vec![
            (
                deftree!(+ (* (* 2 x) y) (pow x 2)),
                "{{{2}\\cdot{x}}\\cdot{y}} + {{x}^{2}}",
            ),
            (deftree!(- x (- y z)), "{x} - {\\left({y} - {z}\\right)}"),
            (deftree!(+ x (const -2.)), "{x} + {\\left(-2\\right)}"),
            (
                deftree!(* (+ x y) (- z)),
                "{\\left({x} + {y}\\right)}\\cdot{\\left(-{z}\\right)}",
            ),
            (deftree!(/ (/ x y) z), "\\dfrac{\\left(\\dfrac{x}{y}\\right)}{z}"),
            (
                deftree!(pow (+ x 1) (- y 1)),
                "{\\left({x} + {1}\\right)}^{\\left({y} - {1}\\right)}",
            ),
        ]);
    }

    #[test]
    fn t_matrix_entries() {
        check(vec![(
            deftree!(+ (* 2 (* (entry A 0 0) (entry x 0 0))) (* (entry A 0 1) (entry x 1 0))),
            "{{2}\\cdot{{A_{0, 0}}\\cdot{x_{0, 0}}}} + {{A_{0, 1}}\\cdot{x_{1, 0}}}",
        )]);
    }

    #[test]
    fn t_shapes() {
        let abcd = || deftree!(concat a b c d);
        check(vec![
            (
                abcd(),
                "\\begin{bmatrix}{a} \\\\ {b} \\\\ {c} \\\\ {d}\\end{bmatrix}",
            ),
            (
                abcd().and_then(|t| t.reshape(1, 4)),
                "\\begin{bmatrix}{a} & {b} & {c} & {d}\\end{bmatrix}",
            ),
            // Column major roots, laid out by rows.
            (
                abcd().and_then(|t| t.reshape(2, 2)),
                "\\begin{bmatrix}{a} & {c} \\\\ {b} & {d}\\end{bmatrix}",
            ),
        ]);
        let x = MatrixSymbol::new('x', 2, 1).unwrap();
        assert_eq!(
            x.tree().to_latex(),
            "\\begin{bmatrix}{x_{0, 0}} \\\\ {x_{1, 0}}\\end{bmatrix}"
        );
    }

    #[test]
    fn t_equation() {
        let g = MatrixSymbol::new('g', 2, 1).unwrap();
        let eq = Equation::new(g, deftree!(concat (* 2 x) y).unwrap()).unwrap();
        assert_eq!(
            eq.to_latex(),
            "g = \\begin{bmatrix}{{2}\\cdot{x}} \\\\ {y}\\end{bmatrix}"
        );
    }
}
