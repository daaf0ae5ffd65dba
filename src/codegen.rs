//! Source code generation for routines that evaluate trees.
//!
//! A `Routine` bundles an optional scalar return value with equations whose
//! left hand sides are output arguments. `CodeGen` writes the routines as Rust
//! or C functions. Every matrix argument is passed as a flat array with its
//! entries in row major order. Subexpressions shared by the outputs are
//! computed once and stored in temporaries.

use crate::{
    equation::Equation,
    error::Error,
    tree::{BinaryOp::*, Label, MatrixSymbol, Node, Node::*, Tree, UnaryOp::*},
};
use std::fmt::Write;

/// Target language of the generated code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Dialect {
    Rust,
    C,
}

/// Whether a routine reads or writes an argument.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

/// Argument of a routine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Argument {
    symbol: MatrixSymbol,
    direction: Direction,
}

impl Argument {
    pub fn symbol(&self) -> &MatrixSymbol {
        &self.symbol
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// An expression computed by a routine.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutineExpr {
    /// Scalar value returned by the routine.
    Return(Tree),
    /// Values written into the output argument named by the left hand side.
    Assign(Equation),
}

/// A function to be generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    name: String,
    arguments: Vec<Argument>,
    result: Option<Tree>,
    outputs: Vec<Equation>,
}

impl Routine {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments in the order they appear in the signature.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// The returned scalar expression, if any.
    pub fn result(&self) -> Option<&Tree> {
        self.result.as_ref()
    }

    pub fn outputs(&self) -> &[Equation] {
        &self.outputs
    }
}

/// Create a routine called `name` that computes `exprs`. The arguments appear
/// in the signature in the order of `argument_sequence`. Arguments that are the
/// left hand side of an equation become outputs. Every symbol used by the
/// expressions must be an entry of one of the input arguments.
pub fn make_routine(
    name: &str,
    exprs: Vec<RoutineExpr>,
    argument_sequence: &[MatrixSymbol],
) -> Result<Routine, Error> {
    for (i, arg) in argument_sequence.iter().enumerate() {
        if argument_sequence[..i]
            .iter()
            .any(|prev| prev.name() == arg.name())
        {
            return Err(Error::DuplicateArgument(arg.name()));
        }
    }
    let mut result: Option<Tree> = None;
    let mut outputs: Vec<Equation> = Vec::new();
    for expr in exprs {
        match expr {
            RoutineExpr::Return(tree) => {
                if result.is_some() || tree.dims() != (1, 1) {
                    return Err(Error::InvalidReturnValue);
                }
                result = Some(tree);
            }
            RoutineExpr::Assign(eq) => {
                if !argument_sequence.contains(eq.lhs()) {
                    return Err(Error::UnknownOutput(eq.lhs().name()));
                }
                if outputs.iter().any(|other| other.lhs() == eq.lhs()) {
                    return Err(Error::DuplicateArgument(eq.lhs().name()));
                }
                outputs.push(eq);
            }
        }
    }
    if result.is_none() && outputs.is_empty() {
        return Err(Error::EmptyRoutine);
    }
    let arguments: Vec<Argument> = argument_sequence
        .iter()
        .map(|symbol| Argument {
            symbol: *symbol,
            direction: if outputs.iter().any(|eq| eq.lhs() == symbol) {
                Direction::Output
            } else {
                Direction::Input
            },
        })
        .collect();
    let used = result
        .iter()
        .chain(outputs.iter().map(|eq| eq.rhs()))
        .flat_map(|tree| tree.symbols());
    for label in used {
        match arguments.iter().find(|arg| arg.symbol.contains(&label)) {
            Some(arg) if arg.direction == Direction::Output => {
                return Err(Error::OutputUsedAsInput(arg.symbol.name()));
            }
            Some(_) => {}
            None => return Err(Error::MissingArgument(label)),
        }
    }
    tracing::debug!(name, arguments = arguments.len(), "created routine");
    Ok(Routine {
        name: name.to_string(),
        arguments,
        result,
        outputs,
    })
}

/// Writes routines as source code in a given dialect.
pub struct CodeGen {
    dialect: Dialect,
}

impl CodeGen {
    pub fn new(dialect: Dialect) -> CodeGen {
        CodeGen { dialect }
    }

    /// Write the source file containing `routines` to `out`. If `header` is
    /// true, the file starts with a comment naming the project `prefix`. If
    /// `empty` is true, blank lines separate the sections of the file.
    pub fn dump<W: Write>(
        &self,
        routines: &[Routine],
        out: &mut W,
        prefix: &str,
        header: bool,
        empty: bool,
    ) -> Result<(), Error> {
        if header {
            self.write_banner(out, prefix)?;
            if empty {
                writeln!(out)?;
            }
        }
        if self.dialect == Dialect::C {
            writeln!(out, "#include \"{prefix}.h\"")?;
            writeln!(out, "#include <math.h>")?;
            if empty {
                writeln!(out)?;
            }
        }
        for (i, routine) in routines.iter().enumerate() {
            if i > 0 && empty {
                writeln!(out)?;
            }
            self.write_routine(out, routine, empty)?;
        }
        Ok(())
    }

    /// Write the C header declaring the prototypes of `routines`, guarded
    /// against multiple inclusion. Rust has no header files, so nothing is
    /// written for the Rust dialect.
    pub fn dump_header<W: Write>(
        &self,
        routines: &[Routine],
        out: &mut W,
        prefix: &str,
        header: bool,
        empty: bool,
    ) -> Result<(), Error> {
        if self.dialect == Dialect::Rust {
            return Ok(());
        }
        if header {
            self.write_banner(out, prefix)?;
            if empty {
                writeln!(out)?;
            }
        }
        let guard: String = prefix
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        writeln!(out, "#ifndef {guard}_H")?;
        writeln!(out, "#define {guard}_H")?;
        if empty {
            writeln!(out)?;
        }
        for routine in routines {
            writeln!(out, "{};", self.signature(routine))?;
        }
        if empty {
            writeln!(out)?;
        }
        writeln!(out, "#endif")?;
        Ok(())
    }

    fn write_banner<W: Write>(&self, out: &mut W, prefix: &str) -> Result<(), Error> {
        let lines = [
            format!(
                "Code generated by {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            String::new(),
            format!("This file is part of '{prefix}'."),
        ];
        match self.dialect {
            Dialect::Rust => {
                for line in lines {
                    if line.is_empty() {
                        writeln!(out, "//")?;
                    } else {
                        writeln!(out, "// {line}")?;
                    }
                }
            }
            Dialect::C => {
                writeln!(out, "/*")?;
                for line in lines {
                    if line.is_empty() {
                        writeln!(out, " *")?;
                    } else {
                        writeln!(out, " * {line}")?;
                    }
                }
                writeln!(out, " */")?;
            }
        }
        Ok(())
    }

    fn signature(&self, routine: &Routine) -> String {
        let params: Vec<String> = routine
            .arguments
            .iter()
            .map(|arg| {
                let name = arg.symbol.name();
                let len = arg.symbol.len();
                match (self.dialect, arg.direction) {
                    (Dialect::Rust, Direction::Input) => format!("{name}: &[f64; {len}]"),
                    (Dialect::Rust, Direction::Output) => format!("{name}: &mut [f64; {len}]"),
                    (Dialect::C, Direction::Input) => format!("const double *{name}"),
                    (Dialect::C, Direction::Output) => format!("double *{name}"),
                }
            })
            .collect();
        let params = params.join(", ");
        match (self.dialect, routine.result.is_some()) {
            (Dialect::Rust, true) => format!("pub fn {}({params}) -> f64", routine.name),
            (Dialect::Rust, false) => format!("pub fn {}({params})", routine.name),
            (Dialect::C, true) => format!("double {}({params})", routine.name),
            (Dialect::C, false) => format!("void {}({params})", routine.name),
        }
    }

    fn write_routine<W: Write>(
        &self,
        out: &mut W,
        routine: &Routine,
        empty: bool,
    ) -> Result<(), Error> {
        // All the expressions are compacted together, so the subexpressions
        // they share are deduplicated.
        let mut combined: Option<Tree> = None;
        for tree in routine
            .result
            .iter()
            .chain(routine.outputs.iter().map(|eq| eq.rhs()))
        {
            combined = Some(match combined {
                None => tree.clone(),
                Some(acc) => Tree::concat(Ok(acc), Ok(tree.clone()))?,
            });
        }
        let combined = combined.ok_or(Error::EmptyRoutine)?.compacted()?;
        let body = Body::new(self.dialect, &combined, &routine.arguments);
        if self.dialect == Dialect::Rust
            && routine
                .arguments
                .iter()
                .any(|arg| arg.symbol.name().is_uppercase())
        {
            writeln!(out, "#[allow(non_snake_case)]")?;
        }
        writeln!(out, "{} {{", self.signature(routine))?;
        let mut num_temps = 0usize;
        for index in 0..combined.len() {
            if let Some(temp) = body.temps[index] {
                let rhs = body.expr(index)?.0;
                match self.dialect {
                    Dialect::Rust => writeln!(out, "    let t{temp} = {rhs};")?,
                    Dialect::C => writeln!(out, "    const double t{temp} = {rhs};")?,
                }
                num_temps += 1;
            }
        }
        if num_temps > 0 && empty {
            writeln!(out)?;
        }
        let mut roots = combined.root_indices();
        let result = match routine.result {
            Some(_) => roots.next(),
            None => None,
        };
        for eq in routine.outputs.iter() {
            let (rows, cols) = eq.lhs().dims();
            let name = eq.lhs().name();
            // Roots are column major, the arrays are row major.
            for col in 0..cols {
                for row in 0..rows {
                    let root = roots.next().ok_or(Error::InvalidRoots)?;
                    let rhs = body.operand(root, 0)?;
                    writeln!(out, "    {name}[{}] = {rhs};", row * cols + col)?;
                }
            }
        }
        if let Some(root) = result {
            if empty && !routine.outputs.is_empty() {
                writeln!(out)?;
            }
            let rhs = body.operand(root, 0)?;
            match self.dialect {
                Dialect::Rust => writeln!(out, "    {rhs}")?,
                Dialect::C => writeln!(out, "    return {rhs};")?,
            }
        }
        writeln!(out, "}}")?;
        tracing::debug!(
            routine = routine.name.as_str(),
            temporaries = num_temps,
            nodes = combined.len(),
            "generated routine"
        );
        Ok(())
    }
}

/// Formats the nodes of a tree as expressions in the target dialect.
struct Body<'a> {
    dialect: Dialect,
    nodes: &'a [Node],
    arguments: &'a [Argument],
    /// The index of the temporary holding the value of each node, for nodes
    /// that are used more than once.
    temps: Vec<Option<usize>>,
}

impl<'a> Body<'a> {
    fn new(dialect: Dialect, tree: &'a Tree, arguments: &'a [Argument]) -> Body<'a> {
        let nodes = tree.nodes();
        let mut uses = vec![0usize; nodes.len()];
        for node in nodes {
            match node {
                Constant(_) | Symbol(_) => {}
                Unary(_, input) => uses[*input] += 1,
                Binary(_, lhs, rhs) => {
                    uses[*lhs] += 1;
                    uses[*rhs] += 1;
                }
            }
        }
        let mut counter = 0usize;
        let temps = nodes
            .iter()
            .zip(uses.iter())
            .map(|(node, count)| match node {
                Unary(..) | Binary(..) if *count > 1 => {
                    counter += 1;
                    Some(counter - 1)
                }
                _ => None,
            })
            .collect();
        Body {
            dialect,
            nodes,
            arguments,
            temps,
        }
    }

    fn symbol(&self, label: &Label) -> Result<String, Error> {
        self.arguments
            .iter()
            .find_map(|arg| {
                arg.symbol
                    .flat_index(label)
                    .map(|i| format!("{}[{i}]", arg.symbol.name()))
            })
            .ok_or(Error::MissingArgument(*label))
    }

    /// Expression for the node at `index`, parenthesized if it binds weaker
    /// than `min_prec`. Nodes stored in temporaries are referred to by name.
    fn operand(&self, index: usize, min_prec: u8) -> Result<String, Error> {
        if let Some(temp) = self.temps[index] {
            return Ok(format!("t{temp}"));
        }
        let (expr, prec) = self.expr(index)?;
        Ok(if prec < min_prec {
            format!("({expr})")
        } else {
            expr
        })
    }

    /// Expression for the node at `index` and how strongly it binds.
    fn expr(&self, index: usize) -> Result<(String, u8), Error> {
        Ok(match &self.nodes[index] {
            Constant(val) => (
                format_literal(*val, self.dialect),
                if *val < 0. { 3 } else { 5 },
            ),
            Symbol(label) => (self.symbol(label)?, 5),
            Unary(Negate, input) => {
                let min_prec = match self.nodes[*input] {
                    Unary(Negate, _) => 4,
                    Constant(val) if val < 0. => 4,
                    _ => 2,
                };
                (format!("-{}", self.operand(*input, min_prec)?), 3)
            }
            Unary(op, input) => {
                let arg = self.operand(*input, 0)?;
                let name = match (self.dialect, op) {
                    (Dialect::Rust, Sqrt) => "f64::sqrt",
                    (Dialect::Rust, Sin) => "f64::sin",
                    (Dialect::Rust, Cos) => "f64::cos",
                    (Dialect::Rust, Log) => "f64::ln",
                    (Dialect::Rust, Exp) => "f64::exp",
                    (Dialect::C, Sqrt) => "sqrt",
                    (Dialect::C, Sin) => "sin",
                    (Dialect::C, Cos) => "cos",
                    (Dialect::C, Log) => "log",
                    (Dialect::C, Exp) => "exp",
                    (_, Negate) => "-",
                };
                (format!("{name}({arg})"), 5)
            }
            Binary(Pow, base, exp) => {
                let basex = self.operand(*base, 0)?;
                let expr = match (self.dialect, self.nodes[*exp]) {
                    (Dialect::Rust, Constant(val)) if val.fract() == 0. && val.abs() < 65536. => {
                        format!("f64::powi({basex}, {})", val as i32)
                    }
                    (Dialect::Rust, _) => format!("f64::powf({basex}, {})", self.operand(*exp, 0)?),
                    (Dialect::C, _) => format!("pow({basex}, {})", self.operand(*exp, 0)?),
                };
                (expr, 5)
            }
            Binary(op, lhs, rhs) => {
                let (symbol, prec, rmin) = match op {
                    Add => ("+", 1, 2),
                    Subtract => ("-", 1, 2),
                    Multiply => ("*", 2, 4),
                    Divide => ("/", 2, 4),
                    Pow => ("^", 5, 5),
                };
                let lx = self.operand(*lhs, prec)?;
                let rx = self.operand(*rhs, rmin)?;
                (format!("{lx} {symbol} {rx}"), prec)
            }
        })
    }
}

/// Format f64 as a floating point literal of the dialect.
fn format_literal(v: f64, dialect: Dialect) -> String {
    if v.is_infinite() {
        let sign = if v < 0. { "-" } else { "" };
        return match dialect {
            Dialect::Rust => format!("{sign}f64::INFINITY"),
            Dialect::C => format!("{sign}INFINITY"),
        };
    }
    let s = format!("{v}");
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{s}.0")
    }
}
