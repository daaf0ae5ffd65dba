use crate::{
    codegen::{CodeGen, Dialect, RoutineExpr, make_routine},
    dual::jacobian,
    equation::Equation,
    error::Error,
    matrix_ops::{matmul, transpose},
    tree::{Label, MatrixSymbol, MaybeTree, Tree},
};
use std::fmt::Write;

/// Gradient of the quadratic form `x^T A x` with respect to `x`, where `A` is a
/// square matrix and `x` a column vector of the same size.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientProblem {
    /// Size of the matrix and the vector.
    pub size: usize,
    pub matrix: char,
    pub vector: char,
    /// Name of the output argument that receives the gradient.
    pub output: char,
    /// Name of the generated routine.
    pub routine: String,
    /// Project name written in the banner of the generated code.
    pub prefix: String,
    pub dialect: Dialect,
    /// Start the generated code with a banner.
    pub header: bool,
    /// Separate the sections of the generated code with blank lines.
    pub empty: bool,
}

impl Default for GradientProblem {
    fn default() -> Self {
        GradientProblem {
            size: 4,
            matrix: 'A',
            vector: 'x',
            output: 'g',
            routine: "quad_and_grad".to_string(),
            prefix: "linalg_kernels".to_string(),
            dialect: Dialect::Rust,
            header: true,
            empty: false,
        }
    }
}

/// Everything produced by solving a `GradientProblem`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientReport {
    pub quadratic_form: Tree,
    /// Simplified gradient, a column vector.
    pub gradient: Tree,
    /// Plain text of the gradient.
    pub text: String,
    pub latex: String,
    /// Latex of the equation assigning the gradient to the output.
    pub equation_latex: String,
    /// Source of the routine returning the quadratic form and writing the
    /// gradient into the output argument.
    pub code: String,
}

impl GradientProblem {
    /// The matrix, the vector and the output symbols.
    pub fn symbols(&self) -> Result<(MatrixSymbol, MatrixSymbol, MatrixSymbol), Error> {
        Ok((
            MatrixSymbol::new(self.matrix, self.size, self.size)?,
            MatrixSymbol::new(self.vector, self.size, 1)?,
            MatrixSymbol::new(self.output, self.size, 1)?,
        ))
    }

    pub fn quadratic_form(&self) -> MaybeTree {
        let (a, x, _) = self.symbols()?;
        matmul(matmul(transpose(Ok(x.tree())), Ok(a.tree())), Ok(x.tree()))
    }

    /// The simplified gradient of the quadratic form.
    pub fn gradient(&self) -> MaybeTree {
        let (_, x, _) = self.symbols()?;
        differentiate(&self.quadratic_form()?, &x)
    }

    /// Gradient of the quadratic form at the point where the entries of the
    /// matrix and the vector take the given `values`, computed numerically
    /// with dual numbers. The partial derivatives are in the order of the
    /// entries of the vector.
    pub fn forward_gradient(&self, values: &[(Label, f64)]) -> Result<Vec<f64>, Error> {
        let (_, x, _) = self.symbols()?;
        jacobian::<4>(&self.quadratic_form()?, &x.tree().symbols(), values)
    }

    /// Write `grad=` followed by the plain text of the gradient.
    pub fn write_gradient<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        writeln!(out, "grad={}", self.gradient()?)?;
        Ok(())
    }

    pub fn solve(&self) -> Result<GradientReport, Error> {
        let (a, x, g) = self.symbols()?;
        let quadratic_form = self.quadratic_form()?;
        let gradient = differentiate(&quadratic_form, &x)?;
        let equation = Equation::new(g, gradient.clone())?;
        let routine = make_routine(
            &self.routine,
            vec![
                RoutineExpr::Return(quadratic_form.clone()),
                RoutineExpr::Assign(equation.clone()),
            ],
            &[a, x, g],
        )?;
        let mut code = String::new();
        CodeGen::new(self.dialect).dump(
            &[routine],
            &mut code,
            &self.prefix,
            self.header,
            self.empty,
        )?;
        tracing::debug!(size = self.size, code_len = code.len(), "solved gradient problem");
        Ok(GradientReport {
            text: gradient.to_string(),
            latex: gradient.to_latex(),
            equation_latex: equation.to_latex(),
            quadratic_form,
            gradient,
            code,
        })
    }
}

fn differentiate(quadratic_form: &Tree, x: &MatrixSymbol) -> MaybeTree {
    quadratic_form.derive_by_array(&x.tree())?.simplify()
}

impl GradientReport {
    /// Write the plain text of the gradient, its latex, the latex of the
    /// equation and the generated code, each followed by a line break.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        for section in [&self.text, &self.latex, &self.equation_latex, &self.code] {
            writeln!(out, "{section}")?;
        }
        Ok(())
    }
}
