//! Emitter from IR to guest Rust source.
//!
//! Every value is rendered as `u32`; booleans are 0/1. Arithmetic uses the
//! wrapping methods so the guest matches [`crate::eval`] bit for bit.

use crate::circuit::{Bundle, Circuit};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::validation::validate_circuit;
use std::fmt::Write;
use zkfuzz_core::Result;

pub struct GuestEmitter {
    config: EmitterConfig,
}

#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Name of the function that evaluates every circuit in order
    pub entry_point: String,
    /// Emit the recorded input assignment as `Inputs::recorded()`
    pub recorded_inputs: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            entry_point: "run_all".to_string(),
            recorded_inputs: true,
        }
    }
}

const HELPERS: &str = "\
#[inline(always)]
fn rv_div(a: u32, b: u32) -> u32 {
    if b == 0 { u32::MAX } else { a / b }
}

#[inline(always)]
fn rv_rem(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { a % b }
}
";

impl GuestEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// Render a whole bundle as one guest module
    pub fn emit_bundle(&self, bundle: &Bundle) -> Result<String> {
        let mut out = String::new();
        let count = bundle.len();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "// Generated bundle: 1 seed, {} variants", count - 1);
        let _ = writeln!(out, "#![allow(unused_parens, clippy::all)]\n");
        let _ = writeln!(out, "pub const EXPECTED: u32 = {};\n", bundle.expected());

        self.emit_inputs(&mut out, bundle);
        out.push_str(HELPERS);

        for circuit in bundle.circuits() {
            out.push('\n');
            out.push_str(&self.emit_circuit(circuit)?);
        }

        let _ = writeln!(
            out,
            "\npub fn {}(inputs: &Inputs) -> [u32; {}] {{",
            self.config.entry_point, count
        );
        let calls: Vec<String> = bundle
            .circuits()
            .iter()
            .map(|c| format!("{}(inputs)", c.name))
            .collect();
        let _ = writeln!(out, "    [{}]", calls.join(", "));
        out.push_str("}\n");

        Ok(out)
    }

    /// Render one circuit as `pub fn <name>(inputs: &Inputs) -> u32`
    pub fn emit_circuit(&self, circuit: &Circuit) -> Result<String> {
        validate_circuit(circuit)?;

        let mut out = String::new();
        if !circuit.rewrites.is_empty() {
            let _ = writeln!(out, "// rewrites: {}", circuit.rewrites.join(", "));
        }
        let _ = writeln!(out, "pub fn {}(inputs: &Inputs) -> u32 {{", circuit.name);
        let _ = writeln!(out, "    {}", render_expr(&circuit.root));
        out.push_str("}\n");
        Ok(out)
    }

    fn emit_inputs(&self, out: &mut String, bundle: &Bundle) {
        out.push_str("#[derive(Clone, Copy, Debug)]\npub struct Inputs {\n");
        for input in bundle.inputs() {
            let _ = writeln!(out, "    pub {}: u32,", input.name);
        }
        out.push_str("}\n\n");

        if self.config.recorded_inputs {
            out.push_str("impl Inputs {\n    pub fn recorded() -> Self {\n        Self {\n");
            for input in bundle.inputs() {
                let _ = writeln!(out, "            {}: {},", input.name, input.value);
            }
            out.push_str("        }\n    }\n}\n\n");
        }
    }
}

impl Default for GuestEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

/// Render an expression as a `u32`-valued Rust expression
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Const { value, .. } => format!("{}u32", value),
        Expr::Var { name, .. } => format!("inputs.{}", name),
        Expr::Unary { op, operand, .. } => {
            let operand = render_expr(operand);
            match op {
                UnaryOp::Neg => format!("({}).wrapping_neg()", operand),
                UnaryOp::Not => format!("({} ^ 1)", operand),
            }
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            let (a, b) = (render_expr(lhs), render_expr(rhs));
            match op {
                BinaryOp::Add => format!("({}).wrapping_add({})", a, b),
                BinaryOp::Sub => format!("({}).wrapping_sub({})", a, b),
                BinaryOp::Mul => format!("({}).wrapping_mul({})", a, b),
                BinaryOp::Div => format!("rv_div({}, {})", a, b),
                BinaryOp::Rem => format!("rv_rem({}, {})", a, b),
                BinaryOp::Shl => format!("({}).wrapping_shl({})", a, b),
                BinaryOp::Shr => format!("({}).wrapping_shr({})", a, b),
                BinaryOp::BitAnd | BinaryOp::And => format!("({} & {})", a, b),
                BinaryOp::BitOr | BinaryOp::Or => format!("({} | {})", a, b),
                BinaryOp::BitXor | BinaryOp::Xor => format!("({} ^ {})", a, b),
                BinaryOp::Eq => format!("(({} == {}) as u32)", a, b),
                BinaryOp::Ne => format!("(({} != {}) as u32)", a, b),
                BinaryOp::Lt => format!("(({} < {}) as u32)", a, b),
                BinaryOp::Le => format!("(({} <= {}) as u32)", a, b),
                BinaryOp::Gt => format!("(({} > {}) as u32)", a, b),
                BinaryOp::Ge => format!("(({} >= {}) as u32)", a, b),
            }
        }
        // Booleans are already 0/1.
        Expr::Cast { operand, .. } => render_expr(operand),
    }
}
