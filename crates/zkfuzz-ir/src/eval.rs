//! Reference evaluation of expression trees.
//!
//! Semantics follow RV32IM, which is what the guest programs execute on:
//! field arithmetic wraps modulo 2^32, division by zero yields all ones,
//! remainder by zero yields the dividend, and shift amounts use their low
//! five bits. Booleans are the words 0 and 1.

use crate::expr::{BinaryOp, Expr, UnaryOp};
use std::collections::HashMap;
use zkfuzz_core::{Error, Result};

/// Variable assignment used during evaluation
pub type Env = HashMap<String, u32>;

pub fn apply_unary(op: UnaryOp, value: u32) -> u32 {
    match op {
        UnaryOp::Neg => value.wrapping_neg(),
        UnaryOp::Not => (value == 0) as u32,
    }
}

pub fn apply_binary(op: BinaryOp, a: u32, b: u32) -> u32 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => a.checked_div(b).unwrap_or(u32::MAX),
        BinaryOp::Rem => a.checked_rem(b).unwrap_or(a),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(b),
        BinaryOp::Shr => a.wrapping_shr(b),
        BinaryOp::And => ((a != 0) && (b != 0)) as u32,
        BinaryOp::Or => ((a != 0) || (b != 0)) as u32,
        BinaryOp::Xor => ((a != 0) != (b != 0)) as u32,
        BinaryOp::Eq => (a == b) as u32,
        BinaryOp::Ne => (a != b) as u32,
        BinaryOp::Lt => (a < b) as u32,
        BinaryOp::Le => (a <= b) as u32,
        BinaryOp::Gt => (a > b) as u32,
        BinaryOp::Ge => (a >= b) as u32,
    }
}

/// Evaluate `expr` under `env`
pub fn evaluate(expr: &Expr, env: &Env) -> Result<u32> {
    match expr {
        Expr::Const { value, .. } => Ok(*value),
        Expr::Var { name, .. } => env
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnboundVariable(name.clone())),
        Expr::Unary { op, operand, .. } => Ok(apply_unary(*op, evaluate(operand, env)?)),
        Expr::Binary { op, lhs, rhs, .. } => {
            let a = evaluate(lhs, env)?;
            let b = evaluate(rhs, env)?;
            Ok(apply_binary(*op, a, b))
        }
        Expr::Cast { operand, .. } => Ok((evaluate(operand, env)? != 0) as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Kind;

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(apply_binary(BinaryOp::Add, u32::MAX, 2), 1);
        assert_eq!(apply_binary(BinaryOp::Sub, 0, 1), u32::MAX);
        assert_eq!(apply_binary(BinaryOp::Mul, 1 << 31, 2), 0);
        assert_eq!(apply_unary(UnaryOp::Neg, 1), u32::MAX);
    }

    #[test]
    fn test_division_by_zero_follows_riscv() {
        assert_eq!(apply_binary(BinaryOp::Div, 17, 0), u32::MAX);
        assert_eq!(apply_binary(BinaryOp::Rem, 17, 0), 17);
        assert_eq!(apply_binary(BinaryOp::Div, 17, 5), 3);
        assert_eq!(apply_binary(BinaryOp::Rem, 17, 5), 2);
    }

    #[test]
    fn test_shift_amount_masked() {
        assert_eq!(apply_binary(BinaryOp::Shl, 1, 33), 2);
        assert_eq!(apply_binary(BinaryOp::Shr, 8, 35), 1);
    }

    #[test]
    fn test_boolean_ops() {
        assert_eq!(apply_binary(BinaryOp::And, 1, 0), 0);
        assert_eq!(apply_binary(BinaryOp::Or, 1, 0), 1);
        assert_eq!(apply_binary(BinaryOp::Xor, 1, 1), 0);
        assert_eq!(apply_unary(UnaryOp::Not, 0), 1);
        assert_eq!(apply_binary(BinaryOp::Le, 3, 3), 1);
        assert_eq!(apply_binary(BinaryOp::Gt, 3, 3), 0);
    }

    #[test]
    fn test_evaluate_tree() {
        // field(f0 < 10) + f0 * 3
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::cast(Expr::binary(
                BinaryOp::Lt,
                Expr::var(Kind::Field, "f0"),
                Expr::field(10),
            )),
            Expr::binary(BinaryOp::Mul, Expr::var(Kind::Field, "f0"), Expr::field(3)),
        );

        let env = Env::from([("f0".to_string(), 4)]);
        assert_eq!(evaluate(&expr, &env).unwrap(), 13);

        let env = Env::from([("f0".to_string(), 20)]);
        assert_eq!(evaluate(&expr, &env).unwrap(), 60);
    }

    #[test]
    fn test_unbound_variable() {
        let expr = Expr::var(Kind::Bool, "b7");
        let err = evaluate(&expr, &Env::new()).unwrap_err();
        assert!(matches!(err, Error::UnboundVariable(name) if name == "b7"));
    }
}
