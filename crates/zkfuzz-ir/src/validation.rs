//! Kind checking for expressions and circuits.

use crate::circuit::Circuit;
use crate::expr::{Expr, Kind};
use std::collections::HashMap;
use zkfuzz_core::{Error, Result};

/// Check that every operator is applied to operands of the kind its
/// signature demands, and return the kind of `expr`.
pub fn check_kinds(expr: &Expr) -> Result<Kind> {
    match expr {
        Expr::Const { kind, value } => {
            if *kind == Kind::Bool && *value > 1 {
                return Err(Error::IllKinded(format!("boolean constant {}", value)));
            }
            Ok(*kind)
        }
        Expr::Var { kind, .. } => Ok(*kind),
        Expr::Unary { kind, op, operand } => {
            expect_kind(operand, op.operand_kind(), &format!("{:?} operand", op))?;
            expect_node_kind(*kind, op.result_kind(), &format!("{:?}", op))
        }
        Expr::Binary { kind, op, lhs, rhs } => {
            expect_kind(lhs, op.operand_kind(), &format!("{:?} lhs", op))?;
            expect_kind(rhs, op.operand_kind(), &format!("{:?} rhs", op))?;
            expect_node_kind(*kind, op.result_kind(), &format!("{:?}", op))
        }
        Expr::Cast { kind, operand } => {
            expect_kind(operand, Kind::Bool, "cast operand")?;
            expect_node_kind(*kind, Kind::Field, "cast")
        }
    }
}

fn expect_kind(expr: &Expr, wanted: Kind, what: &str) -> Result<()> {
    let found = check_kinds(expr)?;
    if found != wanted {
        return Err(Error::IllKinded(format!(
            "{} is {:?}, expected {:?}",
            what, found, wanted
        )));
    }
    Ok(())
}

fn expect_node_kind(declared: Kind, wanted: Kind, what: &str) -> Result<Kind> {
    if declared != wanted {
        return Err(Error::IllKinded(format!(
            "{} node declared {:?}, signature gives {:?}",
            what, declared, wanted
        )));
    }
    Ok(declared)
}

/// Validate that a circuit is well-formed
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    let mut declared: HashMap<&str, Kind> = HashMap::new();
    for input in &circuit.inputs {
        if declared.insert(input.name.as_str(), input.kind).is_some() {
            return Err(Error::IllKinded(format!(
                "input '{}' declared twice",
                input.name
            )));
        }
        if input.kind == Kind::Bool && input.value > 1 {
            return Err(Error::IllKinded(format!(
                "boolean input '{}' assigned {}",
                input.name, input.value
            )));
        }
    }

    let root_kind = check_kinds(&circuit.root)?;
    if root_kind != circuit.output_kind {
        return Err(Error::IllKinded(format!(
            "circuit '{}' declares {:?} output but computes {:?}",
            circuit.name, circuit.output_kind, root_kind
        )));
    }

    check_variables(&circuit.root, &declared)
}

fn check_variables(expr: &Expr, declared: &HashMap<&str, Kind>) -> Result<()> {
    if let Expr::Var { kind, name } = expr {
        match declared.get(name.as_str()) {
            None => return Err(Error::UnboundVariable(name.clone())),
            Some(k) if k != kind => {
                return Err(Error::IllKinded(format!(
                    "variable '{}' used as {:?} but declared {:?}",
                    name, kind, k
                )))
            }
            Some(_) => {}
        }
    }
    for child in expr.children() {
        check_variables(child, declared)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Input;
    use crate::expr::{BinaryOp, UnaryOp};

    #[test]
    fn test_well_kinded_expression() {
        let expr = Expr::binary(
            BinaryOp::And,
            Expr::binary(BinaryOp::Lt, Expr::field(1), Expr::field(2)),
            Expr::unary(UnaryOp::Not, Expr::boolean(false)),
        );
        assert_eq!(check_kinds(&expr).unwrap(), Kind::Bool);
    }

    #[test]
    fn test_mismatched_operand_rejected() {
        let expr = Expr::binary(BinaryOp::Add, Expr::field(1), Expr::boolean(true));
        assert!(matches!(check_kinds(&expr), Err(Error::IllKinded(_))));

        let expr = Expr::unary(UnaryOp::Not, Expr::field(1));
        assert!(matches!(check_kinds(&expr), Err(Error::IllKinded(_))));

        let expr = Expr::cast(Expr::field(1));
        assert!(matches!(check_kinds(&expr), Err(Error::IllKinded(_))));
    }

    #[test]
    fn test_reinterpreted_node_rejected() {
        let expr = Expr::Binary {
            kind: Kind::Field,
            op: BinaryOp::Eq,
            lhs: Box::new(Expr::field(1)),
            rhs: Box::new(Expr::field(1)),
        };
        assert!(check_kinds(&expr).is_err());

        let expr = Expr::Const {
            kind: Kind::Bool,
            value: 2,
        };
        assert!(check_kinds(&expr).is_err());
    }

    #[test]
    fn test_validate_circuit() {
        let inputs = vec![Input::new("f0", Kind::Field, 3), Input::new("b0", Kind::Bool, 1)];
        let root = Expr::binary(
            BinaryOp::Add,
            Expr::var(Kind::Field, "f0"),
            Expr::cast(Expr::var(Kind::Bool, "b0")),
        );
        let circuit = Circuit::new("seed", inputs, root);
        assert!(validate_circuit(&circuit).is_ok());

        let mut undeclared = circuit.clone();
        undeclared.root = Expr::var(Kind::Field, "f9");
        assert!(matches!(
            validate_circuit(&undeclared),
            Err(Error::UnboundVariable(_))
        ));

        let mut wrong_output = circuit.clone();
        wrong_output.output_kind = Kind::Bool;
        assert!(validate_circuit(&wrong_output).is_err());

        let mut wrong_var_kind = circuit.clone();
        wrong_var_kind.root = Expr::var(Kind::Field, "b0");
        assert!(validate_circuit(&wrong_var_kind).is_err());

        let mut duplicate = circuit;
        duplicate.inputs.push(Input::new("f0", Kind::Field, 1));
        assert!(validate_circuit(&duplicate).is_err());
    }
}
