//! Expression trees for generated circuits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static kind of an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// 32-bit word, arithmetic wraps modulo 2^32
    Field,
    /// 0 or 1
    Bool,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 2] = [UnaryOp::Neg, UnaryOp::Not];

    pub fn operand_kind(&self) -> Kind {
        match self {
            UnaryOp::Neg => Kind::Field,
            UnaryOp::Not => Kind::Bool,
        }
    }

    pub fn result_kind(&self) -> Kind {
        self.operand_kind()
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,

    // Logical
    And,
    Or,
    Xor,

    // Comparison (unsigned)
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 19] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Xor,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Ge,
    ];

    /// Kind both operands must have
    pub fn operand_kind(&self) -> Kind {
        match self {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => Kind::Bool,
            _ => Kind::Field,
        }
    }

    pub fn result_kind(&self) -> Kind {
        if self.is_comparison() {
            return Kind::Bool;
        }
        self.operand_kind()
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Mul
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::Xor
                | BinaryOp::Eq
                | BinaryOp::Ne
        )
    }

    /// Comparison that holds with operands swapped (`a < b` iff `b > a`)
    pub fn flipped(&self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Lt => Some(BinaryOp::Gt),
            BinaryOp::Gt => Some(BinaryOp::Lt),
            BinaryOp::Le => Some(BinaryOp::Ge),
            BinaryOp::Ge => Some(BinaryOp::Le),
            BinaryOp::Eq => Some(BinaryOp::Eq),
            BinaryOp::Ne => Some(BinaryOp::Ne),
            _ => None,
        }
    }

    /// Comparison that holds exactly when this one does not
    pub fn negated(&self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Eq => Some(BinaryOp::Ne),
            BinaryOp::Ne => Some(BinaryOp::Eq),
            BinaryOp::Lt => Some(BinaryOp::Ge),
            BinaryOp::Ge => Some(BinaryOp::Lt),
            BinaryOp::Le => Some(BinaryOp::Gt),
            BinaryOp::Gt => Some(BinaryOp::Le),
            _ => None,
        }
    }
}

/// Operator pool entry used when shaping random trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Unary(UnaryOp),
    Binary(BinaryOp),
    Cast,
}

impl Operator {
    /// Every operator the IR knows
    pub fn all() -> Vec<Operator> {
        UnaryOp::ALL
            .iter()
            .map(|op| Operator::Unary(*op))
            .chain(BinaryOp::ALL.iter().map(|op| Operator::Binary(*op)))
            .chain(std::iter::once(Operator::Cast))
            .collect()
    }

    pub fn result_kind(&self) -> Kind {
        match self {
            Operator::Unary(op) => op.result_kind(),
            Operator::Binary(op) => op.result_kind(),
            Operator::Cast => Kind::Field,
        }
    }
}

/// A node in a circuit expression tree.
///
/// Nodes are never mutated once built; rewriting produces new trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Const {
        kind: Kind,
        value: u32,
    },
    Var {
        kind: Kind,
        name: String,
    },
    Unary {
        kind: Kind,
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        kind: Kind,
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Bool to Field (0 or 1)
    Cast {
        kind: Kind,
        operand: Box<Expr>,
    },
}

impl Expr {
    pub fn field(value: u32) -> Self {
        Expr::Const {
            kind: Kind::Field,
            value,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Const {
            kind: Kind::Bool,
            value: value as u32,
        }
    }

    /// `witness == witness` or `witness != witness`; a Bool whose only
    /// literal is the given field constant
    pub fn truth(value: bool, witness: u32) -> Self {
        let op = if value { BinaryOp::Eq } else { BinaryOp::Ne };
        Expr::binary(op, Expr::field(witness), Expr::field(witness))
    }

    pub fn var(kind: Kind, name: impl Into<String>) -> Self {
        Expr::Var {
            kind,
            name: name.into(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            kind: op.result_kind(),
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            kind: op.result_kind(),
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn cast(operand: Expr) -> Self {
        Expr::Cast {
            kind: Kind::Field,
            operand: Box::new(operand),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Expr::Const { kind, .. }
            | Expr::Var { kind, .. }
            | Expr::Unary { kind, .. }
            | Expr::Binary { kind, .. }
            | Expr::Cast { kind, .. } => *kind,
        }
    }

    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Const { .. } | Expr::Var { .. } => Vec::new(),
            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => vec![&**operand],
            Expr::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Expr::Const { .. } | Expr::Var { .. })
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }

    /// Height of the tree; a leaf has depth 0
    pub fn depth(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Every node position in pre-order, as child-index paths from the root
    pub fn paths(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::with_capacity(self.size());
        let mut prefix = Vec::new();
        self.collect_paths(&mut prefix, &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        out.push(prefix.clone());
        for (idx, child) in self.children().into_iter().enumerate() {
            prefix.push(idx);
            child.collect_paths(prefix, out);
            prefix.pop();
        }
    }

    /// Subtree at `path`, if the path addresses a node
    pub fn at(&self, path: &[usize]) -> Option<&Expr> {
        match path.split_first() {
            None => Some(self),
            Some((idx, rest)) => self.children().get(*idx).copied().and_then(|c| c.at(rest)),
        }
    }

    /// A new tree with the subtree at `path` swapped for `replacement`
    pub fn replace_at(&self, path: &[usize], replacement: Expr) -> Option<Expr> {
        let (idx, rest) = match path.split_first() {
            None => return Some(replacement),
            Some(split) => split,
        };

        match (self, *idx) {
            (Expr::Unary { kind, op, operand }, 0) => Some(Expr::Unary {
                kind: *kind,
                op: *op,
                operand: Box::new(operand.replace_at(rest, replacement)?),
            }),
            (Expr::Cast { kind, operand }, 0) => Some(Expr::Cast {
                kind: *kind,
                operand: Box::new(operand.replace_at(rest, replacement)?),
            }),
            (Expr::Binary { kind, op, lhs, rhs }, 0) => Some(Expr::Binary {
                kind: *kind,
                op: *op,
                lhs: Box::new(lhs.replace_at(rest, replacement)?),
                rhs: rhs.clone(),
            }),
            (Expr::Binary { kind, op, lhs, rhs }, 1) => Some(Expr::Binary {
                kind: *kind,
                op: *op,
                lhs: lhs.clone(),
                rhs: Box::new(rhs.replace_at(rest, replacement)?),
            }),
            _ => None,
        }
    }

    /// All constant literals in pre-order
    pub fn constants(&self) -> Vec<(Kind, u32)> {
        let mut out = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Const { kind, value } = e {
                out.push((*kind, *value));
            }
        });
        out
    }

    /// Names of referenced variables in pre-order (with repeats)
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit_ref(&mut out);
        out
    }

    fn visit_ref<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Expr::Var { name, .. } = self {
            out.push(name.as_str());
        }
        for child in self.children() {
            child.visit_ref(out);
        }
    }

    fn visit<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const { kind: Kind::Bool, value } => write!(f, "{}", *value != 0),
            Expr::Const { value, .. } => write!(f, "{}", value),
            Expr::Var { name, .. } => write!(f, "{}", name),
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Neg => write!(f, "-({})", operand),
                UnaryOp::Not => write!(f, "!({})", operand),
            },
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "({} {:?} {})", lhs, op, rhs),
            Expr::Cast { operand, .. } => write!(f, "field({})", operand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Expr {
        // (f0 + 3) < f1
        Expr::binary(
            BinaryOp::Lt,
            Expr::binary(BinaryOp::Add, Expr::var(Kind::Field, "f0"), Expr::field(3)),
            Expr::var(Kind::Field, "f1"),
        )
    }

    #[test]
    fn test_operator_signatures() {
        assert_eq!(BinaryOp::Add.result_kind(), Kind::Field);
        assert_eq!(BinaryOp::Lt.operand_kind(), Kind::Field);
        assert_eq!(BinaryOp::Lt.result_kind(), Kind::Bool);
        assert_eq!(BinaryOp::Xor.operand_kind(), Kind::Bool);
        assert_eq!(UnaryOp::Not.result_kind(), Kind::Bool);
        assert_eq!(Operator::Cast.result_kind(), Kind::Field);
        assert_eq!(Operator::all().len(), UnaryOp::ALL.len() + BinaryOp::ALL.len() + 1);
    }

    #[test]
    fn test_comparison_algebra() {
        for op in BinaryOp::ALL {
            if let Some(negated) = op.negated() {
                assert_eq!(negated.negated(), Some(op));
            }
            if let Some(flipped) = op.flipped() {
                assert_eq!(flipped.flipped(), Some(op));
            }
            assert_eq!(op.is_comparison(), op.negated().is_some());
        }
    }

    #[test]
    fn test_constructors_set_kind() {
        let e = sample();
        assert_eq!(e.kind(), Kind::Bool);
        assert_eq!(Expr::cast(Expr::boolean(true)).kind(), Kind::Field);
        assert_eq!(Expr::unary(UnaryOp::Neg, Expr::field(1)).kind(), Kind::Field);
    }

    #[test]
    fn test_truth_uses_only_field_literals() {
        for value in [true, false] {
            let e = Expr::truth(value, 150);
            assert_eq!(e.kind(), Kind::Bool);
            assert_eq!(e.constants(), vec![(Kind::Field, 150), (Kind::Field, 150)]);
        }
    }

    #[test]
    fn test_structure_metrics() {
        let e = sample();
        assert_eq!(e.size(), 5);
        assert_eq!(e.depth(), 2);
        assert_eq!(e.constants(), vec![(Kind::Field, 3)]);
        assert_eq!(e.variables(), vec!["f0", "f1"]);
        assert!(Expr::field(0).is_leaf());
    }

    #[test]
    fn test_paths_and_lookup() {
        let e = sample();
        let paths = e.paths();
        assert_eq!(paths.len(), e.size());
        assert_eq!(paths[0], Vec::<usize>::new());
        assert_eq!(e.at(&[0, 1]), Some(&Expr::field(3)));
        assert_eq!(e.at(&[1]), Some(&Expr::var(Kind::Field, "f1")));
        assert_eq!(e.at(&[2]), None);
        assert_eq!(e.at(&[1, 0]), None);
    }

    #[test]
    fn test_replace_at_leaves_original_untouched() {
        let e = sample();
        let replaced = e.replace_at(&[0, 1], Expr::field(9)).unwrap();

        assert_eq!(replaced.at(&[0, 1]), Some(&Expr::field(9)));
        assert_eq!(e.at(&[0, 1]), Some(&Expr::field(3)));
        assert_eq!(replaced.at(&[1]), e.at(&[1]));

        assert_eq!(e.replace_at(&[], Expr::boolean(false)), Some(Expr::boolean(false)));
        assert_eq!(e.replace_at(&[5], Expr::field(0)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "((f0 Add 3) Lt f1)");
        assert_eq!(Expr::cast(Expr::boolean(true)).to_string(), "field(true)");
    }
}
