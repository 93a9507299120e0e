//! Rewrite rules for metamorphic circuit variation.
//!
//! Each rule pairs a shape predicate with a pure build function
//! `(subtree, ctx) -> Option<subtree'>`. A build function returns `None`
//! when it cannot produce a replacement within the caller's value bounds.
//! Rule registries are immutable and shared process-wide.

use crate::expr::{BinaryOp, Expr, Kind, UnaryOp};
use once_cell::sync::Lazy;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use zkfuzz_core::{Bounds, Error, Result, Weighted};

pub type MatchFn = fn(&Expr) -> bool;
pub type BuildFn = fn(&Expr, &mut RewriteContext<'_>) -> Option<Expr>;

/// Whether applying a rule keeps the circuit's output unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Preserving,
    /// Deliberately changes the output; used to check the harness notices
    Perturbing,
}

/// State a build function may draw on
pub struct RewriteContext<'a> {
    pub rng: &'a mut ChaCha8Rng,
    /// Range every newly introduced field constant must fall in
    pub values: Bounds<u32>,
}

impl RewriteContext<'_> {
    fn field_constant(&mut self) -> Expr {
        Expr::field(self.rng.gen_range(self.values.min..=self.values.max))
    }

    /// A Bool built from an in-range field constant
    fn truth(&mut self, value: bool) -> Expr {
        Expr::truth(value, self.rng.gen_range(self.values.min..=self.values.max))
    }

    fn literal(&self, value: u32) -> Option<Expr> {
        self.values.contains(value).then(|| Expr::field(value))
    }
}

#[derive(Clone, Copy)]
pub struct RewriteRule {
    pub name: &'static str,
    pub weight: f64,
    pub effect: Effect,
    matches: MatchFn,
    build: BuildFn,
}

impl RewriteRule {
    pub const fn new(
        name: &'static str,
        weight: f64,
        effect: Effect,
        matches: MatchFn,
        build: BuildFn,
    ) -> Self {
        Self {
            name,
            weight,
            effect,
            matches,
            build,
        }
    }

    pub fn matches(&self, expr: &Expr) -> bool {
        (self.matches)(expr)
    }

    /// Build a replacement for `expr`; `None` if the rule does not match or declines
    pub fn apply(&self, expr: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
        if !self.matches(expr) {
            return None;
        }
        (self.build)(expr, ctx)
    }
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("effect", &self.effect)
            .finish()
    }
}

impl Weighted for RewriteRule {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// An immutable catalogue of rewrite rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

static STANDARD: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    rules: preserving_rules(),
});

static WITH_PERTURBING: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    rules: preserving_rules()
        .into_iter()
        .chain(perturbing_rules())
        .collect(),
});

impl RuleSet {
    /// Build a rule set, rejecting non-positive or non-finite weights
    pub fn new(rules: Vec<RewriteRule>) -> Result<Self> {
        if let Some(bad) = rules
            .iter()
            .find(|r| !(r.weight.is_finite() && r.weight > 0.0))
        {
            return Err(Error::InvalidWeight(format!(
                "rule '{}' has weight {}",
                bad.name, bad.weight
            )));
        }
        Ok(Self { rules })
    }

    /// Semantics-preserving rules only
    pub fn standard() -> &'static RuleSet {
        &STANDARD
    }

    /// Preserving rules plus the perturbing ones
    pub fn with_perturbing() -> &'static RuleSet {
        &WITH_PERTURBING
    }

    /// Rules whose predicate holds for `expr`
    pub fn rules_matching(&self, expr: &Expr) -> Vec<&RewriteRule> {
        self.rules.iter().filter(|r| r.matches(expr)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn preserving_rules() -> Vec<RewriteRule> {
    use Effect::Preserving;
    vec![
        RewriteRule::new("commute", 1.0, Preserving, is_commutative, commute),
        RewriteRule::new("flip_comparison", 1.0, Preserving, is_comparison, flip_comparison),
        RewriteRule::new("negate_comparison", 0.8, Preserving, is_comparison, negate_comparison),
        RewriteRule::new("add_sub_constant", 1.0, Preserving, is_field, add_sub_constant),
        RewriteRule::new("xor_twice", 0.8, Preserving, is_field, xor_twice),
        RewriteRule::new("sub_to_add_neg", 1.0, Preserving, is_sub, sub_to_add_neg),
        RewriteRule::new("double_negation", 0.6, Preserving, is_field, double_negation),
        RewriteRule::new("double_not", 0.6, Preserving, is_bool, double_not),
        RewriteRule::new("mul_identity", 0.5, Preserving, is_field, mul_identity),
        RewriteRule::new("mul_distribute", 0.8, Preserving, is_mul_over_add, mul_distribute),
        RewriteRule::new("div_rem_decompose", 0.5, Preserving, is_field, div_rem_decompose),
        RewriteRule::new("de_morgan", 0.8, Preserving, is_and_or, de_morgan),
        RewriteRule::new("bool_roundtrip", 0.5, Preserving, is_bool, bool_roundtrip),
        RewriteRule::new("xor_as_ne", 0.5, Preserving, is_bool_xor, xor_as_ne),
        RewriteRule::new("shift_amount_mask", 0.4, Preserving, is_shift, shift_amount_mask),
    ]
}

fn perturbing_rules() -> Vec<RewriteRule> {
    use Effect::Perturbing;
    vec![
        RewriteRule::new("off_by_one", 0.3, Perturbing, is_field, off_by_one),
        RewriteRule::new("swap_subtraction", 0.3, Perturbing, is_sub, swap_subtraction),
        RewriteRule::new("negate_bool", 0.3, Perturbing, is_bool, negate_bool),
    ]
}

// Predicates

fn is_field(e: &Expr) -> bool {
    e.kind() == Kind::Field
}

fn is_bool(e: &Expr) -> bool {
    e.kind() == Kind::Bool
}

fn binary_op(e: &Expr) -> Option<BinaryOp> {
    match e {
        Expr::Binary { op, .. } => Some(*op),
        _ => None,
    }
}

fn is_commutative(e: &Expr) -> bool {
    binary_op(e).map_or(false, |op| op.is_commutative())
}

fn is_comparison(e: &Expr) -> bool {
    binary_op(e).map_or(false, |op| op.is_comparison())
}

fn is_sub(e: &Expr) -> bool {
    binary_op(e) == Some(BinaryOp::Sub)
}

fn is_and_or(e: &Expr) -> bool {
    matches!(binary_op(e), Some(BinaryOp::And) | Some(BinaryOp::Or))
}

fn is_bool_xor(e: &Expr) -> bool {
    binary_op(e) == Some(BinaryOp::Xor)
}

fn is_shift(e: &Expr) -> bool {
    matches!(binary_op(e), Some(BinaryOp::Shl) | Some(BinaryOp::Shr))
}

fn is_mul_over_add(e: &Expr) -> bool {
    match e {
        Expr::Binary {
            op: BinaryOp::Mul,
            lhs,
            rhs,
            ..
        } => binary_op(lhs) == Some(BinaryOp::Add) || binary_op(rhs) == Some(BinaryOp::Add),
        _ => false,
    }
}

// Builders

fn split_binary(e: &Expr) -> Option<(BinaryOp, &Expr, &Expr)> {
    match e {
        Expr::Binary { op, lhs, rhs, .. } => Some((*op, &**lhs, &**rhs)),
        _ => None,
    }
}

fn commute(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (op, lhs, rhs) = split_binary(e)?;
    Some(Expr::binary(op, rhs.clone(), lhs.clone()))
}

fn flip_comparison(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (op, lhs, rhs) = split_binary(e)?;
    Some(Expr::binary(op.flipped()?, rhs.clone(), lhs.clone()))
}

fn negate_comparison(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (op, lhs, rhs) = split_binary(e)?;
    Some(Expr::unary(
        UnaryOp::Not,
        Expr::binary(op.negated()?, lhs.clone(), rhs.clone()),
    ))
}

fn add_sub_constant(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let c = ctx.field_constant();
    Some(Expr::binary(
        BinaryOp::Sub,
        Expr::binary(BinaryOp::Add, e.clone(), c.clone()),
        c,
    ))
}

fn xor_twice(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let c = ctx.field_constant();
    Some(Expr::binary(
        BinaryOp::BitXor,
        Expr::binary(BinaryOp::BitXor, e.clone(), c.clone()),
        c,
    ))
}

fn sub_to_add_neg(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (_, lhs, rhs) = split_binary(e)?;
    Some(Expr::binary(
        BinaryOp::Add,
        lhs.clone(),
        Expr::unary(UnaryOp::Neg, rhs.clone()),
    ))
}

fn double_negation(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    Some(Expr::unary(UnaryOp::Neg, Expr::unary(UnaryOp::Neg, e.clone())))
}

fn double_not(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    Some(Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Not, e.clone())))
}

fn mul_identity(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    Some(Expr::binary(BinaryOp::Mul, e.clone(), ctx.literal(1)?))
}

fn mul_distribute(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (_, lhs, rhs) = split_binary(e)?;
    // a * (b + c) and (b + c) * a both become a*b + a*c
    let (factor, sum) = match split_binary(rhs) {
        Some((BinaryOp::Add, _, _)) => (lhs, rhs),
        _ => (rhs, lhs),
    };
    let (_, b, c) = split_binary(sum)?;
    Some(Expr::binary(
        BinaryOp::Add,
        Expr::binary(BinaryOp::Mul, factor.clone(), b.clone()),
        Expr::binary(BinaryOp::Mul, factor.clone(), c.clone()),
    ))
}

// (e / c) * c + e % c == e for every c, including 0 under RV32 division.
fn div_rem_decompose(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let c = ctx.field_constant();
    Some(Expr::binary(
        BinaryOp::Add,
        Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Div, e.clone(), c.clone()),
            c.clone(),
        ),
        Expr::binary(BinaryOp::Rem, e.clone(), c),
    ))
}

fn de_morgan(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (op, lhs, rhs) = split_binary(e)?;
    let dual = match op {
        BinaryOp::And => BinaryOp::Or,
        BinaryOp::Or => BinaryOp::And,
        _ => return None,
    };
    Some(Expr::unary(
        UnaryOp::Not,
        Expr::binary(
            dual,
            Expr::unary(UnaryOp::Not, lhs.clone()),
            Expr::unary(UnaryOp::Not, rhs.clone()),
        ),
    ))
}

fn bool_roundtrip(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    Some(Expr::binary(
        BinaryOp::Eq,
        Expr::cast(e.clone()),
        Expr::cast(ctx.truth(true)),
    ))
}

fn xor_as_ne(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (_, lhs, rhs) = split_binary(e)?;
    Some(Expr::binary(
        BinaryOp::Ne,
        Expr::cast(lhs.clone()),
        Expr::cast(rhs.clone()),
    ))
}

fn shift_amount_mask(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (op, lhs, rhs) = split_binary(e)?;
    Some(Expr::binary(
        op,
        lhs.clone(),
        Expr::binary(BinaryOp::BitAnd, rhs.clone(), ctx.literal(31)?),
    ))
}

fn off_by_one(e: &Expr, ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    Some(Expr::binary(
        BinaryOp::Add,
        e.clone(),
        Expr::cast(ctx.truth(true)),
    ))
}

fn swap_subtraction(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    let (op, lhs, rhs) = split_binary(e)?;
    Some(Expr::binary(op, rhs.clone(), lhs.clone()))
}

fn negate_bool(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
    Some(Expr::unary(UnaryOp::Not, e.clone()))
}
