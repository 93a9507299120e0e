//! Metamorphic bundle generation.
//!
//! A bundle starts from one random seed circuit. Every further circuit in the
//! bundle is the seed after a bounded number of rewrite steps drawn from a
//! [`RuleSet`]. All randomness comes from the caller's `ChaCha8Rng`, so a
//! bundle is reproducible from the rng state and the arguments alone.

use crate::circuit::{Bundle, Circuit, Input};
use crate::expr::{Expr, Kind, Operator};
use crate::rewrite::{Effect, RewriteContext, RewriteRule, RuleSet};
use crate::validation::{check_kinds, validate_circuit};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};
use zkfuzz_core::{bernoulli, choose_weighted, weighted_select, Bounds, Error, Result};

/// How the number of rewrite steps per variant is drawn from `[0, budget]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteDistribution {
    /// Weight `1 + min(k, budget - k)`, peaking at the midpoint
    Triangular,
    Uniform,
}

/// Shape of seed circuits and details of the rewrite loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Maximum depth of the seed expression tree
    pub max_depth: usize,
    /// Number of declared field inputs
    pub field_variables: usize,
    /// Number of declared boolean inputs
    pub bool_variables: usize,
    /// Operators available to seed trees; `None` means every operator
    pub operators: Option<Vec<Operator>>,
    /// Probability of stopping at a leaf below the root
    pub leaf_probability: f64,
    /// Kind of the circuit output
    pub output_kind: Kind,
    pub rewrite_distribution: RewriteDistribution,
    /// Fresh rule draws per step before the step becomes a no-op
    pub max_rule_attempts: usize,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            field_variables: 2,
            bool_variables: 1,
            operators: None,
            leaf_probability: 0.3,
            output_kind: Kind::Field,
            rewrite_distribution: RewriteDistribution::Triangular,
            max_rule_attempts: 4,
        }
    }
}

/// Campaign-level generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub min_value: u32,
    pub max_value: u32,
    pub min_rewrites: usize,
    pub max_rewrites: usize,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    /// Re-derive candidate rules from the already rewritten tree at each step
    pub iterative_rewrite: bool,
    /// Allow rules that deliberately change the output
    pub include_perturbing_rules: bool,
    pub shape: ShapeConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_value: 0,
            max_value: u32::MAX,
            min_rewrites: 0,
            max_rewrites: 5,
            min_batch_size: 1,
            max_batch_size: 10,
            iterative_rewrite: true,
            include_perturbing_rules: false,
            shape: ShapeConfig::default(),
        }
    }
}

/// Budgets for a single `generate` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    pub values: Bounds<u32>,
    pub rewrites: usize,
    pub batch_size: usize,
}

impl GenerationConfig {
    pub fn rule_set(&self) -> &'static RuleSet {
        if self.include_perturbing_rules {
            RuleSet::with_perturbing()
        } else {
            RuleSet::standard()
        }
    }

    /// Draw the rewrite budget and batch size for one bundle
    pub fn draw_budgets(&self, rng: &mut ChaCha8Rng) -> Result<Budgets> {
        let values = Bounds::new(self.min_value, self.max_value);
        let rewrites = Bounds::new(self.min_rewrites, self.max_rewrites);
        let batch = Bounds::new(self.min_batch_size, self.max_batch_size);
        values.validate("value range")?;
        rewrites.validate("rewrite count")?;
        batch.validate("batch size")?;
        if batch.min == 0 {
            return Err(Error::InvalidBounds("batch size must be at least 1".to_string()));
        }

        Ok(Budgets {
            values,
            rewrites: rng.gen_range(rewrites.min..=rewrites.max),
            batch_size: rng.gen_range(batch.min..=batch.max),
        })
    }
}

pub struct BundleGenerator<'r> {
    rules: &'r RuleSet,
    shape: ShapeConfig,
}

struct Rewritten<'r> {
    rule: &'r RewriteRule,
    replacement: Expr,
}

impl<'r> BundleGenerator<'r> {
    pub fn new(rules: &'r RuleSet, shape: ShapeConfig) -> Self {
        Self { rules, shape }
    }

    /// Generate a bundle of `batch_size` circuits: the seed first, then
    /// `batch_size - 1` variants each rewritten by at most `rewrite_budget` steps.
    ///
    /// Bounds are validated before any randomness is consumed.
    pub fn generate(
        &self,
        rng: &mut ChaCha8Rng,
        values: Bounds<u32>,
        rewrite_budget: usize,
        batch_size: usize,
        iterative: bool,
    ) -> Result<Bundle> {
        values.validate("value range")?;
        if batch_size == 0 {
            return Err(Error::InvalidBounds("batch size must be at least 1".to_string()));
        }
        if self.shape.max_rule_attempts == 0 {
            return Err(Error::InvalidBounds("max_rule_attempts must be at least 1".to_string()));
        }
        if self.rules.is_empty() && rewrite_budget > 0 && batch_size > 1 {
            return Err(Error::EmptyInput("rewrite rule set".to_string()));
        }

        let seed = self.seed_circuit(rng, values)?;
        let expected = seed.evaluate()?;
        debug!(
            size = seed.root.size(),
            depth = seed.root.depth(),
            expected,
            "Generated seed circuit"
        );

        let mut circuits = Vec::with_capacity(batch_size);
        circuits.push(seed);

        for index in 1..batch_size {
            let steps = self.draw_step_count(rng, rewrite_budget)?;
            let seed = &circuits[0];
            let variant = if iterative {
                self.rewrite_iterative(seed, index, steps, rng, values)
            } else {
                self.rewrite_planned(seed, index, steps, rng, values)
            };
            validate_circuit(&variant)?;
            trace!(
                variant = index,
                steps,
                applied = variant.rewrites.len(),
                "Rewrote variant"
            );
            circuits.push(variant);
        }

        Ok(Bundle::new(circuits, expected))
    }

    fn seed_circuit(&self, rng: &mut ChaCha8Rng, values: Bounds<u32>) -> Result<Circuit> {
        let mut inputs = Vec::new();
        for i in 0..self.shape.field_variables {
            let value = rng.gen_range(values.min..=values.max);
            inputs.push(Input::new(format!("f{}", i), Kind::Field, value));
        }
        for i in 0..self.shape.bool_variables {
            let value = bernoulli(0.5, rng) as u32;
            inputs.push(Input::new(format!("b{}", i), Kind::Bool, value));
        }

        let pool = self.shape.operators.clone().unwrap_or_else(Operator::all);
        let root = self.random_expr(
            rng,
            self.shape.output_kind,
            self.shape.max_depth,
            true,
            &inputs,
            &pool,
            values,
        );

        let circuit = Circuit::new("seed", inputs, root);
        validate_circuit(&circuit)?;
        Ok(circuit)
    }

    #[allow(clippy::too_many_arguments)]
    fn random_expr(
        &self,
        rng: &mut ChaCha8Rng,
        kind: Kind,
        depth: usize,
        is_root: bool,
        inputs: &[Input],
        pool: &[Operator],
        values: Bounds<u32>,
    ) -> Expr {
        let candidates: Vec<Operator> = pool
            .iter()
            .copied()
            .filter(|op| op.result_kind() == kind)
            .collect();

        let stop = depth == 0
            || candidates.is_empty()
            || (!is_root && bernoulli(self.shape.leaf_probability, rng));
        if stop {
            return self.random_leaf(rng, kind, inputs, values);
        }

        let child = |rng: &mut ChaCha8Rng, kind: Kind| {
            self.random_expr(rng, kind, depth - 1, false, inputs, pool, values)
        };

        match candidates[rng.gen_range(0..candidates.len())] {
            Operator::Unary(op) => {
                let operand = child(rng, op.operand_kind());
                Expr::unary(op, operand)
            }
            Operator::Binary(op) => {
                let lhs = child(rng, op.operand_kind());
                let rhs = child(rng, op.operand_kind());
                Expr::binary(op, lhs, rhs)
            }
            Operator::Cast => Expr::cast(child(rng, Kind::Bool)),
        }
    }

    fn random_leaf(
        &self,
        rng: &mut ChaCha8Rng,
        kind: Kind,
        inputs: &[Input],
        values: Bounds<u32>,
    ) -> Expr {
        let vars: Vec<&Input> = inputs.iter().filter(|i| i.kind == kind).collect();
        if !vars.is_empty() && bernoulli(0.5, rng) {
            let input = vars[rng.gen_range(0..vars.len())];
            return Expr::var(kind, input.name.clone());
        }
        // Bool literals are spelled as comparisons so every constant stays in range.
        match kind {
            Kind::Field => Expr::field(rng.gen_range(values.min..=values.max)),
            Kind::Bool => {
                let value = bernoulli(0.5, rng);
                Expr::truth(value, rng.gen_range(values.min..=values.max))
            }
        }
    }

    fn draw_step_count(&self, rng: &mut ChaCha8Rng, budget: usize) -> Result<usize> {
        match self.shape.rewrite_distribution {
            RewriteDistribution::Uniform => Ok(rng.gen_range(0..=budget)),
            RewriteDistribution::Triangular => {
                let counts: Vec<usize> = (0..=budget).collect();
                let weights: HashMap<usize, f64> = counts
                    .iter()
                    .map(|&k| (k, 1.0 + k.min(budget - k) as f64))
                    .collect();
                Ok(*weighted_select(&counts, &weights, rng)?)
            }
        }
    }

    /// Pick a rule for `target` and build its replacement, redrawing when a
    /// rule declines or yields a tree of the wrong kind.
    fn rewrite_once(
        &self,
        target: &Expr,
        rng: &mut ChaCha8Rng,
        values: Bounds<u32>,
    ) -> Option<Rewritten<'r>> {
        let candidates = self.rules.rules_matching(target);
        if candidates.is_empty() {
            return None;
        }

        for _ in 0..self.shape.max_rule_attempts {
            let rule: &'r RewriteRule = *choose_weighted(&candidates, rng).ok()?;
            let mut ctx = RewriteContext {
                rng: &mut *rng,
                values,
            };
            let Some(replacement) = rule.apply(target, &mut ctx) else {
                continue;
            };
            match check_kinds(&replacement) {
                Ok(kind) if kind == target.kind() => return Some(Rewritten { rule, replacement }),
                _ => warn!(rule = rule.name, "Rejected ill-kinded rewrite"),
            }
        }
        None
    }

    /// Each step picks a node of the current tree, so later steps see earlier rewrites.
    fn rewrite_iterative(
        &self,
        seed: &Circuit,
        index: usize,
        steps: usize,
        rng: &mut ChaCha8Rng,
        values: Bounds<u32>,
    ) -> Circuit {
        let mut variant = self.blank_variant(seed, index);

        for _ in 0..steps {
            let paths = variant.root.paths();
            let path = &paths[rng.gen_range(0..paths.len())];
            let Some(target) = variant.root.at(path) else {
                continue;
            };
            let Some(rewritten) = self.rewrite_once(target, rng, values) else {
                continue;
            };
            if let Some(root) = variant.root.replace_at(path, rewritten.replacement) {
                variant.root = root;
                record(&mut variant, rewritten.rule);
            }
        }
        variant
    }

    /// Every step is planned against the seed tree and built on its own copy
    /// of the seed subtree; the plans are then spliced in order. A plan whose
    /// node was already changed by an earlier splice is dropped.
    fn rewrite_planned(
        &self,
        seed: &Circuit,
        index: usize,
        steps: usize,
        rng: &mut ChaCha8Rng,
        values: Bounds<u32>,
    ) -> Circuit {
        let paths = seed.root.paths();
        let mut plans = Vec::with_capacity(steps);
        for _ in 0..steps {
            let path = &paths[rng.gen_range(0..paths.len())];
            let Some(original) = seed.root.at(path) else {
                continue;
            };
            if let Some(rewritten) = self.rewrite_once(original, rng, values) {
                plans.push((path.clone(), original, rewritten));
            }
        }

        let mut variant = self.blank_variant(seed, index);
        for (path, original, rewritten) in plans {
            if variant.root.at(&path) != Some(original) {
                debug!(rule = rewritten.rule.name, "Planned rewrite superseded");
                continue;
            }
            if let Some(root) = variant.root.replace_at(&path, rewritten.replacement) {
                variant.root = root;
                record(&mut variant, rewritten.rule);
            }
        }
        variant
    }

    fn blank_variant(&self, seed: &Circuit, index: usize) -> Circuit {
        let mut variant = seed.clone();
        variant.name = format!("variant_{}", index);
        variant
    }
}

fn record(circuit: &mut Circuit, rule: &RewriteRule) {
    circuit.rewrites.push(rule.name.to_string());
    if rule.effect == Effect::Perturbing {
        circuit.perturbed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, UnaryOp};
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn generator() -> BundleGenerator<'static> {
        BundleGenerator::new(RuleSet::standard(), ShapeConfig::default())
    }

    fn full_range() -> Bounds<u32> {
        Bounds::new(0, u32::MAX)
    }

    #[test]
    fn test_end_to_end_bundle() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
        let bundle = generator()
            .generate(&mut rng, full_range(), 5, 10, true)
            .unwrap();

        assert_eq!(bundle.len(), 10);
        for circuit in bundle.circuits() {
            assert!(validate_circuit(circuit).is_ok());
            assert!(circuit.rewrites.len() <= 5);
            assert!(!circuit.perturbed);
        }
        assert!(bundle.seed().is_seed());
        assert_eq!(bundle.expected(), bundle.seed().evaluate().unwrap());
    }

    #[test]
    fn test_generation_is_deterministic() {
        for iterative in [true, false] {
            let mut a = ChaCha8Rng::seed_from_u64(0xC0FFEE);
            let mut b = ChaCha8Rng::seed_from_u64(0xC0FFEE);
            let first = generator()
                .generate(&mut a, full_range(), 5, 10, iterative)
                .unwrap();
            let second = generator()
                .generate(&mut b, full_range(), 5, 10, iterative)
                .unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_variants_preserve_expected_output() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bundle = generator()
                .generate(&mut rng, full_range(), 6, 8, seed % 2 == 0)
                .unwrap();
            for circuit in bundle.circuits() {
                assert_eq!(circuit.evaluate().unwrap(), bundle.expected());
            }
        }
    }

    #[test]
    fn test_rewrites_actually_happen() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bundle = generator()
            .generate(&mut rng, full_range(), 8, 10, true)
            .unwrap();
        assert!(bundle.variants().iter().any(|c| !c.rewrites.is_empty()));
        assert!(bundle.variants().iter().any(|c| c.root != bundle.seed().root));
    }

    #[test]
    fn test_invalid_bounds_rejected_before_randomness() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let untouched = rng.clone();

        let err = generator()
            .generate(&mut rng, Bounds::new(10, 5), 3, 4, true)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBounds(_)));

        let err = generator()
            .generate(&mut rng, full_range(), 3, 0, true)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBounds(_)));

        assert_eq!(rng, untouched);
    }

    #[test]
    fn test_empty_rule_set_is_fatal() {
        let empty = RuleSet::new(Vec::new()).unwrap();
        let generator = BundleGenerator::new(&empty, ShapeConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let err = generator.generate(&mut rng, full_range(), 3, 4, true).unwrap_err();
        assert!(matches!(err, Error::EmptyInput(_)));

        // Nothing to rewrite, nothing to fail.
        assert_eq!(generator.generate(&mut rng, full_range(), 0, 4, true).unwrap().len(), 4);
    }

    #[test]
    fn test_zero_budget_copies_seed() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let bundle = generator()
            .generate(&mut rng, full_range(), 0, 5, false)
            .unwrap();
        for variant in bundle.variants() {
            assert_eq!(variant.root, bundle.seed().root);
            assert!(variant.rewrites.is_empty());
        }
    }

    #[test]
    fn test_operator_pool_restricts_seed() {
        let shape = ShapeConfig {
            operators: Some(vec![Operator::Binary(BinaryOp::Add)]),
            bool_variables: 0,
            ..Default::default()
        };
        let generator = BundleGenerator::new(RuleSet::standard(), shape);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let bundle = generator.generate(&mut rng, full_range(), 0, 1, true).unwrap();

        fn only_add(e: &Expr) -> bool {
            match e {
                Expr::Binary { op, lhs, rhs, .. } => {
                    *op == BinaryOp::Add && only_add(lhs) && only_add(rhs)
                }
                Expr::Unary { .. } | Expr::Cast { .. } => false,
                _ => true,
            }
        }
        assert!(only_add(&bundle.seed().root));
    }

    #[test]
    fn test_bool_output_without_bool_operators() {
        // No operator yields a Bool, so the root degrades to a leaf.
        let shape = ShapeConfig {
            operators: Some(vec![Operator::Unary(UnaryOp::Neg)]),
            output_kind: Kind::Bool,
            ..Default::default()
        };
        let generator = BundleGenerator::new(RuleSet::standard(), shape);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let bundle = generator.generate(&mut rng, full_range(), 2, 3, true).unwrap();
        assert_eq!(bundle.seed().output_kind, Kind::Bool);
        assert!(bundle.seed().root.depth() <= 1);
        assert!(bundle
            .seed()
            .root
            .constants()
            .iter()
            .all(|(kind, _)| *kind == Kind::Field));
    }

    #[test]
    fn test_bool_constants_respect_narrow_range() {
        let values = Bounds::new(100, 200);
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bundle = BundleGenerator::new(RuleSet::with_perturbing(), ShapeConfig::default())
                .generate(&mut rng, values, 5, 10, seed % 2 == 0)
                .unwrap();
            for circuit in bundle.circuits() {
                for (kind, value) in circuit.root.constants() {
                    assert!(
                        values.contains(value),
                        "{} has {:?} constant {}",
                        circuit.name,
                        kind,
                        value
                    );
                }
            }
        }
    }

    fn any_expr(_: &Expr) -> bool {
        true
    }

    // Field + Bool never kind-checks.
    fn add_bool_literal(e: &Expr, _ctx: &mut RewriteContext<'_>) -> Option<Expr> {
        Some(Expr::binary(BinaryOp::Add, e.clone(), Expr::boolean(true)))
    }

    fn ill_kinded_rule() -> RewriteRule {
        RewriteRule::new("add_bool_literal", 5.0, Effect::Preserving, any_expr, add_bool_literal)
    }

    #[test]
    fn test_ill_kinded_rewrites_are_redrawn() {
        let rules = RuleSet::new(
            RuleSet::standard()
                .rules()
                .iter()
                .copied()
                .chain([ill_kinded_rule()])
                .collect(),
        )
        .unwrap();
        let generator = BundleGenerator::new(&rules, ShapeConfig::default());

        let mut applied = 0;
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bundle = generator
                .generate(&mut rng, full_range(), 6, 8, seed % 2 == 0)
                .unwrap();
            for circuit in bundle.circuits() {
                assert!(validate_circuit(circuit).is_ok());
                assert!(circuit.rewrites.len() <= 6);
                assert!(!circuit.rewrites.iter().any(|r| r == "add_bool_literal"));
                assert_eq!(circuit.evaluate().unwrap(), bundle.expected());
                applied += circuit.rewrites.len();
            }
        }
        assert!(applied > 0);
    }

    #[test]
    fn test_only_ill_kinded_rule_leaves_variants_unchanged() {
        let rules = RuleSet::new(vec![ill_kinded_rule()]).unwrap();
        let generator = BundleGenerator::new(&rules, ShapeConfig::default());

        for iterative in [true, false] {
            let mut rng = ChaCha8Rng::seed_from_u64(17);
            let bundle = generator
                .generate(&mut rng, full_range(), 5, 6, iterative)
                .unwrap();
            assert_eq!(bundle.len(), 6);
            for variant in bundle.variants() {
                assert_eq!(variant.root, bundle.seed().root);
                assert!(variant.rewrites.is_empty());
                assert!(!variant.perturbed);
            }
        }
    }

    #[test]
    fn test_triangular_step_counts_peak_at_midpoint() {
        let generator = generator();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let budget = 6;
        let mut counts = [0usize; 7];
        for _ in 0..4000 {
            counts[generator.draw_step_count(&mut rng, budget).unwrap()] += 1;
        }

        // Weights 1,2,3,4,3,2,1: the midpoint is four times as likely as either end.
        assert!(counts[3] > 2 * counts[0]);
        assert!(counts[3] > 2 * counts[6]);
        assert!(counts[3] > counts[1]);
        assert!(counts[3] > counts[5]);
        assert!(counts.iter().all(|&c| c > 0));
    }

    #[test]
    fn test_uniform_step_counts_cover_budget() {
        let shape = ShapeConfig {
            rewrite_distribution: RewriteDistribution::Uniform,
            ..Default::default()
        };
        let generator = BundleGenerator::new(RuleSet::standard(), shape);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut counts = [0usize; 4];
        for _ in 0..2000 {
            counts[generator.draw_step_count(&mut rng, 3).unwrap()] += 1;
        }
        // Roughly 500 each
        assert!(counts.iter().all(|&c| (350..650).contains(&c)));
    }

    #[test]
    fn test_perturbing_rules_mark_variants() {
        let generator = BundleGenerator::new(RuleSet::with_perturbing(), ShapeConfig::default());
        let mut saw_perturbed = false;
        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bundle = generator.generate(&mut rng, full_range(), 10, 10, true).unwrap();
            for variant in bundle.variants() {
                let perturbing = variant.rewrites.iter().any(|name| {
                    RuleSet::with_perturbing()
                        .get(name)
                        .map_or(false, |r| r.effect == Effect::Perturbing)
                });
                assert_eq!(variant.perturbed, perturbing);
                saw_perturbed |= perturbing;
            }
        }
        assert!(saw_perturbed);
    }

    #[test]
    fn test_draw_budgets() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let config = GenerationConfig {
            min_rewrites: 2,
            max_rewrites: 4,
            min_batch_size: 3,
            max_batch_size: 3,
            ..Default::default()
        };
        for _ in 0..20 {
            let budgets = config.draw_budgets(&mut rng).unwrap();
            assert!((2..=4).contains(&budgets.rewrites));
            assert_eq!(budgets.batch_size, 3);
        }

        let bad = GenerationConfig {
            min_batch_size: 0,
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(bad.draw_budgets(&mut rng), Err(Error::InvalidBounds(_))));
    }

    #[test]
    fn test_generation_config_deserializes_partial() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"max_rewrites": 9, "shape": {"max_depth": 2}}"#).unwrap();
        assert_eq!(config.max_rewrites, 9);
        assert_eq!(config.shape.max_depth, 2);
        assert_eq!(config.shape.field_variables, 2);
        assert!(config.iterative_rewrite);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_bundles_respect_bounds(
            seed in any::<u64>(),
            min in 0u32..1_000,
            span in 0u32..1_000,
            budget in 0usize..6,
            batch in 1usize..6,
            iterative in any::<bool>(),
        ) {
            let values = Bounds::new(min, min + span);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bundle = generator().generate(&mut rng, values, budget, batch, iterative).unwrap();

            prop_assert_eq!(bundle.len(), batch);
            for circuit in bundle.circuits() {
                prop_assert!(validate_circuit(circuit).is_ok());
                prop_assert!(circuit.rewrites.len() <= budget);
                prop_assert_eq!(circuit.evaluate().unwrap(), bundle.expected());
                for (_, value) in circuit.root.constants() {
                    prop_assert!(values.contains(value));
                }
                for input in circuit.inputs.iter().filter(|i| i.kind == Kind::Field) {
                    prop_assert!(values.contains(input.value));
                }
            }
        }

        #[test]
        fn prop_same_seed_same_bundle(seed in any::<u64>(), iterative in any::<bool>()) {
            let mut a = ChaCha8Rng::seed_from_u64(seed);
            let mut b = ChaCha8Rng::seed_from_u64(seed);
            let first = generator().generate(&mut a, full_range(), 4, 4, iterative).unwrap();
            let second = generator().generate(&mut b, full_range(), 4, 4, iterative).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
