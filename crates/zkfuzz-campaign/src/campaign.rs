//! One fuzzing campaign against one zkVM target.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use zkfuzz_core::{CampaignId, ProjectFlags, TargetConfig};
use zkfuzz_ir::{
    BinaryOp, Bundle, BundleGenerator, Circuit, GenerationConfig, GuestEmitter, Operator,
};
use zkfuzz_runtime::{Executor, Outcome};
use zkfuzz_target::taxonomy::PREFERRED_WEIGHT;
use zkfuzz_target::{
    install, preferred_instructions, GitCli, InstallRequest, InstrKind, RevisionRegistry, Target,
};

/// Metadata handed to whoever scaffolds the guest project around a bundle
#[derive(Debug, Serialize)]
struct ProjectManifest<'a> {
    campaign: CampaignId,
    target: Target,
    revision: &'a str,
    toolchain: Option<&'a str>,
    flags: ProjectFlags,
    injection: Option<&'static str>,
    expected: u32,
    circuits: Vec<&'a str>,
}

/// One non-passing execution
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub campaign: CampaignId,
    pub target: Target,
    pub bundle: usize,
    pub circuit: String,
    pub rewrites: Vec<String>,
    pub perturbed: bool,
    pub injection: Option<&'static str>,
    pub outcome: Outcome,
    pub fingerprints: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub bundles: usize,
    pub circuits: usize,
    /// Count per outcome label; empty when nothing was executed
    pub outcomes: BTreeMap<&'static str, usize>,
    pub findings: usize,
}

pub struct Campaign {
    id: CampaignId,
    target: Target,
    config: TargetConfig,
    generation: GenerationConfig,
    bundles: usize,
    dir: PathBuf,
    rng: ChaCha8Rng,
}

impl Campaign {
    /// `seed` should already be specific to this target
    pub fn new(
        target: Target,
        config: TargetConfig,
        generation: GenerationConfig,
        bundles: usize,
        output_dir: &Path,
        seed: u64,
    ) -> Self {
        let id = CampaignId::new();
        let dir = output_dir.join(target.to_string()).join(id.to_string());
        Self {
            id,
            target,
            config,
            generation,
            bundles,
            dir,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> CampaignId {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[instrument(skip(self), fields(campaign = %self.id, zkvm = %self.target))]
    pub async fn run(mut self) -> Result<Summary> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        self.prepare_checkout().await?;

        let mut shape = self.generation.shape.clone();
        if shape.operators.is_none() {
            shape.operators = operator_pool(&preferred_instructions(&self.config)?);
        }
        let rules = self.generation.rule_set();
        let generator = BundleGenerator::new(rules, shape);
        let emitter = GuestEmitter::default();

        let mut summary = Summary::default();
        for index in 0..self.bundles {
            let budgets = self.generation.draw_budgets(&mut self.rng)?;
            let bundle = generator.generate(
                &mut self.rng,
                budgets.values,
                budgets.rewrites,
                budgets.batch_size,
                self.generation.iterative_rewrite,
            )?;
            let injection = self.target.select_injection(&self.config, &mut self.rng)?;
            info!(
                bundle = index,
                circuits = bundle.len(),
                rewrites = budgets.rewrites,
                expected = bundle.expected(),
                injection,
                "Generated bundle"
            );

            let bundle_dir = self.dir.join(format!("bundle_{:04}", index));
            self.write_bundle(&bundle_dir, &bundle, &emitter, injection)?;

            summary.bundles += 1;
            summary.circuits += bundle.len();

            let Some(executor) = Executor::from_config(&self.config, &bundle_dir) else {
                continue;
            };
            for (circuit, outcome) in self.execute(&executor, &bundle, injection).await {
                *summary.outcomes.entry(outcome.label()).or_default() += 1;
                // Perturbed circuits are expected to disagree.
                if outcome.is_finding() && !circuit.perturbed {
                    summary.findings += 1;
                }
                if outcome != Outcome::Passed {
                    self.record(index, circuit, injection, outcome)?;
                }
            }
        }

        info!(
            bundles = summary.bundles,
            circuits = summary.circuits,
            findings = summary.findings,
            "Campaign finished"
        );
        Ok(summary)
    }

    /// Clone or reset the target checkout when one is configured
    async fn prepare_checkout(&self) -> Result<()> {
        let (Some(dir), Some(url)) = (&self.config.checkout_dir, &self.config.remote_url) else {
            if self.config.fault_injection {
                warn!("Fault injection requested without checkout_dir and remote_url");
            }
            return Ok(());
        };

        let request = InstallRequest {
            target: self.target,
            path: PathBuf::from(dir),
            remote_url: url.clone(),
            revision: self.config.revision.clone(),
            fault_injection: self.config.fault_injection,
        };
        let report = tokio::task::spawn_blocking(move || {
            install(&GitCli::default(), &request, RevisionRegistry::global())
        })
        .await??;
        debug!(cloned = report.cloned, injected = ?report.injected, "Checkout ready");
        Ok(())
    }

    fn write_bundle(
        &self,
        dir: &Path,
        bundle: &Bundle,
        emitter: &GuestEmitter,
        injection: Option<&'static str>,
    ) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("bundle.json"), bundle.to_json()?)?;
        std::fs::write(dir.join("bundle.bin"), bundle.to_bytes()?)?;
        std::fs::write(dir.join("guest.rs"), emitter.emit_bundle(bundle)?)?;

        let manifest = ProjectManifest {
            campaign: self.id,
            target: self.target,
            revision: &self.config.revision,
            toolchain: self.config.toolchain.as_deref(),
            flags: self.config.flags(),
            injection,
            expected: bundle.expected(),
            circuits: bundle.circuits().iter().map(|c| c.name.as_str()).collect(),
        };
        std::fs::write(
            dir.join("project.json"),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(())
    }

    /// Build once, then run every circuit. Failures of one circuit never stop
    /// the others.
    async fn execute<'b>(
        &self,
        executor: &Executor,
        bundle: &'b Bundle,
        injection: Option<&'static str>,
    ) -> Vec<(&'b Circuit, Outcome)> {
        let expected = bundle.expected();

        let build = match executor.build().await {
            Ok(build) => build,
            Err(e) => {
                error!("Build could not be started: {}", e);
                return Vec::new();
            }
        };
        if let Some(report) = build {
            let outcome = report.classify(expected);
            warn!(outcome = outcome.label(), "Build did not complete");
            return bundle
                .circuits()
                .iter()
                .map(|c| (c, outcome.clone()))
                .collect();
        }

        let mut results = Vec::with_capacity(bundle.len());
        for circuit in bundle.circuits() {
            let mut env = vec![("ZKFUZZ_CIRCUIT".to_string(), circuit.name.clone())];
            if let Some(kind) = injection {
                env.push(("ZKFUZZ_INJECT".to_string(), kind.to_string()));
            }
            if self.config.trace_collection {
                env.push(("ZKFUZZ_TRACE".to_string(), "1".to_string()));
            }

            match executor.run(&env).await {
                Ok(report) => {
                    let outcome = report.classify(expected);
                    debug!(circuit = %circuit.name, outcome = outcome.label(), "Executed");
                    results.push((circuit, outcome));
                }
                Err(e) => error!(circuit = %circuit.name, "Run could not be started: {}", e),
            }
        }
        results
    }

    fn record(
        &self,
        bundle: usize,
        circuit: &Circuit,
        injection: Option<&'static str>,
        outcome: Outcome,
    ) -> Result<()> {
        let fingerprints = match &outcome {
            Outcome::Crashed { panics, .. } => panics.iter().map(|p| p.fingerprint()).collect(),
            _ => Vec::new(),
        };
        let finding = Finding {
            campaign: self.id,
            target: self.target,
            bundle,
            circuit: circuit.name.clone(),
            rewrites: circuit.rewrites.clone(),
            perturbed: circuit.perturbed,
            injection,
            outcome,
            fingerprints,
            recorded_at: Utc::now(),
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("findings.jsonl"))?;
        writeln!(file, "{}", serde_json::to_string(&finding)?)?;
        Ok(())
    }
}

fn instruction_for(op: Operator) -> Option<InstrKind> {
    let Operator::Binary(op) = op else {
        return None;
    };
    Some(match op {
        BinaryOp::Add => InstrKind::Add,
        BinaryOp::Sub => InstrKind::Sub,
        BinaryOp::Mul => InstrKind::Mul,
        BinaryOp::Div => InstrKind::Divu,
        BinaryOp::Rem => InstrKind::Remu,
        BinaryOp::BitAnd | BinaryOp::And => InstrKind::And,
        BinaryOp::BitOr | BinaryOp::Or => InstrKind::Or,
        BinaryOp::BitXor | BinaryOp::Xor => InstrKind::Xor,
        BinaryOp::Shl => InstrKind::Sll,
        BinaryOp::Shr => InstrKind::Srl,
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => InstrKind::Sltu,
        BinaryOp::Eq | BinaryOp::Ne => InstrKind::Branch,
    })
}

/// Operator pool biased toward the preferred instructions, or `None` for the
/// unbiased default. Seed generation draws uniformly from the pool, so
/// repeating an operator raises its weight.
fn operator_pool(preferred: &[InstrKind]) -> Option<Vec<Operator>> {
    if preferred.is_empty() {
        return None;
    }
    let copies = PREFERRED_WEIGHT as usize;
    let mut pool = Vec::new();
    for op in Operator::all() {
        let favoured = instruction_for(op).map_or(false, |kind| preferred.contains(&kind));
        let n = if favoured { copies } else { 1 };
        pool.extend(std::iter::repeat(op).take(n));
    }
    Some(pool)
}
