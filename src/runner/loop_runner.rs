//! Generation loop - generate, execute and validate until a parser matches.
//!
//! Every attempt starts from a fresh prompt. Nothing carries over between
//! attempts except the attempt counter and, when enabled, the previous
//! attempt's diagnostic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::artifact::ArtifactStore;
use crate::dataset::{Dataset, RawTable, Schema};
use crate::domain::{
    ArtifactInfo, Attempt, AttemptOutcome, RunReport, RunState, Target, TargetPaths, code_digest,
};
use crate::llm::LlmClient;
use crate::prompt::{PromptContext, PromptRenderer, extract_code};
use crate::sandbox::Executor;
use crate::validation::Comparator;

/// Attempt budget when none is configured
pub const MAX_ATTEMPTS: u32 = 3;

/// Diagnostic recorded for the winning attempt
const MATCH_DIAGNOSTIC: &str = "Produced dataset matches the reference.";

/// Knobs for one run
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_attempts: u32,
    /// Put the previous attempt's diagnostic into the next prompt
    pub include_feedback: bool,
    /// Pause between failed attempts; zero means retry immediately
    pub retry_backoff: Duration,
    /// Sample document extension, shown to the model as the document kind
    pub document_ext: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            include_feedback: false,
            retry_backoff: Duration::ZERO,
            document_ext: "pdf".to_string(),
        }
    }
}

/// A candidate that ran successfully, kept until it is judged
struct Accepted {
    code: String,
    digest: String,
    produced: Dataset,
}

/// Drives the attempt state machine for a single target.
///
/// `run` never returns an error: run-level problems end in `Failed`, attempt
/// problems are recorded and the loop moves on.
pub struct GenerationLoop<L, E>
where
    L: LlmClient + ?Sized,
    E: Executor + ?Sized,
{
    llm: Arc<L>,
    executor: Arc<E>,
    renderer: PromptRenderer,
    target: Target,
    paths: TargetPaths,
    schema: Schema,
    config: LoopConfig,
}

impl<L, E> GenerationLoop<L, E>
where
    L: LlmClient + ?Sized,
    E: Executor + ?Sized,
{
    pub fn new(
        llm: Arc<L>,
        executor: Arc<E>,
        renderer: PromptRenderer,
        target: Target,
        paths: TargetPaths,
    ) -> Self {
        Self::with_config(llm, executor, renderer, target, paths, LoopConfig::default())
    }

    pub fn with_config(
        llm: Arc<L>,
        executor: Arc<E>,
        renderer: PromptRenderer,
        target: Target,
        paths: TargetPaths,
        config: LoopConfig,
    ) -> Self {
        Self {
            llm,
            executor,
            renderer,
            target,
            paths,
            schema: Schema::statement(),
            config,
        }
    }

    /// Run the loop to a terminal state
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new(self.target.as_str(), self.config.max_attempts);

        report.state = RunState::Validating;
        let comparator = match self.validate_inputs() {
            Ok(comparator) => comparator,
            Err(reason) => {
                log::error!("{}", reason);
                report.state = RunState::Failed(reason);
                return report;
            }
        };

        let mut seen: HashMap<String, u32> = HashMap::new();

        for ordinal in 1..=self.config.max_attempts {
            report.state = RunState::Iterating(ordinal);
            log::info!("--- ATTEMPT {}/{} ---", ordinal, self.config.max_attempts);

            let (attempt, accepted) = self
                .run_attempt(ordinal, report.attempts.last(), &comparator, &mut seen)
                .await;
            report.attempts.push(attempt);

            if let Some(accepted) = accepted {
                match self.persist(&accepted) {
                    Ok((parser, output)) => {
                        log::info!(
                            "Parser for '{}' accepted on attempt {}",
                            self.target,
                            ordinal
                        );
                        report.artifact = Some(ArtifactInfo {
                            parser,
                            output,
                            attempt: ordinal,
                            code_digest: accepted.digest,
                        });
                        report.state = RunState::Succeeded(ordinal);
                    }
                    Err(reason) => {
                        log::error!("{}", reason);
                        report.state = RunState::Failed(reason);
                    }
                }
                return report;
            }

            if ordinal < self.config.max_attempts && !self.config.retry_backoff.is_zero() {
                log::debug!("Waiting {:?} before the next attempt", self.config.retry_backoff);
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }

        log::warn!(
            "All {} attempts failed for '{}'. No parser was saved.",
            self.config.max_attempts,
            self.target
        );
        report.state = RunState::Exhausted;
        report
    }

    /// Check both inputs exist and load the reference once
    fn validate_inputs(&self) -> Result<Comparator, String> {
        let missing = self.paths.missing_inputs();
        if !missing.is_empty() {
            let list: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            return Err(format!("Missing required input: {}", list.join(", ")));
        }

        let reference = RawTable::from_csv_path(&self.paths.reference).map_err(|e| {
            format!(
                "Could not read reference dataset {}: {}",
                self.paths.reference.display(),
                e
            )
        })?;
        log::debug!(
            "Loaded reference dataset with {} rows",
            reference.row_count()
        );
        Ok(Comparator::new(self.schema.clone(), reference))
    }

    async fn run_attempt(
        &self,
        ordinal: u32,
        previous: Option<&Attempt>,
        comparator: &Comparator,
        seen: &mut HashMap<String, u32>,
    ) -> (Attempt, Option<Accepted>) {
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut attempt = Attempt {
            ordinal,
            code_digest: None,
            outcome: AttemptOutcome::ExecutionFailure,
            diagnostic: String::new(),
            started_at,
            elapsed_ms: 0,
        };

        let code = match self.generate(ordinal, previous, comparator.reference()).await {
            Ok(code) => code,
            Err(diagnostic) => {
                log::warn!("Attempt {} failed: {}", ordinal, diagnostic);
                attempt.diagnostic = diagnostic;
                attempt.elapsed_ms = elapsed_ms(clock);
                return (attempt, None);
            }
        };

        let digest = (!code.trim().is_empty()).then(|| code_digest(&code));
        if let Some(digest) = &digest {
            if let Some(first) = seen.get(digest) {
                log::info!(
                    "Attempt {} produced the same candidate as attempt {} ({})",
                    ordinal,
                    first,
                    digest
                );
            } else {
                seen.insert(digest.clone(), ordinal);
            }
        }
        attempt.code_digest = digest.clone();

        let accepted = match self.executor.execute(&code, &self.paths.sample_document).await {
            Err(e) => {
                log::warn!("Attempt {} failed: {}", ordinal, e);
                attempt.diagnostic = e.to_string();
                None
            }
            Ok(raw) => {
                let produced = comparator.normalize(raw);
                let verdict = comparator.check(&produced);
                if verdict.passed {
                    attempt.outcome = AttemptOutcome::Success;
                    attempt.diagnostic = MATCH_DIAGNOSTIC.to_string();
                    Some(Accepted {
                        digest: digest.unwrap_or_else(|| code_digest(&code)),
                        code,
                        produced,
                    })
                } else {
                    attempt.outcome = AttemptOutcome::Mismatch;
                    attempt.diagnostic = verdict.output;
                    log::warn!("Attempt {} failed: {}", ordinal, attempt.diagnostic);
                    None
                }
            }
        };

        attempt.elapsed_ms = elapsed_ms(clock);
        (attempt, accepted)
    }

    /// Render the prompt, call the generator and pull out the code.
    ///
    /// Every failure here is an attempt-level diagnostic.
    async fn generate(
        &self,
        ordinal: u32,
        previous: Option<&Attempt>,
        reference: &Dataset,
    ) -> Result<String, String> {
        let mut context = PromptContext::new(
            &self.target,
            &self.config.document_ext,
            &self.schema,
            reference,
            ordinal,
            self.config.max_attempts,
        );
        if self.config.include_feedback
            && let Some(previous) = previous
        {
            context = context.with_feedback(previous.ordinal, previous.diagnostic.clone());
        }

        let prompt = self
            .renderer
            .render(&context)
            .map_err(|e| format!("Prompt rendering failed: {}", e))?;
        log::debug!("Prompt for attempt {}:\n{}", ordinal, prompt);

        let response = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| format!("Generator call failed: {}", e))?;

        let code = extract_code(&response);
        log::debug!("Candidate for attempt {}:\n{}", ordinal, code);
        Ok(code)
    }

    /// Write the exported dataset, then the parser
    fn persist(&self, accepted: &Accepted) -> Result<(PathBuf, PathBuf), String> {
        let store = ArtifactStore::new(self.paths.clone());
        let describe = |e: crate::error::ParsegenError| format!("Failed to persist artifact: {}", e);

        store.prepare().map_err(describe)?;
        let output = store.save_output(&accepted.produced).map_err(describe)?;
        let parser = store.save_parser(&accepted.code).map_err(describe)?;
        Ok((parser, output))
    }
}

/// Milliseconds since `clock` started, saturating
fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}
