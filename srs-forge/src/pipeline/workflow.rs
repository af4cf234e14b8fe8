//! Pipeline orchestration
//!
//! Holds the ordered stage registration and threads one accumulated state
//! mapping through it: each stage receives the state so far and returns a
//! partial update merged last-write-wins. The whole sequence re-runs while
//! the verification stage has not set the completion flag, bounded by
//! `max_attempts`, and ends in an explicit terminal error when attempts are
//! exhausted.

use anyhow::{bail, Context, Result};
use srs_forge_sdk::{log_attempt_start, log_stage_complete, log_stage_failed, log_stage_start};
use std::path::Path;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::generator::ExternalGenerator;
use crate::pipeline::stage0_extract::ExtractStage;
use crate::pipeline::stage1_scaffold::ScaffoldStage;
use crate::pipeline::stage2_testgen::TestGenStage;
use crate::pipeline::stage3_codegen::CodeGenStage;
use crate::pipeline::stage4_readme::ReadmeStage;
use crate::pipeline::stage5_verify::VerifyStage;
use crate::pipeline::stage6_archive::ArchiveStage;
use crate::pipeline::types::{keys, PipelineState, Stage, StageContext};

/// Ordered stage sequence
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// The standard seven-stage generation sequence
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ExtractStage),
            Box::new(ScaffoldStage),
            Box::new(TestGenStage),
            Box::new(CodeGenStage),
            Box::new(ReadmeStage),
            Box::new(VerifyStage),
            Box::new(ArchiveStage),
        ])
    }

    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run the sequence to completion
    ///
    /// A stage error aborts the attempt and the run; an attempt whose final
    /// state lacks the completion flag is retried from the first stage with
    /// a fresh copy of the initial state, up to `config.max_attempts`.
    pub async fn run(&self, ctx: &StageContext, initial: PipelineState) -> Result<PipelineState> {
        let total = self.stages.len();
        let max_attempts = ctx.config.max_attempts.max(1);
        let mut last_error: Option<String> = None;

        for attempt in 1..=max_attempts {
            log_attempt_start!(attempt, max_attempts);
            if attempt > 1 {
                println!("🔁 Attempt {}/{}", attempt, max_attempts);
            }

            let mut state = initial.clone();
            for (index, stage) in self.stages.iter().enumerate() {
                log_stage_start!(index, stage.name(), total);
                let update = match stage.run(&state, ctx).await {
                    Ok(update) => update,
                    Err(e) => {
                        log_stage_failed!(index, stage.name(), format!("{:#}", e));
                        return Err(e).with_context(|| format!("stage '{}' failed", stage.name()));
                    }
                };
                state.merge(update);
                log_stage_complete!(index, stage.name());
            }

            if state.get_bool(keys::TESTS_PASSED).unwrap_or(false) {
                return Ok(state);
            }
            last_error = state.get_str(keys::ERROR).map(String::from);
            println!("⚠️  Attempt {} did not verify, regenerating...", attempt);
        }

        bail!(
            "pipeline did not reach a verified state after {} attempt(s){}",
            max_attempts,
            last_error
                .map(|e| format!(": {}", e))
                .unwrap_or_default()
        )
    }
}

/// Run the full generation pipeline over one SRS document
///
/// This is the entry point both the CLI and the HTTP handler use.
pub async fn run_generation_pipeline(
    config: PipelineConfig,
    generator: Arc<dyn ExternalGenerator>,
    srs_file: &Path,
) -> Result<PipelineState> {
    let ctx = StageContext::new(config, generator);
    let initial = PipelineState::for_srs_file(srs_file);
    Pipeline::standard().run(&ctx, initial).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockGenerator;
    use crate::pipeline::types::StageUpdate;
    use async_trait::async_trait;
    use serde_json::json;

    struct SetterStage {
        key: &'static str,
        value: serde_json::Value,
    }

    #[async_trait]
    impl Stage for SetterStage {
        fn name(&self) -> &'static str {
            "setter"
        }

        async fn run(&self, _state: &PipelineState, _ctx: &StageContext) -> Result<StageUpdate> {
            Ok(StageUpdate::new().with(self.key, self.value.clone()))
        }
    }

    struct FailingStage;

    #[async_trait]
    impl Stage for FailingStage {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _state: &PipelineState, _ctx: &StageContext) -> Result<StageUpdate> {
            bail!("boom")
        }
    }

    fn test_ctx(max_attempts: usize) -> StageContext {
        let dir = std::env::temp_dir().join(format!("srs_forge_wf_{}", uuid::Uuid::new_v4()));
        let mut config = crate::config::PipelineConfig::with_base_dir(&dir);
        config.max_attempts = max_attempts;
        StageContext::new(config, Arc::new(MockGenerator::default()))
    }

    #[tokio::test]
    async fn test_state_accumulates_across_stages() {
        let pipeline = Pipeline::new(vec![
            Box::new(SetterStage {
                key: "a",
                value: json!(1),
            }),
            Box::new(SetterStage {
                key: "b",
                value: json!(2),
            }),
            Box::new(SetterStage {
                key: keys::TESTS_PASSED,
                value: json!(true),
            }),
        ]);

        let state = pipeline
            .run(&test_ctx(1), PipelineState::new())
            .await
            .unwrap();
        assert_eq!(state.get("a"), Some(&json!(1)));
        assert_eq!(state.get("b"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_stage_error_aborts_run() {
        let pipeline = Pipeline::new(vec![Box::new(FailingStage)]);
        let err = pipeline
            .run(&test_ctx(3), PipelineState::new())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("stage 'failing' failed"));
    }

    #[tokio::test]
    async fn test_missing_completion_flag_is_terminal_after_bounded_retries() {
        let pipeline = Pipeline::new(vec![Box::new(SetterStage {
            key: keys::TESTS_PASSED,
            value: json!(false),
        })]);

        let err = pipeline
            .run(&test_ctx(2), PipelineState::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2 attempt(s)"));
    }

    #[test]
    fn test_standard_sequence_order() {
        assert_eq!(
            Pipeline::standard().stage_names(),
            vec![
                "extract", "scaffold", "testgen", "codegen", "readme", "verify", "archive"
            ]
        );
    }
}
