//! Check command handler

use super::utils::{compile_definition, load_options};
use crate::cli::{CheckArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use tracing::{info, instrument};

/// What a compiled definition contains
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub definition: String,
    pub steps: usize,
    pub pipelines: Vec<PipelineSummary>,
}

#[derive(Debug, Serialize)]
pub struct PipelineSummary {
    pub id: String,
    pub steps: usize,
}

/// Handle the check command
#[instrument(skip(args, config, output), fields(definition = %args.definition.display()))]
pub async fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("check_command", &args.definition.display().to_string());

    let options = load_options(config, args.pipelines.as_deref())?;
    let mapping = compile_definition(&args.definition, options)?;

    let report = CheckReport {
        definition: args.definition.display().to_string(),
        steps: mapping.pipeline().len(),
        pipelines: mapping
            .pipelines()
            .iter()
            .map(|(id, pipeline)| PipelineSummary {
                id: id.clone(),
                steps: pipeline.len(),
            })
            .collect(),
    };
    info!(steps = report.steps, named = report.pipelines.len(), "definition is valid");

    if output.format() != OutputFormat::Human {
        return output.data(&report);
    }

    output.success(&format!("✓ {} compiles", report.definition))?;
    output.info(&format!("Top-level steps: {}", report.steps))?;

    if !report.pipelines.is_empty() {
        output.section("Named Pipelines")?;
        let rows = report
            .pipelines
            .iter()
            .map(|p| vec![p.id.clone(), p.steps.to_string()])
            .collect();
        output.table(&["pipeline", "steps"], rows)?;
    }

    Ok(())
}
