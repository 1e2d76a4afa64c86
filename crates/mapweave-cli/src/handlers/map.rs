//! Map command handler

use super::utils::{compile_definition, load_options, parse_document, read_document, read_input, write_document};
use crate::cli::MapArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use mapweave_core::{MapTransform, RunOptions, Value};
use serde_json::Value as Json;
use tracing::{debug, info, instrument};

/// Handle the map command
#[instrument(skip(args, config, output), fields(definition = %args.definition.display(), reverse = args.reverse))]
pub async fn handle_map(args: MapArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("map_command", &args.definition.display().to_string());

    let options = load_options(config, args.pipelines.as_deref())?;
    let mapping = {
        let _compile_timer = Timer::new("compile_definition");
        compile_definition(&args.definition, options)?
    };
    debug!(
        steps = mapping.pipeline().len(),
        named = mapping.pipelines().len(),
        "definition compiled"
    );

    let mut run = if args.reverse {
        RunOptions::reverse()
    } else {
        RunOptions::forward()
    };
    if let Some(target) = &args.target {
        run = run.with_target(Value::from(read_document(target)?));
    }

    let content = read_input(args.input.as_deref())?;

    if args.ndjson {
        let count = map_records(&mapping, &content, run, &args, output).await?;
        info!(records = count, elapsed_ms = timer.elapsed().as_millis() as u64, "mapped records");
        return Ok(());
    }

    let input = parse_document(&content, args.input.as_deref())?;

    let result = mapping.map_json_async(&input, run).await?;
    info!(elapsed_ms = timer.elapsed().as_millis() as u64, "mapped document");

    match &args.save_to {
        Some(path) => {
            write_document(path, &result)?;
            output.success(&format!("✓ Saved result to {}", path.display()))
        }
        None => output.data(&result),
    }
}

/// Map each non-empty line as its own record
async fn map_records(
    mapping: &MapTransform,
    content: &str,
    run: RunOptions,
    args: &MapArgs,
    output: &mut OutputWriter,
) -> Result<usize> {
    let records: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line))
        .collect();

    let progress = output.progress_bar(records.len() as u64, "records");
    let mut results = Vec::with_capacity(records.len());

    for (line, text) in &records {
        let record: Json = serde_json::from_str(text).map_err(|e| Error::InvalidRecord {
            line: *line,
            message: e.to_string(),
        })?;
        results.push(mapping.map_json_async(&record, run.clone()).await?);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match &args.save_to {
        Some(path) => {
            let mut lines = Vec::with_capacity(results.len());
            for result in &results {
                lines.push(serde_json::to_string(result)?);
            }
            let mut body = lines.join("\n");
            body.push('\n');
            std::fs::write(path, body)?;
            output.success(&format!("✓ Saved {} records to {}", results.len(), path.display()))?;
        }
        None => {
            for result in &results {
                output.record(result)?;
            }
        }
    }

    Ok(results.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn map_args(dir: &Path, input: &str, ndjson: bool) -> MapArgs {
        MapArgs {
            definition: dir.join("mapping.json"),
            input: Some(dir.join(input)),
            reverse: false,
            target: Some(dir.join("target.json")),
            pipelines: None,
            ndjson,
            save_to: Some(dir.join("out.json")),
        }
    }

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mapping.json"), r#"{ "title": "headline" }"#).unwrap();
        fs::write(dir.path().join("target.json"), r#"{ "source": "feed" }"#).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_map_merges_into_target() {
        let dir = setup();
        fs::write(dir.path().join("input.json"), r#"{ "headline": "Hi" }"#).unwrap();

        let args = map_args(dir.path(), "input.json", false);
        handle_map(args, &Config::default(), &mut quiet_output()).await.unwrap();

        assert_eq!(
            read_document(&dir.path().join("out.json")).unwrap(),
            json!({ "source": "feed", "title": "Hi" })
        );
    }

    #[tokio::test]
    async fn test_ndjson_records_each_merge_into_target() {
        let dir = setup();
        fs::write(
            dir.path().join("input.ndjson"),
            "{ \"headline\": \"one\" }\n\n{ \"headline\": \"two\" }\n",
        )
        .unwrap();

        let args = map_args(dir.path(), "input.ndjson", true);
        handle_map(args, &Config::default(), &mut quiet_output()).await.unwrap();

        let saved = fs::read_to_string(dir.path().join("out.json")).unwrap();
        let records: Vec<Json> = saved
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                json!({ "source": "feed", "title": "one" }),
                json!({ "source": "feed", "title": "two" }),
            ]
        );
    }

    #[tokio::test]
    async fn test_ndjson_reports_bad_line() {
        let dir = setup();
        fs::write(dir.path().join("input.ndjson"), "{ \"headline\": \"one\" }\nnope\n").unwrap();

        let args = map_args(dir.path(), "input.ndjson", true);
        let err = handle_map(args, &Config::default(), &mut quiet_output())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { line: 2, .. }));
    }
}
