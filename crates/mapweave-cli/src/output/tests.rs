// Tests for output formatting
//
// These tests capture what the writer emits for each output format.

use super::*;
use std::cell::RefCell;
use std::rc::Rc;

/// A writer whose contents stay readable after it is boxed
#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, Captured) {
    let captured = Captured::default();
    let writer = OutputWriter::with_writer(format, false, quiet, Box::new(captured.clone()));
    (writer, captured)
}

#[test]
fn test_output_formatter_trait() {
    let value = serde_json::json!({ "title": "H", "tags": ["a"] });

    let compact = OutputFormat::Json.format(&value).unwrap();
    assert_eq!(compact, r#"{"title":"H","tags":["a"]}"#);

    let pretty = OutputFormat::JsonPretty.format(&value).unwrap();
    assert!(pretty.contains("\n  \"title\": \"H\""));

    let yaml = OutputFormat::Yaml.format(&value).unwrap();
    assert!(yaml.contains("title: H"));

    let record = OutputFormat::JsonPretty.format_record(&value).unwrap();
    assert!(!record.contains('\n'));
}

#[test]
fn test_messages_only_in_human_format() {
    let (mut out, captured) = writer(OutputFormat::Human, false);
    out.info("compiling").unwrap();
    out.success("done").unwrap();
    out.warning("careful").unwrap();
    assert_eq!(captured.text(), "INFO: compiling\ndone\nWARNING: careful\n");

    let (mut out, captured) = writer(OutputFormat::Json, false);
    out.info("compiling").unwrap();
    out.success("done").unwrap();
    out.data(&serde_json::json!([1, 2])).unwrap();
    assert_eq!(captured.text(), "[1,2]\n");
}

#[test]
fn test_quiet_suppresses_messages_not_data() {
    let (mut out, captured) = writer(OutputFormat::Human, true);
    out.info("compiling").unwrap();
    out.section("Result").unwrap();
    out.data(&serde_json::json!("x")).unwrap();
    assert_eq!(captured.text(), "\"x\"\n");
}

#[test]
fn test_records_are_single_lines() {
    let (mut out, captured) = writer(OutputFormat::Yaml, false);
    out.record(&serde_json::json!({ "a": 1 })).unwrap();
    out.record(&serde_json::json!({ "a": 2 })).unwrap();
    assert_eq!(captured.text(), "{\"a\":1}\n{\"a\":2}\n");
}

#[test]
fn test_table() {
    let (mut out, captured) = writer(OutputFormat::Human, false);
    out.table(
        &["pipeline", "steps"],
        vec![vec!["comment".to_string(), "1".to_string()]],
    )
    .unwrap();

    let text = captured.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("pipeline │ steps"));
    assert!(lines[2].starts_with("comment  │ 1"));
}

#[test]
fn test_no_progress_with_custom_writer() {
    let (out, _) = writer(OutputFormat::Human, false);
    assert!(out.progress_bar(10, "records").is_none());
}
