//! Digest of the JSON telemetry log written during a run.
//!
//! Stage-tagged engine decisions are grouped per stage. Harness play events are grouped per
//! contender and policy play events per policy. Lines with other targets are skipped.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DIGEST_JSON_FILE: &str = "telemetry_summary.json";
pub const DIGEST_MARKDOWN_FILE: &str = "telemetry_summary.md";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{} ({action}): {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("telemetry line {line} is not valid JSON: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding the telemetry digest: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> TelemetryError {
    let path = path.to_path_buf();
    move |source| TelemetryError::Io {
        action,
        path,
        source,
    }
}

/// The parts of a `tracing-subscriber` JSON line this digest reads.
#[derive(Debug, Deserialize)]
struct LogLine {
    #[serde(default)]
    target: String,
    #[serde(default)]
    fields: LogFields,
}

#[derive(Debug, Default, Deserialize)]
struct LogFields {
    stage: Option<String>,
    depth: Option<f64>,
    samples: Option<f64>,
    nodes: Option<f64>,
    expected_value: Option<f64>,
    ai_leads: Option<bool>,
    policy: Option<String>,
    contender: Option<String>,
    millis: Option<f64>,
}

/// Running mean that ignores non-finite values.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    total: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|value| value.is_finite()) {
            self.total += value;
            self.count += 1;
        }
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StageDigest {
    pub decisions: usize,
    pub leading: usize,
    pub mean_nodes: Option<f64>,
    pub mean_depth: Option<f64>,
    pub mean_samples: Option<f64>,
    pub mean_expected_value: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ContenderPlays {
    pub plays: usize,
    pub mean_ms: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TelemetrySummary {
    /// Stage-tagged engine decisions across every stage.
    pub decisions: usize,
    pub stages: BTreeMap<String, StageDigest>,
    pub contenders: BTreeMap<String, ContenderPlays>,
    pub policies: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
struct StageAccumulator {
    decisions: usize,
    leading: usize,
    nodes: Mean,
    depth: Mean,
    samples: Mean,
    expected_value: Mean,
}

#[derive(Debug, Default)]
struct Accumulator {
    stages: BTreeMap<String, StageAccumulator>,
    contenders: BTreeMap<String, (usize, Mean)>,
    policies: BTreeMap<String, usize>,
}

impl Accumulator {
    fn absorb(&mut self, line: LogLine) {
        let fields = line.fields;
        match line.target.as_str() {
            // search statistics share the target at debug level without a stage
            "duel_bot::decision" => {
                let Some(stage) = fields.stage else { return };
                let entry = self.stages.entry(stage).or_default();
                entry.decisions += 1;
                if fields.ai_leads == Some(true) {
                    entry.leading += 1;
                }
                entry.nodes.push(fields.nodes);
                entry.depth.push(fields.depth);
                entry.samples.push(fields.samples);
                entry.expected_value.push(fields.expected_value);
            }
            "duel_bot::play" => {
                *self.policies.entry(name_or_unset(fields.policy)).or_default() += 1;
            }
            "duel_bench::play" => {
                let entry = self
                    .contenders
                    .entry(name_or_unset(fields.contender))
                    .or_default();
                entry.0 += 1;
                entry.1.push(fields.millis);
            }
            _ => {}
        }
    }

    fn finish(self) -> TelemetrySummary {
        let stages: BTreeMap<_, _> = self
            .stages
            .into_iter()
            .map(|(stage, acc)| {
                let digest = StageDigest {
                    decisions: acc.decisions,
                    leading: acc.leading,
                    mean_nodes: acc.nodes.value(),
                    mean_depth: acc.depth.value(),
                    mean_samples: acc.samples.value(),
                    mean_expected_value: acc.expected_value.value(),
                };
                (stage, digest)
            })
            .collect();
        TelemetrySummary {
            decisions: stages.values().map(|stage| stage.decisions).sum(),
            stages,
            contenders: self
                .contenders
                .into_iter()
                .map(|(name, (plays, millis))| {
                    let plays = ContenderPlays {
                        plays,
                        mean_ms: millis.value(),
                    };
                    (name, plays)
                })
                .collect(),
            policies: self.policies,
        }
    }
}

fn name_or_unset(name: Option<String>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => "<unset>".to_string(),
    }
}

/// Digests a telemetry log; a missing log yields an empty summary.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }
    let file = File::open(path).map_err(io_error("open", path))?;

    let mut acc = Accumulator::default();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_error("read", path))?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed = serde_json::from_str(&line).map_err(|source| TelemetryError::Line {
            line: index + 1,
            source,
        })?;
        acc.absorb(parsed);
    }
    Ok(acc.finish())
}

/// Where the digest of a run's telemetry was written.
#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

/// Writes the JSON and Markdown digests next to the log. Returns `None` when no log exists.
pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }
    let summary = summarise_telemetry(telemetry_path)?;

    let json_path = output_dir.join(DIGEST_JSON_FILE);
    fs::write(&json_path, serde_json::to_vec_pretty(&summary)?)
        .map_err(io_error("write", &json_path))?;

    let markdown_path = output_dir.join(DIGEST_MARKDOWN_FILE);
    let mut markdown = format!(
        "# Telemetry\n\nSource: `{}`\n",
        telemetry_path.display()
    );
    push_digest(&mut markdown, &summary);
    fs::write(&markdown_path, markdown).map_err(io_error("write", &markdown_path))?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path,
    }))
}

/// Appends the digest to an existing run summary.
pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut section = String::from("\n## Telemetry\n");
    push_digest(&mut section, &outputs.summary);

    let mut file = OpenOptions::new()
        .append(true)
        .open(summary_path)
        .map_err(io_error("open for append", summary_path))?;
    file.write_all(section.as_bytes())
        .map_err(io_error("append", summary_path))
}

fn push_digest(out: &mut String, summary: &TelemetrySummary) {
    let _ = writeln!(out, "\nEngine decisions: {}\n", summary.decisions);
    if !summary.stages.is_empty() {
        out.push_str("| Stage | Decisions | Leading | Nodes | Depth | Samples | Chosen value |\n");
        out.push_str("|---|---:|---:|---:|---:|---:|---:|\n");
        for (stage, digest) in &summary.stages {
            let _ = writeln!(
                out,
                "| {stage} | {} | {} | {} | {} | {} | {} |",
                digest.decisions,
                digest.leading,
                cell(digest.mean_nodes, 1),
                cell(digest.mean_depth, 2),
                cell(digest.mean_samples, 2),
                cell(digest.mean_expected_value, 3),
            );
        }
        out.push('\n');
    }

    if !summary.contenders.is_empty() {
        out.push_str("Plays by contender:\n");
        for (name, plays) in &summary.contenders {
            let _ = writeln!(
                out,
                "- {name}: {} plays, {} ms mean",
                plays.plays,
                cell(plays.mean_ms, 2)
            );
        }
        out.push('\n');
    }

    out.push_str("Plays by policy:\n");
    if summary.policies.is_empty() {
        out.push_str("- none recorded\n");
    }
    for (policy, count) in &summary.policies {
        let _ = writeln!(out, "- {policy}: {count}");
    }
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.precision$}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp log");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        file
    }

    const RUN: &[&str] = &[
        r#"{"target":"duel_bot::decision","fields":{"stage":"early","depth":3,"samples":5,"nodes":1200,"expected_value":1.5,"ai_leads":true}}"#,
        r#"{"target":"duel_bot::decision","fields":{"stage":"early","depth":3,"samples":5,"nodes":800,"expected_value":0.5,"ai_leads":false}}"#,
        r#"{"target":"duel_bot::decision","fields":{"stage":"endgame","depth":2,"samples":7,"nodes":400,"expected_value":-1.0,"ai_leads":true}}"#,
        r#"{"target":"duel_bot::decision","fields":{"nodes":400,"leaves":300,"cutoffs":12}}"#,
        r#"{"target":"duel_bot::play","fields":{"policy":"search","chosen":12}}"#,
        r#"{"target":"duel_bot::play","fields":{"policy":"greedy","chosen":3}}"#,
        r#"{"target":"duel_bot::play","fields":{"policy":"search","chosen":30}}"#,
        r#"{"target":"duel_bench::play","fields":{"contender":"search","millis":4.0}}"#,
        r#"{"target":"duel_bench::play","fields":{"contender":"search","millis":2.0}}"#,
        r#"{"target":"duel_bench::play","fields":{"contender":"greedy","millis":0.5}}"#,
        r#"{"target":"duel_bench::run","fields":{"message":"telemetry started"}}"#,
    ];

    #[test]
    fn groups_decisions_by_stage() {
        let file = log(RUN);
        let summary = summarise_telemetry(file.path()).expect("summarise");
        assert_eq!(summary.decisions, 3);

        let early = &summary.stages["early"];
        assert_eq!(early.decisions, 2);
        assert_eq!(early.leading, 1);
        assert_eq!(early.mean_nodes, Some(1000.0));
        assert_eq!(early.mean_depth, Some(3.0));
        assert_eq!(early.mean_expected_value, Some(1.0));

        let endgame = &summary.stages["endgame"];
        assert_eq!(endgame.decisions, 1);
        assert_eq!(endgame.mean_samples, Some(7.0));
        assert!(!summary.stages.contains_key("midgame"));
    }

    #[test]
    fn counts_plays_by_contender_and_policy() {
        let file = log(RUN);
        let summary = summarise_telemetry(file.path()).expect("summarise");
        assert_eq!(summary.policies["search"], 2);
        assert_eq!(summary.policies["greedy"], 1);
        assert_eq!(summary.contenders["search"].plays, 2);
        assert_eq!(summary.contenders["search"].mean_ms, Some(3.0));
        assert_eq!(summary.contenders["greedy"].mean_ms, Some(0.5));
    }

    #[test]
    fn missing_log_is_an_empty_summary() {
        let summary = summarise_telemetry(Path::new("no/such/telemetry.jsonl")).expect("summarise");
        assert_eq!(summary, TelemetrySummary::default());
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let file = log(&[RUN[0], "", "{not json"]);
        match summarise_telemetry(file.path()) {
            Err(TelemetryError::Line { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a line error, got {other:?}"),
        }
    }

    #[test]
    fn outputs_land_beside_the_run_summary() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("telemetry.jsonl");
        fs::write(&log_path, RUN.join("\n")).expect("write log");
        let summary_path = dir.path().join("summary.md");
        fs::write(&summary_path, "# Duel: unit\n").expect("write summary");

        let outputs = write_summary_outputs(&log_path, dir.path())
            .expect("digest")
            .expect("log exists");
        assert_eq!(outputs.json_path, dir.path().join(DIGEST_JSON_FILE));
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(&outputs.json_path).expect("read json"))
                .expect("parse json");
        assert_eq!(json["decisions"], 3);

        append_highlights_to_markdown(&summary_path, &outputs).expect("append");
        let markdown = fs::read_to_string(&summary_path).expect("read summary");
        assert!(markdown.starts_with("# Duel: unit"));
        assert!(markdown.contains("## Telemetry"));
        assert!(markdown.contains("Engine decisions: 3"));
        assert!(markdown.contains("| early | 2 | 1 | 1000.0 | 3.00 | 5.00 | 1.000 |"));
        assert!(markdown.contains("- search: 2 plays, 3.00 ms mean"));
    }

    #[test]
    fn no_log_means_no_outputs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let outputs = write_summary_outputs(&dir.path().join("telemetry.jsonl"), dir.path())
            .expect("digest");
        assert!(outputs.is_none());
        assert!(!dir.path().join(DIGEST_JSON_FILE).exists());
    }
}
