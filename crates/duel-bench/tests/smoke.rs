use std::fs;
use std::path::Path;

use duel_bench::config::DuelConfig;
use duel_bench::tournament::{Tournament, TournamentReport};
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> DuelConfig {
    let yaml = format!(
        r#"
name: "test_smoke"
out_dir: "{out_dir}"
deals:
  seed: 4242
  count: 3
challenger:
  name: "search"
  kind: "search"
  engine:
    schedule:
      early:
        depth: 1
        samples: 2
      midgame:
        depth: 2
        samples: 2
      endgame:
        depth: 2
        samples: 3
baseline:
  name: "greedy"
  kind: "greedy"
"#,
        out_dir = output_dir.display(),
    );

    let config: DuelConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    config.check().expect("config validates");
    config
}

fn run_once(output_dir: &Path) -> TournamentReport {
    Tournament::new(load_config(output_dir))
        .run()
        .expect("tournament completes")
}

/// Hash of the games file with wall-clock timings zeroed out.
fn normalized_digest(jsonl: &str) -> String {
    let mut normalized = String::new();
    for line in jsonl.lines() {
        let mut value: serde_json::Value = serde_json::from_str(line).expect("row decodes to JSON");
        if let Some(timings) = value
            .get_mut("decision_ms")
            .and_then(serde_json::Value::as_object_mut)
        {
            for millis in timings.values_mut() {
                *millis = serde_json::json!(0.0);
            }
        }
        normalized.push_str(&serde_json::to_string(&value).expect("re-serialize normalized row"));
        normalized.push('\n');
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[test]
fn tournament_smoke_test_is_reproducible() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");
    let first = run_once(first_dir.path());
    let second = run_once(second_dir.path());

    assert_eq!(first.report.deals, 3);
    assert_eq!(first.report.games, 3 * 2);
    assert!(first.telemetry.is_none());

    let first_jsonl = fs::read_to_string(&first.games_path).expect("games readable");
    let second_jsonl = fs::read_to_string(&second.games_path).expect("games readable");
    assert_eq!(first_jsonl.lines().count(), first.report.games);
    assert_eq!(
        normalized_digest(&first_jsonl),
        normalized_digest(&second_jsonl),
        "same seed must replay identical games"
    );
}

#[test]
fn every_game_awards_all_ten_rounds() {
    let dir = tempdir().expect("temp dir");
    let finished = run_once(dir.path());

    let jsonl = fs::read_to_string(&finished.games_path).expect("games readable");
    let rows: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect();
    for row in &rows {
        let north = row["north_points"].as_u64().expect("north points");
        let south = row["south_points"].as_u64().expect("south points");
        assert_eq!(north + south, 10, "row: {row}");
        assert_eq!(row["rounds"].as_array().map(Vec::len), Some(10));
        let expected = match north.cmp(&south) {
            std::cmp::Ordering::Greater => row["north"].as_str(),
            std::cmp::Ordering::Less => row["south"].as_str(),
            std::cmp::Ordering::Equal => None,
        };
        assert_eq!(row["winner"].as_str(), expected);
    }

    // each deal appears twice with the contenders exchanged
    for pair in rows.chunks(2) {
        assert_eq!(pair[0]["deal_seed"], pair[1]["deal_seed"]);
        assert_eq!(pair[0]["north"], pair[1]["south"]);
        assert_eq!(pair[0]["north"].as_str(), Some("search"));
    }

    let total_games: u32 = finished.report.contenders.iter().map(|c| c.games).sum();
    assert_eq!(total_games as usize, 2 * finished.report.games);
    let pairs = &finished.report.pairs;
    assert_eq!(pairs.ahead + pairs.behind + pairs.level, 3);

    let markdown = fs::read_to_string(&finished.summary_path).expect("summary readable");
    assert!(markdown.starts_with("# Duel: test_smoke"));
    assert!(markdown.contains("| search |"));
    assert!(markdown.contains("| greedy |"));
    assert!(markdown.contains("## Paired deals"));
    assert!(markdown.contains("## Decision time by stage"));
}
