use assert_cmd::Command;
use predicates::prelude::*;

fn duel() -> Command {
    let mut cmd = Command::cargo_bin("duel").expect("duel binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn autoplay_finishes_a_match() {
    duel()
        .args(["--seed", "7", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("card-duel "))
        .stdout(predicate::str::contains("seed 7."))
        .stdout(predicate::str::contains("Final score: you "));
}

#[test]
fn quitting_at_the_prompt_exits_cleanly() {
    duel()
        .args(["--seed", "7"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("You lead. Your hand: ["))
        .stdout(predicate::str::contains("Quit. Round 1"));
}

#[test]
fn bad_input_is_explained_and_reprompted() {
    duel()
        .args(["--seed", "11"])
        .write_stdin("ten\n31\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("'ten' is not a card number"))
        .stdout(predicate::str::contains("there is no card 31"));
}

#[test]
fn closed_stdin_counts_as_quitting() {
    duel()
        .args(["--seed", "3", "--engine-leads"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Engine plays "))
        .stdout(predicate::str::contains("Quit."));
}

#[test]
fn explain_lists_candidates() {
    duel()
        .args(["--seed", "5", "--auto", "--explain", "--top", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("samples"))
        .stdout(predicate::str::contains("expected"));
}

#[test]
fn explain_shows_win_rate_when_the_engine_leads() {
    duel()
        .args(["--seed", "3", "--engine-leads", "--explain"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(r"card +\d+: expected [+-]\d+\.\d{3}, win \d+% \(\d+/\d+\)")
                .expect("valid pattern"),
        );
}

#[test]
fn explain_tags_replies_as_win_or_lose() {
    duel()
        .args(["--seed", "5", "--auto", "--explain", "--top", "10"])
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(r"expected [+-]\d+\.\d{3}, (WIN|LOSE) vs \d+")
                .expect("valid pattern"),
        );
}

#[test]
fn transcript_records_every_round() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("match.json");
    duel()
        .args(["--seed", "99", "--auto", "--transcript"])
        .arg(&path)
        .assert()
        .success();

    let text = std::fs::read_to_string(&path).expect("transcript written");
    let transcript: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(transcript["seed"].as_u64(), Some(99));
    assert_eq!(transcript["rounds"].as_array().map(Vec::len), Some(10));
    let human = transcript["human_points"].as_u64().expect("human points");
    let engine = transcript["engine_points"].as_u64().expect("engine points");
    assert_eq!(human + engine, 10);
}

#[test]
fn same_seed_replays_the_same_match() {
    let run = || {
        duel()
            .args(["--seed", "2024", "--auto"])
            .output()
            .expect("run duel")
            .stdout
    };
    assert_eq!(run(), run());
}
