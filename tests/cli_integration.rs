// Binary behavior: output format, exit codes and cache handling
use std::process::{Command, Output};

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::TestFixture;

fn run_verse(fixture: &TestFixture, extra: &[&str]) -> Output {
    run_verse_with_classifier(fixture, "verse-test-missing-classifier", extra)
}

fn run_verse_with_classifier(fixture: &TestFixture, classifier: &str, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_verse"))
        .env("XDG_CONFIG_HOME", &fixture.config_home)
        .env("HOME", fixture.temp_dir.path())
        .env_remove("RUST_LOG")
        .arg("--lyrics-dir")
        .arg(&fixture.lyrics_dir)
        .arg("--music-dir")
        .arg(&fixture.music_dir)
        .arg("--classifier")
        .arg(classifier)
        .args(extra)
        .output()
        .expect("Failed to run verse binary")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_prints_single_line() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("Band - Song.txt", "only line\n");

    let output = run_verse(&fixture, &["--seed", "1"]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "only line\n");
}

#[test]
fn test_show_meta_prints_header() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("Band - Song.txt", "only line\n");

    let output = run_verse(&fixture, &["--show-meta", "--split-filenames"]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "Band - Song\nonly line\n");

    let output = run_verse(&fixture, &["--show-title"]);
    assert_eq!(stdout_of(&output), "Song\nonly line\n");

    let output = run_verse(&fixture, &["--show-artist"]);
    assert_eq!(stdout_of(&output), "Band\nonly line\n");
}

#[test]
fn test_streaming_mode() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("Band - Song.txt", "[Chorus]\nsing it\n");

    let output = run_verse(&fixture, &["--streaming", "--show-meta"]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "Band - Song\nsing it\n");
}

#[test]
fn test_no_lyrics_exit_code() {
    let fixture = TestFixture::new();

    let output = run_verse(&fixture, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_of(&output), "No lyrics found.\n");

    let output = run_verse(&fixture, &["--streaming"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_of(&output), "No lyrics found.\n");
}

#[test]
fn test_no_eligible_line_exit_code() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "[Verse]\n(Hook)\n");

    let output = run_verse(&fixture, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_of(&output), "No eligible line under current filters.\n");
}

/// Executable classifier flagging lines that contain "rude"
#[cfg(unix)]
fn rude_classifier(fixture: &TestFixture) -> String {
    use std::os::unix::fs::PermissionsExt;

    let script = fixture.temp_dir.path().join("rude-classifier.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\nwhile IFS= read -r l; do case \"$l\" in *rude*) echo 1;; *) echo 0;; esac; done\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script.to_string_lossy().into_owned()
}

#[test]
fn test_failed_classifier_leaves_cache_missing() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "one\ntwo\n");

    let output = run_verse(&fixture, &[]);
    assert!(output.status.success());
    assert!(fixture.read_cache().is_err());
}

#[cfg(unix)]
#[test]
fn test_working_classifier_after_failure_builds_cache() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "rude one\nnice two\n");

    let output = run_verse(&fixture, &[]);
    assert!(output.status.success());
    assert!(fixture.read_cache().is_err());

    let classifier = rude_classifier(&fixture);
    for seed in 0..5 {
        let output = run_verse_with_classifier(&fixture, &classifier, &["--seed", &seed.to_string()]);
        assert!(output.status.success());
        assert_eq!(stdout_of(&output), "nice two\n");
    }
    assert_eq!(fixture.read_cache().unwrap(), "1\n0\n");
}

#[cfg(unix)]
#[test]
fn test_streaming_without_cache_filters_profanity() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "rude words\n");
    let classifier = rude_classifier(&fixture);

    let output = run_verse_with_classifier(&fixture, &classifier, &["--streaming"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_of(&output), "No eligible line under current filters.\n");
    assert_eq!(fixture.read_cache().unwrap(), "1\n");

    // Second run streams against the cache it just built
    let output = run_verse_with_classifier(&fixture, &classifier, &["--streaming"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_valid_cache_filters_profane_lines() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "rude one\nnice two\nnice three\n");
    fixture.create_cache("1\n0\n0\n");

    for seed in 0..10 {
        let output = run_verse(&fixture, &["--seed", &seed.to_string()]);
        assert!(output.status.success());
        assert_ne!(stdout_of(&output), "rude one\n");
    }
    // Cache is untouched when valid
    assert_eq!(fixture.read_cache().unwrap(), "1\n0\n0\n");
}

#[test]
fn test_generate_profanity_cache_failure_keeps_old_cache() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "one\ntwo\nthree\n");
    fixture.create_cache("1\n1\n1\n");

    let output = run_verse(&fixture, &["--generate-profanity-cache"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).is_empty());
    assert_eq!(fixture.read_cache().unwrap(), "1\n1\n1\n");
}

#[cfg(unix)]
#[test]
fn test_generate_profanity_cache_exits_without_selecting() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "one\nrude two\nthree\n");
    fixture.create_cache("1\n1\n1\n");
    let classifier = rude_classifier(&fixture);

    let output = run_verse_with_classifier(&fixture, &classifier, &["--generate-profanity-cache"]);
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("3 lines, 1 flagged"), "unexpected output: {stdout}");
    assert_eq!(fixture.read_cache().unwrap(), "0\n1\n0\n");
}

#[test]
fn test_version_flags() {
    let fixture = TestFixture::new();
    for flag in ["-v", "--version"] {
        let output = run_verse(&fixture, &[flag]);
        assert!(output.status.success());
        assert!(stdout_of(&output).contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_help_exits_zero() {
    let fixture = TestFixture::new();
    let output = run_verse(&fixture, &["--help"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("--allow-profanities"));
}

#[test]
fn test_missing_home_and_xdg_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_lyric_file("song.txt", "one\n");

    let output = Command::new(env!("CARGO_BIN_EXE_verse"))
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("HOME")
        .arg("--lyrics-dir")
        .arg(&fixture.lyrics_dir)
        .output()
        .expect("Failed to run verse binary");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config directory"));
}
