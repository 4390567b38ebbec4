use std::fs;
use std::path::PathBuf;

use gol_engine::application::{GenerationEngine, Settings};
use gol_engine::domain::{LibraryError, RuleLibrary, RuleSet, builtin_rules, read_rules};

/// A path under the temp dir unique to this test process.
fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("gol_engine_{}_{name}.bin", std::process::id()));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn missing_file_is_created_with_builtins() {
    let path = scratch("create");
    let library = RuleLibrary::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(library.iter().cloned().collect::<Vec<_>>(), builtin_rules());
    assert_eq!(library.path(), Some(path.as_path()));

    let reopened = RuleLibrary::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    fs::remove_file(&path).unwrap();
}

#[test]
fn added_rules_survive_reopen() {
    let path = scratch("persist");
    let mut rules = RuleSet::open(&path).unwrap();
    rules.add_rule("HighLife", "B36/S23", "Has a small replicator").unwrap();
    rules.add_rule("Seeds", "B2/S", "Every cell dies each tick").unwrap();

    let mut reopened = RuleSet::open(&path).unwrap();
    let names: Vec<_> = reopened.library().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, ["Conway's Life", "Replicator", "HighLife", "Seeds"]);
    assert_eq!(reopened.select_by_name("Seeds").unwrap().index, 3);
    assert_eq!(reopened.rule_string(), "S/B2");
    fs::remove_file(&path).unwrap();
}

#[test]
fn no_temp_file_left_behind() {
    let path = scratch("tmpfile");
    RuleLibrary::open(&path).unwrap().save().unwrap();
    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    assert!(!PathBuf::from(tmp).exists());
    fs::remove_file(&path).unwrap();
}

#[test]
fn truncated_file_is_rejected() {
    let path = scratch("truncated");
    RuleLibrary::open(&path).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();

    assert!(matches!(
        RuleLibrary::open(&path),
        Err(LibraryError::Truncated { record: 1 })
    ));
    fs::remove_file(&path).unwrap();
}

#[test]
fn empty_file_is_an_empty_library() {
    let path = scratch("empty");
    fs::write(&path, b"").unwrap();
    let library = RuleLibrary::open(&path).unwrap();
    assert!(library.is_empty());
    assert_eq!(library.cursor(5).count(), 0);
    fs::remove_file(&path).unwrap();
}

#[test]
fn engine_adds_through_settings_library() {
    let path = scratch("engine");
    let mut settings = Settings::default();
    settings.board.width = 32;
    settings.board.height = 32;
    settings.rules.library = Some(path.clone());
    settings.rules.active = Some("B36/S23".to_string());

    let rules = settings.shared_rules().unwrap();
    let engine = GenerationEngine::from_settings(&settings, rules).unwrap();
    assert_eq!(engine.active_rule().to_string(), "S23/B36");
    let entry = engine.add_rule("Day & Night", "B3678/S34678", "").unwrap();
    assert_eq!(entry.index, 2);

    let rules = settings.shared_rules().unwrap();
    assert_eq!(read_rules(&rules).library().len(), 3);
    fs::remove_file(&path).unwrap();
}

#[test]
fn failed_save_does_not_keep_the_rule() {
    let dir = std::env::temp_dir().join(format!("gol_engine_{}_gone", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("rules.bin");
    let mut rules = RuleSet::open(&path).unwrap();
    fs::remove_dir_all(&dir).unwrap();

    assert!(rules.add_rule("HighLife", "B36/S23", "").is_err());
    assert_eq!(rules.library().len(), 2);
    assert!(rules.select_by_name("HighLife").is_err());
}
