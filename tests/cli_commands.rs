use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use semtree::cli::{SemtreeArgs, execute_command, run_command};
use semtree::error::{Result, SemtreeError};

const VOCABULARY: &[(&str, [f32; 3])] = &[
    ("king", [1.0, 0.1, 0.0]),
    ("queen", [0.9, 0.3, 0.0]),
    ("prince", [0.8, 0.2, 0.1]),
    ("throne", [0.6, 0.0, 0.4]),
    ("banana", [0.0, 0.1, 1.0]),
];

fn write_model(dir: &TempDir) -> Result<PathBuf> {
    let path = dir.path().join("royalty.txt");
    let mut file = fs::File::create(&path)?;
    writeln!(file, "{} 3", VOCABULARY.len())?;
    for (term, v) in VOCABULARY {
        writeln!(file, "{term} {} {} {}", v[0], v[1], v[2])?;
    }
    Ok(path)
}

fn parse(model: &Path, out_dir: &Path, extra: &[&str]) -> SemtreeArgs {
    let mut argv = vec![
        "semtree".to_string(),
        model.display().to_string(),
        "--out-dir".to_string(),
        out_dir.display().to_string(),
        "--sim".to_string(),
        "0.5".to_string(),
        "--actor".to_string(),
        "tester".to_string(),
        "-q".to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    SemtreeArgs::try_parse_from(argv).unwrap()
}

#[test]
fn image_mode_writes_svg_and_gml() -> Result<()> {
    let dir = TempDir::new()?;
    let model = write_model(&dir)?;
    let out = dir.path().join("out");

    let args = parse(&model, &out, &["-w", "king", "-o", "image", "--iterations", "20"]);
    let summary = run_command(&args)?;

    let svg = out.join("king_neighborhood.svg");
    let gml = out.join("king_neighborhood.gml");
    assert!(svg.exists());
    assert!(gml.exists());
    assert_eq!(summary.outputs.len(), 2);
    assert!(fs::read_to_string(&svg)?.starts_with("<svg"));
    assert!(!out.join("gource_log.log").exists());
    Ok(())
}

#[test]
fn animation_mode_writes_timeline() -> Result<()> {
    let dir = TempDir::new()?;
    let model = write_model(&dir)?;

    let args = parse(&model, dir.path(), &["-w", "king"]);
    let summary = run_command(&args)?;

    let log = fs::read_to_string(dir.path().join("gource_log.log"))?;
    let first = log.lines().next().unwrap();
    assert!(first.ends_with("|tester|A|king"));
    assert_eq!(log.lines().count(), summary.nodes + 1);
    assert_eq!(summary.root, "king");
    assert!(!summary.substituted);
    Ok(())
}

#[test]
fn gml_and_json_modes_write_one_file() -> Result<()> {
    let dir = TempDir::new()?;
    let model = write_model(&dir)?;

    let summary = run_command(&parse(&model, dir.path(), &["-w", "queen", "-o", "gml"]))?;
    assert_eq!(summary.outputs.len(), 1);
    assert!(dir.path().join("queen_neighborhood.gml").exists());

    let summary = run_command(&parse(&model, dir.path(), &["-w", "queen", "-o", "json"]))?;
    assert_eq!(summary.outputs.len(), 1);
    let json = fs::read_to_string(dir.path().join("queen_neighborhood.json"))?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["root"], "queen");
    Ok(())
}

#[test]
fn seeded_unknown_word_is_substituted() -> Result<()> {
    let dir = TempDir::new()?;
    let model = write_model(&dir)?;
    let extra = ["-w", "zebra", "--seed", "11", "-o", "json"];

    let first = run_command(&parse(&model, dir.path(), &extra))?;
    let second = run_command(&parse(&model, dir.path(), &extra))?;

    assert!(first.substituted);
    assert_eq!(first.requested.as_deref(), Some("zebra"));
    assert!(VOCABULARY.iter().any(|(term, _)| *term == first.root));
    assert_eq!(first.root, second.root);
    assert_eq!(first.edges, second.edges);
    Ok(())
}

#[test]
fn missing_word_starts_from_vocabulary_term() -> Result<()> {
    let dir = TempDir::new()?;
    let model = write_model(&dir)?;

    let summary = run_command(&parse(&model, dir.path(), &["--seed", "5", "-o", "gml"]))?;
    assert_eq!(summary.requested, None);
    assert!(!summary.substituted);
    assert!(VOCABULARY.iter().any(|(term, _)| *term == summary.root));
    Ok(())
}

#[test]
fn parallel_flag_builds_the_same_graph() -> Result<()> {
    let dir = TempDir::new()?;
    let model = write_model(&dir)?;

    let sequential = run_command(&parse(&model, dir.path(), &["-w", "king", "-o", "json"]))?;
    let parallel = run_command(&parse(
        &model,
        dir.path(),
        &["-w", "king", "-o", "json", "--parallel"],
    ))?;

    assert_eq!(sequential.nodes, parallel.nodes);
    assert_eq!(sequential.edges, parallel.edges);
    assert_eq!(sequential.scanned, parallel.scanned);
    assert_eq!(parallel.oracle_calls, parallel.scanned);
    Ok(())
}

#[test]
fn missing_model_is_an_error() {
    let dir = TempDir::new().unwrap();
    let args = parse(&dir.path().join("absent.bin"), dir.path(), &["-w", "king"]);

    let err = run_command(&args).unwrap_err();
    assert!(matches!(err, SemtreeError::ModelLoad(_)));
    assert!(execute_command(args).is_err());
    assert!(!dir.path().join("gource_log.log").exists());
}
