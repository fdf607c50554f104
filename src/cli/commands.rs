//! Command implementation for the semtree CLI.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use log::{info, warn};

use crate::cli::args::{OutputMode, SemtreeArgs};
use crate::cli::output::{RunSummary, output_result};
use crate::error::{Result, SemtreeError};
use crate::expander::{Expander, Expansion, SeededSelector};
use crate::export::{GraphSnapshot, TimelineWriter, render_svg, save_gml, spring_layout};
use crate::export::timeline::default_actor;
use crate::model::load_model;

/// Gource options used when piping the animation log.
const GOURCE_ARGS: [&str; 9] = [
    "--realtime",
    "--title",
    "Semtree",
    "--hide",
    "date",
    "--log-format",
    "custom",
    "--auto-skip-seconds",
    "0.3",
];

/// Execute the CLI: load the model, expand the neighborhood, write outputs
/// and print the run summary.
pub fn execute_command(args: SemtreeArgs) -> Result<()> {
    let summary = run_command(&args)?;
    output_result("Neighborhood built", &summary, &args)
}

/// Load the model, expand the neighborhood and write the requested outputs.
pub fn run_command(args: &SemtreeArgs) -> Result<RunSummary> {
    let start_time = Instant::now();

    let model = load_model(&args.model)?;
    let kind = model.kind;
    let oracle = model.into_oracle()?;

    let config = args.expander_config();
    let mut expander = Expander::new(&oracle, config)?;
    if let Some(seed) = args.seed {
        expander = expander.with_selector(SeededSelector::new(seed));
    }

    let word = match &args.word {
        Some(word) => word.clone(),
        None => {
            let word = expander.random_root()?;
            info!("No word given, starting from '{word}'");
            word
        }
    };
    let expansion = if args.parallel {
        expander.expand_parallel(&word)?
    } else {
        expander.expand(&word)?
    };

    fs::create_dir_all(&args.out_dir)?;
    let outputs = match args.output {
        OutputMode::Image => write_image(&expansion, args)?,
        OutputMode::Animation => write_animation(&expansion, args)?,
        OutputMode::Gml => vec![write_gml_file(&expansion, &args.out_dir)?],
        OutputMode::Json => vec![write_json_file(&expansion, &args.out_dir)?],
    };

    Ok(RunSummary::new(
        kind,
        args.word.as_deref(),
        &expansion,
        start_time.elapsed().as_millis() as u64,
        outputs.iter().map(|p| p.display().to_string()).collect(),
    ))
}

/// File-name stem for outputs about `root`.
fn file_stem(root: &str) -> String {
    root.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn write_gml_file(expansion: &Expansion, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}_neighborhood.gml", file_stem(&expansion.root)));
    save_gml(&expansion.graph, &path)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

fn write_json_file(expansion: &Expansion, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}_neighborhood.json", file_stem(&expansion.root)));
    GraphSnapshot::from(&expansion.graph).save(&path)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

fn write_image(expansion: &Expansion, args: &SemtreeArgs) -> Result<Vec<PathBuf>> {
    info!("Drawing graph...");
    let layout = spring_layout(&expansion.graph, args.iterations, args.seed.unwrap_or(0));
    let title = vec![
        format!("Semantic Neighborhood of '{}'", expansion.root),
        format!(
            "max. neighbors: {}, min. similarity: {}, size: {}",
            args.neighbors, args.sim, args.size
        ),
    ];
    let svg = render_svg(&expansion.graph, &layout, &title)?;

    let svg_path = args
        .out_dir
        .join(format!("{}_neighborhood.svg", file_stem(&expansion.root)));
    fs::write(&svg_path, svg)?;
    info!("Wrote {}", svg_path.display());

    let gml_path = write_gml_file(expansion, &args.out_dir)?;
    Ok(vec![svg_path, gml_path])
}

fn write_animation(expansion: &Expansion, args: &SemtreeArgs) -> Result<Vec<PathBuf>> {
    let actor = args.actor.clone().unwrap_or_else(default_actor);
    let path = args.out_dir.join("gource_log.log");
    let records = TimelineWriter::new(actor).save(expansion, &path)?;
    info!("Wrote {records} timeline records to {}", path.display());

    if args.gource {
        run_gource(&path)?;
    }
    Ok(vec![path])
}

/// Feed the log to `gource` on stdin and wait for it to exit.
fn run_gource(log_path: &Path) -> Result<()> {
    let log = File::open(log_path)?;
    let status = Command::new("gource")
        .args(GOURCE_ARGS)
        .arg("-")
        .stdin(Stdio::from(log))
        .status()
        .map_err(|e| SemtreeError::export(format!("failed to launch gource: {e}")))?;
    if !status.success() {
        warn!("gource exited with {status}");
    }
    Ok(())
}
