//! brres-cli - inspect, validate and rewrite BRRES archives.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use brres::g3d::{SrtAnimation, SrtTarget};
use brres::scene::{Model, SceneArchive};
use brres::{Decoded, EncodeOptions, Transaction};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BRRES_BUILD_INFO"), ")");

#[derive(Parser)]
#[command(name = "brres-cli")]
#[command(version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize archives (decoded in parallel)
    #[command(alias = "i")]
    Info(InfoArgs),

    /// Show the bone hierarchy of every model
    #[command(alias = "t")]
    Tree(FileArg),

    /// Decode, encode and decode again, comparing the scenes
    #[command(alias = "c")]
    Check(InfoArgs),

    /// Decode and encode to a new file
    #[command(alias = "r")]
    Rewrite(RewriteArgs),

    /// Sample texture SRT animations
    #[command(alias = "a")]
    Anim(AnimArgs),
}

#[derive(Args)]
struct FileArg {
    /// Archive to read
    file: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    /// Archives to read
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RewriteArgs {
    input: PathBuf,
    output: PathBuf,

    /// Keep duplicate SRT tracks as they are
    #[arg(long)]
    no_dedup: bool,

    /// Sub-file alignment in bytes
    #[arg(long, default_value = "32")]
    alignment: usize,
}

#[derive(Args)]
struct AnimArgs {
    file: PathBuf,

    /// Only this animation
    #[arg(short, long)]
    name: Option<String>,

    /// Frame to sample
    #[arg(short, long, default_value = "0")]
    frame: f32,
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 1)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Info(args) => cmd_info(args),
        Commands::Tree(args) => cmd_tree(&args.file),
        Commands::Check(args) => cmd_check(args),
        Commands::Rewrite(args) => cmd_rewrite(args),
        Commands::Anim(args) => cmd_anim(args),
    }
}

fn open(path: &Path) -> Result<Decoded> {
    info!("Opening archive: {}", path.display());
    SceneArchive::open(path).with_context(|| format!("Failed to decode {}", path.display()))
}

fn print_report(report: &Transaction) {
    for msg in report.messages() {
        println!("  {msg}");
    }
}

fn report_json(report: &Transaction) -> Value {
    json!({
        "failure": report.is_failure(),
        "messages": report
            .messages()
            .iter()
            .map(|m| json!({ "path": m.path, "severity": m.severity.to_string(), "text": m.text }))
            .collect::<Vec<_>>(),
    })
}

fn model_json(model: &Model) -> Value {
    json!({
        "name": model.name,
        "bones": model.bones.len(),
        "materials": model.materials.iter().map(|m| json!({ "name": m.name, "xlu": m.xlu })).collect::<Vec<_>>(),
        "meshes": model.meshes.len(),
        "draw_matrices": model.draw_matrices.len(),
        "skinned": model.needs_node_mix(),
    })
}

fn archive_json(path: &Path, decoded: &Decoded) -> Value {
    let archive = &decoded.archive;
    json!({
        "file": path.display().to_string(),
        "models": archive.models.iter().map(model_json).collect::<Vec<_>>(),
        "textures": archive
            .textures
            .iter()
            .map(|t| json!({
                "name": t.name,
                "format": format!("{:?}", t.format),
                "width": t.width,
                "height": t.height,
                "levels": t.image_count,
            }))
            .collect::<Vec<_>>(),
        "srt_animations": archive
            .srt_animations
            .iter()
            .map(|s| json!({
                "name": s.name,
                "frames": s.frame_duration,
                "materials": s.materials.len(),
                "tracks": s.tracks.len(),
            }))
            .collect::<Vec<_>>(),
        "report": report_json(&decoded.report),
    })
}

fn print_info(path: &Path, decoded: &Decoded) {
    let archive = &decoded.archive;
    println!("Archive: {}", path.display());
    println!("Models:");
    for m in &archive.models {
        let xlu = m.materials.iter().filter(|mat| mat.xlu).count();
        println!(
            "  {:<24} {} bones, {} materials ({xlu} translucent), {} meshes, {} draw matrices{}",
            m.name,
            m.bones.len(),
            m.materials.len(),
            m.meshes.len(),
            m.draw_matrices.len(),
            if m.needs_node_mix() { ", skinned" } else { "" }
        );
    }
    println!("Textures:");
    for t in &archive.textures {
        println!("  {:<24} {:?} {}x{}, {} levels", t.name, t.format, t.width, t.height, t.image_count);
    }
    println!("SRT animations:");
    for s in &archive.srt_animations {
        println!(
            "  {:<24} {} frames, {} materials, {} tracks",
            s.name,
            s.frame_duration,
            s.materials.len(),
            s.tracks.len()
        );
    }
    if !decoded.report.messages().is_empty() {
        println!("Report:");
        print_report(&decoded.report);
    }
    println!();
}

fn cmd_info(args: InfoArgs) -> Result<()> {
    let results: Vec<_> = args.files.par_iter().map(|p| (p, open(p))).collect();
    let mut failed = 0;
    let mut docs = Vec::new();
    for (path, result) in results {
        match result {
            Ok(decoded) if args.json => docs.push(archive_json(path, &decoded)),
            Ok(decoded) => print_info(path, &decoded),
            Err(e) => {
                failed += 1;
                eprintln!("{e:#}");
            }
        }
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
    }
    if failed > 0 {
        bail!("{failed} of {} archives failed to decode", args.files.len());
    }
    Ok(())
}

fn print_bone(model: &Model, index: usize, depth: usize) {
    let indent = "  ".repeat(depth);
    let bone = &model.bones[index];
    let mut extra = format!("matrix {}", bone.matrix_id);
    if !bone.displays.is_empty() {
        extra.push_str(&format!(", {} draws", bone.displays.len()));
    }
    if !bone.visible {
        extra.push_str(", hidden");
    }
    println!("{indent}{} [{extra}]", bone.name);
    for &child in &bone.children {
        print_bone(model, child, depth + 1);
    }
}

fn cmd_tree(path: &Path) -> Result<()> {
    let decoded = open(path)?;
    println!("Archive: {}", path.display());
    for model in &decoded.archive.models {
        println!();
        println!("{}/", model.name);
        for root in model.root_bones() {
            print_bone(model, root, 1);
        }
    }
    Ok(())
}

fn check_one(path: &Path) -> Result<(Transaction, Transaction, bool)> {
    let first = open(path)?;
    let encoded = first.archive.to_bytes().context("Failed to encode")?;
    let second = SceneArchive::from_bytes(&encoded.bytes).context("Failed to decode re-encoded bytes")?;
    debug!(bytes = encoded.bytes.len(), "re-encoded {}", path.display());
    let mut write_report = encoded.report;
    write_report.merge(second.report);
    Ok((first.report, write_report, first.archive == second.archive))
}

fn cmd_check(args: InfoArgs) -> Result<()> {
    let results: Vec<_> = args.files.par_iter().map(|p| (p, check_one(p))).collect();
    let mut bad = 0;
    let mut docs = Vec::new();
    for (path, result) in results {
        let (read, write, stable) = match result {
            Ok(r) => r,
            Err(e) => {
                bad += 1;
                eprintln!("{}: {e:#}", path.display());
                continue;
            }
        };
        if !stable || write.is_failure() {
            bad += 1;
        }
        if args.json {
            docs.push(json!({
                "file": path.display().to_string(),
                "stable": stable,
                "read": report_json(&read),
                "rewrite": report_json(&write),
            }));
            continue;
        }
        let verdict = if stable { "ok" } else { "CHANGED" };
        println!(
            "{}: {verdict} ({} warnings, {} errors on read)",
            path.display(),
            read.warnings().count(),
            read.errors().count()
        );
        print_report(&read);
        if !write.is_clean() {
            println!("  after rewrite:");
            print_report(&write);
        }
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
    }
    if bad > 0 {
        bail!("{bad} of {} archives did not survive a rewrite", args.files.len());
    }
    Ok(())
}

fn cmd_rewrite(args: RewriteArgs) -> Result<()> {
    let decoded = open(&args.input)?;
    print_report(&decoded.report);
    let options = EncodeOptions { dedup_tracks: !args.no_dedup, alignment: args.alignment };
    let encoded = decoded.archive.to_bytes_with(&options).context("Failed to encode")?;
    print_report(&encoded.report);
    std::fs::write(&args.output, &encoded.bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {} bytes to {}", encoded.bytes.len(), args.output.display());
    Ok(())
}

fn print_animation(anim: &SrtAnimation, frame: f32) {
    println!(
        "{} ({} frames, {:?}, {:?})",
        anim.name, anim.frame_duration, anim.wrap_mode, anim.transform_model
    );
    for mat in &anim.materials {
        println!("  {}", mat.name);
        let slots = mat
            .texture_matrices
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("TexMtx{i}"), m))
            .chain(mat.indirect_matrices.iter().enumerate().map(|(i, m)| (format!("IndMtx{i}"), m)));
        for (slot, matrix) in slots {
            let Some(matrix) = matrix else { continue };
            let values = SrtTarget::ALL
                .iter()
                .map(|&t| format!("{t:?}={:.4}", matrix.value(t, frame, &anim.tracks)))
                .collect::<Vec<_>>()
                .join(" ");
            println!("    {slot:<8} {values}");
        }
    }
}

fn cmd_anim(args: AnimArgs) -> Result<()> {
    let decoded = open(&args.file)?;
    let mut shown = 0;
    for anim in &decoded.archive.srt_animations {
        if args.name.as_deref().is_some_and(|n| n != anim.name) {
            continue;
        }
        print_animation(anim, args.frame);
        shown += 1;
    }
    if shown == 0 {
        match args.name {
            Some(name) => bail!("No SRT animation named {name}"),
            None => println!("No SRT animations"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_carries_build_info() {
        assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(VERSION.contains(" build, "), "{VERSION}");
        let version = Cli::command().render_version();
        assert!(version.contains(VERSION), "{version}");
    }
}
