use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pixelmath", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a PixelMath job and write the output image.
    Run(RunArgs),
    /// List the registered functions and operators.
    Functions,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input job JSON.
    #[arg(long)]
    job: PathBuf,

    /// Output image path (format from the extension).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Evaluate on a single worker.
    #[arg(long, default_value_t = false)]
    single_threaded: bool,

    /// Disable branch emission for short-circuit functions.
    #[arg(long, default_value_t = false)]
    no_optimize: bool,

    /// Random number generator seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// A job file: input images, symbol definitions, target and channel expressions.
#[derive(serde::Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Job {
    /// Image identifier to file path, relative to the job file.
    #[serde(default)]
    images: BTreeMap<String, PathBuf>,
    /// Symbol definition list, e.g. `k=0.5, total=global(+)`.
    #[serde(default)]
    symbols: String,
    /// Target an image of `images`.
    #[serde(default)]
    target_image: Option<String>,
    /// Explicit target, used when `target_image` is absent.
    #[serde(default)]
    target: Option<pixelmath::Target>,
    /// Evaluate a sub-region of the target.
    #[serde(default)]
    region: Option<pixelmath::Region>,
    expressions: pixelmath::ChannelExpressions,
    #[serde(default = "default_true")]
    single_expression: bool,
    #[serde(default)]
    rescale: Option<(f64, f64)>,
    #[serde(default = "default_truncate")]
    truncate: Option<(f64, f64)>,
    /// Run for global variables only.
    #[serde(default)]
    side_effects_only: bool,
}

fn default_true() -> bool {
    true
}

fn default_truncate() -> Option<(f64, f64)> {
    Some((0.0, 1.0))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Functions => cmd_functions(),
    }
}

fn cmd_functions() -> anyhow::Result<()> {
    for (_, def) in pixelmath::functions() {
        let aliases = if def.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", def.aliases.join(", "))
        };
        println!("{:<12} {:<10} {}{}", def.token, def.arity(), def.summary, aliases);
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let f = File::open(&args.job).with_context(|| format!("open job '{}'", args.job.display()))?;
    let job: Job = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse job '{}'", args.job.display()))?;
    let root = args.job.parent().unwrap_or_else(|| Path::new("."));

    let mut images = pixelmath::ImageStore::new();
    for (id, path) in &job.images {
        let path = root.join(path);
        let img = image::open(&path).with_context(|| format!("read image '{}'", path.display()))?;
        images.insert(id.clone(), pixelmath::Raster::from_dynamic(&img)?);
    }
    let symbols = pixelmath::parse_symbols(&job.symbols)?;

    let mut target = match (&job.target_image, job.target) {
        (Some(id), _) => pixelmath::Target::image(&images, id)?,
        (None, Some(t)) => t,
        (None, None) => anyhow::bail!("job needs either 'target_image' or 'target'"),
    };
    if job.region.is_some() {
        target.region = job.region;
    }

    let opts = pixelmath::PixelMathOpts {
        single_expression: job.single_expression,
        optimize: !args.no_optimize,
        generate_output: !job.side_effects_only,
        threads: args.threads,
        single_threaded: args.single_threaded,
        rescale: job.rescale,
        truncate: job.truncate,
        seed: args.seed,
        ..pixelmath::PixelMathOpts::default()
    };
    let out = pixelmath::run(&job.expressions, &symbols, &images, &target, &opts)?;

    for g in &out.globals {
        println!("{} = {:?}", g.name, g.value);
    }
    eprintln!(
        "folds={} generators={} instructions={} workers={}",
        out.stats.folds, out.stats.generators, out.stats.instructions, out.stats.workers
    );

    if let (Some(raster), Some(path)) = (out.raster, args.out.as_ref()) {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        raster
            .to_dynamic()?
            .save(path)
            .with_context(|| format!("write image '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}
