use anyhow::{Context, Result};
use log::info;
use rust_graphseg::{segment_image, Coloring, Metric, Options};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "graphseg", about = "Graph-based image segmentation")]
struct Opt {
    /// Image to segment
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Where to write the segmented image
    #[structopt(short, long, parse(from_os_str), default_value = "segmented.png")]
    output: PathBuf,

    /// Larger values give fewer, larger segments
    #[structopt(short = "k", long)]
    granularity: f32,

    /// Color space for pixel distances: rgb or lab
    #[structopt(long, default_value = "rgb")]
    metric: Metric,

    /// Segment colors: random, spread or mean
    #[structopt(long, default_value = "random")]
    coloring: Coloring,

    /// Seed for random coloring
    #[structopt(long, default_value = "0")]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let img = image::open(&opt.input)
        .with_context(|| format!("failed to open {}", opt.input.display()))?;
    info!("loaded {}", opt.input.display());

    let options = Options::new(opt.granularity).with_metric(opt.metric);
    let segmented = segment_image(&img, &options, opt.coloring.with_seed(opt.seed))?;

    segmented
        .image
        .save(&opt.output)
        .with_context(|| format!("failed to write {}", opt.output.display()))?;
    println!("{} segments", segmented.segments);
    Ok(())
}
