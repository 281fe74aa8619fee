use clap::Parser;
use humantime::format_duration;
use log::{debug, info};
use rusty_biokg_io::pipelines::hetionet::{extract, read_document};
use std::time::Instant;
use std::{error, path};

#[derive(Parser, PartialEq, Debug)]
#[command(author, version, about, long_about = None)]
struct Options {
    /// Hetionet JSON document, optionally bzip2-compressed
    #[arg(short = 'i', long, required = true)]
    input: path::PathBuf,

    #[arg(short = 'o', long, default_value = "data/processed")]
    outdir: path::PathBuf,
}

fn main() -> Result<(), Box<dyn error::Error>> {
    let start = Instant::now();
    env_logger::init();

    let options = Options::parse();
    debug!("{:?}", options);

    let document = read_document(&options.input)?;
    extract(&document, &options.outdir)?;

    info!("Duration: {}", format_duration(start.elapsed()).to_string());
    Ok(())
}
