use clap::{Parser, Subcommand};
use humantime::format_duration;
use log::{debug, info};
use rusty_biokg_io::pipelines::mapping::uniprot_to_entrez;
use std::time::Instant;
use std::{error, path};

#[derive(Parser, PartialEq, Debug)]
#[command(author, version, about, long_about = None)]
struct Options {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, PartialEq, Debug)]
enum Commands {
    MapToEntrez {
        #[arg(short = 't', long, default_value = "data/processed/nodes_target_uniprot_phase4.csv")]
        targets: path::PathBuf,

        /// UniProt idmapping.dat, optionally gzip-compressed
        #[arg(short = 'i', long, default_value = "data/raw/uniprot/idmapping.dat.gz")]
        idmapping: path::PathBuf,

        #[arg(short = 'o', long, default_value = "data/processed")]
        outdir: path::PathBuf,
    },
}

fn main() -> Result<(), Box<dyn error::Error>> {
    let start = Instant::now();
    env_logger::init();

    let options = Options::parse();
    debug!("{:?}", options);

    match &options.command {
        Some(Commands::MapToEntrez { targets, idmapping, outdir }) => {
            uniprot_to_entrez(targets, idmapping, outdir)?;
        }
        None => {}
    }

    info!("Duration: {}", format_duration(start.elapsed()).to_string());
    Ok(())
}
