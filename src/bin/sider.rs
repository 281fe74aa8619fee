use clap::{Parser, Subcommand};
use humantime::format_duration;
use log::{debug, info};
use rusty_biokg_io::pipelines::sider::{extract, map_to_chembl};
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
    Extract {
        #[arg(short = 'a', long, default_value = "data/raw/sider/meddra_all_se.tsv")]
        all_se: path::PathBuf,

        #[arg(short = 'f', long, default_value = "data/raw/sider/meddra_freq.tsv")]
        freq: path::PathBuf,

        #[arg(short = 'o', long, default_value = "data/processed")]
        outdir: path::PathBuf,
    },
    MapToChembl {
        #[arg(short = 'e', long, default_value = "data/processed/edges_drug_sideeffect_stitch.csv")]
        edges: path::PathBuf,

        #[arg(short = 'u', long, default_value = "data/raw/unichem/src1src22.txt")]
        unichem: path::PathBuf,

        #[arg(short = 'a', long, default_value = "data/processed/nodes_drug_chembl_phase4.csv")]
        approved_drugs: path::PathBuf,

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
        Some(Commands::Extract { all_se, freq, outdir }) => {
            extract(all_se, freq, outdir)?;
        }
        Some(Commands::MapToChembl {
            edges,
            unichem,
            approved_drugs,
            outdir,
        }) => {
            map_to_chembl(edges, unichem, approved_drugs, outdir)?;
        }
        None => {}
    }

    info!("Duration: {}", format_duration(start.elapsed()).to_string());
    Ok(())
}
