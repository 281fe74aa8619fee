use clap::{Parser, Subcommand};
use humantime::format_duration;
use log::{debug, info};
use rusty_biokg_io::pipelines::chembl::{extract, ChemblDatabase, ExtractOptions, PhaseFilter};
use rusty_biokg_io::pipelines::mapping::chembl_to_drugbank;
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
    /// Drug nodes, drug -> target edges and target nodes from a ChEMBL SQLite release
    Extract {
        #[arg(short = 'd', long, required = true)]
        db: path::PathBuf,

        #[arg(short = 'o', long, default_value = "data/processed")]
        outdir: path::PathBuf,

        #[arg(short = 'p', long, value_enum, default_value = "4")]
        phase: PhaseFilter,

        /// do not fill missing preferred names from molecule_synonyms
        #[arg(long, default_value_t = false)]
        no_fill_synonyms: bool,
    },
    /// ChEMBL drug ids -> DrugBank ids through UniChem
    MapToDrugbank {
        #[arg(short = 'd', long, required = true)]
        drugs: path::PathBuf,

        #[arg(short = 'u', long, required = true)]
        unichem: path::PathBuf,

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
        Some(Commands::Extract {
            db,
            outdir,
            phase,
            no_fill_synonyms,
        }) => {
            let db = ChemblDatabase::open(db)?;
            let extract_options = ExtractOptions {
                outdir: outdir.clone(),
                phase: *phase,
                fill_synonyms: !no_fill_synonyms,
            };
            extract(&db, &extract_options)?;
        }
        Some(Commands::MapToDrugbank { drugs, unichem, outdir }) => {
            chembl_to_drugbank(drugs, unichem, outdir)?;
        }
        None => {}
    }

    info!("Duration: {}", format_duration(start.elapsed()).to_string());
    Ok(())
}
