use crate::chain::{resolve_chain, MappingTable};
use crate::error::Result;
use crate::pipelines::unichem::read_unichem;
use crate::tables::{id_frame, read_table, require_columns, require_file, string_set, trimmed, write_table};
use flate2::read::MultiGzDecoder;
use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::{fs, io, path};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingSummary {
    pub seeds: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub pairs: usize,
}

fn log_summary(label: &str, summary: &MappingSummary) {
    info!("Total {}: {}", label, summary.seeds);
    info!("Mapped: {} ({} pairs)", summary.mapped, summary.pairs);
    info!("Unmapped: {}", summary.unmapped);
}

/// ChEMBL drug ids -> DrugBank ids through the UniChem src1src2 dump.
pub fn chembl_to_drugbank(drugs_path: &path::Path, unichem: &path::Path, outdir: &path::Path) -> Result<MappingSummary> {
    info!("Loading ChEMBL drugs from: {}", drugs_path.display());
    let drugs = read_table(drugs_path, b',')?;
    require_columns(&drugs, &["chembl_id"], &drugs_path.display().to_string())?;
    let seeds = string_set(&drugs, "chembl_id")?;

    info!("Loading UniChem ChEMBL -> DrugBank mapping from: {}", unichem.display());
    let chembl_drugbank = read_unichem(unichem, "chembl_id", "drugbank_id")?;
    let resolution = resolve_chain(&seeds, &chembl_drugbank, &[])?;

    let mut mapped = resolution.resolved.frame().clone().lazy();
    if drugs.get_column_names_str().contains(&"name") {
        let names = drugs
            .lazy()
            .select([trimmed("chembl_id"), col("name")])
            .group_by_stable([col("chembl_id")])
            .agg([col("name").first()]);
        mapped = mapped.join(names, [col("chembl_id")], [col("chembl_id")], JoinArgs::new(JoinType::Left));
    }
    let mapped = mapped.sort(["chembl_id", "drugbank_id"], SortMultipleOptions::default()).collect()?;

    let summary = MappingSummary {
        seeds: seeds.len(),
        mapped: resolution.resolved.left_values()?.len(),
        unmapped: resolution.residual.len(),
        pairs: write_table(mapped, &outdir.join("chembl_to_drugbank.csv"))?,
    };
    write_table(id_frame("chembl_id", &resolution.residual)?, &outdir.join("chembl_unmapped.csv"))?;
    log_summary("ChEMBL drugs", &summary);
    Ok(summary)
}

/// `accession -> GeneID` rows of a UniProt idmapping file, restricted to `accessions`.
pub fn read_idmapping(input: &path::Path, accessions: &BTreeSet<String>) -> Result<MappingTable> {
    require_file(input)?;
    let file = fs::File::open(input)?;
    let reader: Box<dyn io::Read> = match input.extension().is_some_and(|ext| ext == "gz") {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(io::BufReader::new(reader));

    let mut pairs = Vec::new();
    let mut skipped = 0;
    for result in rdr.records() {
        let record = result?;
        if record.len() != 3 {
            skipped += 1;
            continue;
        }
        if &record[1] == "GeneID" && accessions.contains(record[0].trim()) {
            pairs.push((record[0].to_string(), record[2].to_string()));
        }
    }
    debug!("Kept {} GeneID rows, skipped {} malformed lines", pairs.len(), skipped);
    MappingTable::from_pairs("uniprot", "entrez_id", pairs)
}

/// UniProt target accessions -> Entrez gene ids.
pub fn uniprot_to_entrez(targets_path: &path::Path, idmapping: &path::Path, outdir: &path::Path) -> Result<MappingSummary> {
    info!("Loading targets from: {}", targets_path.display());
    let targets = read_table(targets_path, b',')?;
    require_columns(&targets, &["uniprot"], &targets_path.display().to_string())?;
    let seeds = string_set(&targets, "uniprot")?;

    info!("Scanning UniProt idmapping: {}", idmapping.display());
    let uniprot_entrez = read_idmapping(idmapping, &seeds)?;
    let resolution = resolve_chain(&seeds, &uniprot_entrez, &[])?;
    let mapped = resolution
        .resolved
        .frame()
        .clone()
        .lazy()
        .sort(["uniprot", "entrez_id"], SortMultipleOptions::default())
        .collect()?;

    let summary = MappingSummary {
        seeds: seeds.len(),
        mapped: resolution.resolved.left_values()?.len(),
        unmapped: resolution.residual.len(),
        pairs: write_table(mapped, &outdir.join("uniprot_to_entrez.csv"))?,
    };
    write_table(id_frame("uniprot", &resolution.residual)?, &outdir.join("uniprot_unmapped.csv"))?;
    log_summary("UniProt targets", &summary);
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn column(path: &path::Path, name: &str) -> Vec<String> {
        let df = read_table(path, b',').unwrap();
        df.column(name).unwrap().str().unwrap().into_iter().map(|v| v.unwrap_or_default().to_string()).collect()
    }

    #[test]
    fn chembl_drugs_map_to_drugbank_with_names() {
        let dir = tempfile::tempdir().unwrap();
        let drugs = dir.path().join("nodes_drug_chembl_phase4.csv");
        fs::write(&drugs, "chembl_id,name\nCHEMBL25,ASPIRIN\nCHEMBL2,PRAZOSIN\nCHEMBL1200,\n").unwrap();
        let unichem = dir.path().join("src1src2.txt");
        fs::write(&unichem, "From src:'1'\tTo src:'2'\nCHEMBL25\tDB00945\nCHEMBL1200\tDB00457\nCHEMBL1200\tDB01234\nCHEMBL99\tDB09999\n").unwrap();

        let summary = chembl_to_drugbank(&drugs, &unichem, dir.path()).unwrap();
        assert_eq!(
            summary,
            MappingSummary {
                seeds: 3,
                mapped: 2,
                unmapped: 1,
                pairs: 3,
            }
        );

        let output = dir.path().join("chembl_to_drugbank.csv");
        assert_eq!(read_table(&output, b',').unwrap().get_column_names_str(), vec!["chembl_id", "drugbank_id", "name"]);
        assert_eq!(column(&output, "drugbank_id"), vec!["DB00457", "DB01234", "DB00945"]);
        assert_eq!(column(&output, "name"), vec!["", "", "ASPIRIN"]);
        assert_eq!(column(&dir.path().join("chembl_unmapped.csv"), "chembl_id"), vec!["CHEMBL2"]);
    }

    #[test]
    fn drug_table_without_chembl_id_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let drugs = dir.path().join("drugs.csv");
        fs::write(&drugs, "id,name\nCHEMBL25,ASPIRIN\n").unwrap();
        let unichem = dir.path().join("src1src2.txt");
        fs::write(&unichem, "From src:'1'\tTo src:'2'\n").unwrap();

        assert!(matches!(chembl_to_drugbank(&drugs, &unichem, dir.path()), Err(Error::MissingColumn { .. })));
    }

    #[test]
    fn uniprot_targets_map_to_entrez_from_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let targets = dir.path().join("nodes_target_uniprot_phase4.csv");
        fs::write(&targets, "uniprot,target_name\nP35348,Alpha-1a adrenergic receptor\nP23219,Cyclooxygenase-1\nQ00000,\n").unwrap();

        let idmapping = dir.path().join("idmapping.dat.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&idmapping).unwrap(), Compression::default());
        encoder
            .write_all(
                b"P35348\tUniProtKB-ID\tADA1A_HUMAN\n\
P35348\tGeneID\t148\n\
P23219\tGeneID\t5742\n\
P23219\tGeneID\t5742\n\
O00000\tGeneID\t1\n\
truncated line\n",
            )
            .unwrap();
        encoder.finish().unwrap();

        let summary = uniprot_to_entrez(&targets, &idmapping, dir.path()).unwrap();
        assert_eq!(
            summary,
            MappingSummary {
                seeds: 3,
                mapped: 2,
                unmapped: 1,
                pairs: 2,
            }
        );
        assert_eq!(column(&dir.path().join("uniprot_to_entrez.csv"), "entrez_id"), vec!["5742", "148"]);
        assert_eq!(column(&dir.path().join("uniprot_unmapped.csv"), "uniprot"), vec!["Q00000"]);
    }

    #[test]
    fn every_gzip_member_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let idmapping = dir.path().join("idmapping.dat.gz");
        let mut file = fs::File::create(&idmapping).unwrap();
        for member in [&b"P35348\tGeneID\t148\n"[..], &b"P23219\tGeneID\t5742\n"[..]] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(member).unwrap();
            file.write_all(&encoder.finish().unwrap()).unwrap();
        }
        drop(file);
        let accessions: BTreeSet<String> = ["P35348".to_string(), "P23219".to_string()].into_iter().collect();

        let mapping = read_idmapping(&idmapping, &accessions).unwrap();
        let expected: BTreeSet<(String, String)> = [("P23219", "5742"), ("P35348", "148")]
            .iter()
            .map(|(l, r)| (l.to_string(), r.to_string()))
            .collect();
        assert_eq!(mapping.pairs().unwrap(), expected);
    }

    #[test]
    fn plain_idmapping_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let idmapping = dir.path().join("idmapping.dat");
        fs::write(&idmapping, "P35348\tGeneID\t148\nP35348\tGeneID\t149\n").unwrap();
        let accessions: BTreeSet<String> = ["P35348".to_string()].into_iter().collect();

        let mapping = read_idmapping(&idmapping, &accessions).unwrap();
        assert_eq!(mapping.right_values().unwrap().len(), 2);
    }
}
