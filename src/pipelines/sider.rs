use crate::chain::{canonical_integer, extract_pubchem_cid, resolve_chain, MappingTable};
use crate::error::{Error, Result};
use crate::pipelines::unichem::read_unichem;
use crate::tables::{id_frame, read_table, require_columns, require_file, string_set, trimmed, write_table};
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path;

const ALL_SE_COLUMNS: [&str; 5] = ["stitch_id", "umls_cui", "side_effect_name", "method", "meddra_type"];
const FREQ_COLUMNS: [&str; 6] = ["stitch_id", "umls_cui", "frequency_lower", "frequency_upper", "meddra_type", "sample_size"];

/// Reads a headerless TSV laid out as `columns`. Rows shorter than the layout are fatal.
pub fn read_headerless(input: &path::Path, columns: &[&str]) -> Result<DataFrame> {
    require_file(input)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_path(input)?;

    let mut values: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() < columns.len() {
            return Err(Error::MissingColumn {
                source_name: format!("{} line {}", input.display(), line + 1),
                column: columns[record.len()].to_string(),
            });
        }
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(record[idx].trim().to_string());
        }
    }

    let df = DataFrame::new(columns.iter().zip(values).map(|(name, v)| Column::new((*name).into(), v)).collect())?;
    debug!("Shape of {} is {:?}", input.display(), df.shape());
    Ok(df)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSummary {
    pub side_effects: usize,
    pub edges: usize,
}

/// Side effect nodes and drug -> side effect edges with optional frequency bounds.
pub fn extract(all_se: &path::Path, freq: &path::Path, outdir: &path::Path) -> Result<ExtractSummary> {
    let associations = read_headerless(all_se, &ALL_SE_COLUMNS)?;
    info!("Loaded {} SIDER associations", associations.height());

    let edges = associations
        .clone()
        .lazy()
        .select([col("stitch_id"), col("umls_cui")])
        .unique_stable(None, UniqueKeepStrategy::First);

    let edges = match freq.exists() {
        true => {
            let frequencies = read_headerless(freq, &FREQ_COLUMNS)?
                .lazy()
                .select([col("stitch_id"), col("umls_cui"), col("frequency_lower"), col("frequency_upper")])
                .unique_stable(None, UniqueKeepStrategy::First);
            edges.join(
                frequencies,
                [col("stitch_id"), col("umls_cui")],
                [col("stitch_id"), col("umls_cui")],
                JoinArgs::new(JoinType::Left),
            )
        }
        false => {
            warn!("{} not found, frequency columns left empty", freq.display());
            edges.with_columns([
                lit(LiteralValue::untyped_null()).cast(DataType::String).alias("frequency_lower"),
                lit(LiteralValue::untyped_null()).cast(DataType::String).alias("frequency_upper"),
            ])
        }
    }
    .collect()?;

    let side_effects = associations.lazy().select([col("umls_cui"), col("side_effect_name").alias("name")]).collect()?;

    let summary = ExtractSummary {
        side_effects: write_table(side_effects, &outdir.join("nodes_side_effect_sider.csv"))?,
        edges: write_table(edges, &outdir.join("edges_drug_sideeffect_stitch.csv"))?,
    };
    info!("Nodes: {} | Edges: {}", summary.side_effects, summary.edges);
    Ok(summary)
}

/// Well-formed STITCH ids paired with their PubChem CID, plus the ids that
/// failed the pattern.
pub fn stitch_to_pubchem(stitch_ids: &BTreeSet<String>) -> Result<(MappingTable, BTreeSet<String>)> {
    let mut parsed = Vec::new();
    let mut malformed = BTreeSet::new();
    for stitch_id in stitch_ids {
        match extract_pubchem_cid(stitch_id) {
            Some(cid) => parsed.push((stitch_id.clone(), cid)),
            None => {
                malformed.insert(stitch_id.clone());
            }
        }
    }
    Ok((MappingTable::from_pairs("stitch_id", "pubchem_cid", parsed)?, malformed))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapSummary {
    pub stitch_ids: usize,
    pub malformed: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub rows: usize,
    pub approved_rows: Option<usize>,
}

/// STITCH -> PubChem CID -> ChEMBL, with the approved-drug filter applied when
/// its node table is available.
pub fn map_to_chembl(edges_path: &path::Path, unichem: &path::Path, approved_drugs: &path::Path, outdir: &path::Path) -> Result<MapSummary> {
    info!("Loading SIDER STITCH edges from: {}", edges_path.display());
    let edges = read_table(edges_path, b',')?;
    require_columns(&edges, &["stitch_id"], &edges_path.display().to_string())?;
    let has_umls = edges.get_column_names_str().contains(&"umls_cui");

    let stitch_ids = string_set(&edges, "stitch_id")?;
    let (stitch_pubchem, malformed) = stitch_to_pubchem(&stitch_ids)?;
    let well_formed = stitch_pubchem.left_values()?;
    info!("Rows in SIDER edges: {}", edges.height());
    info!("STITCH ids: {}, with valid PubChem CID: {}, malformed: {}", stitch_ids.len(), well_formed.len(), malformed.len());

    info!("Loading UniChem ChEMBL -> PubChem mapping from: {}", unichem.display());
    let (chembl_pubchem, rejected) = read_unichem(unichem, "chembl_id", "pubchem_cid")?.normalize_right(canonical_integer)?;
    if rejected > 0 {
        warn!("{} UniChem rows without an integer PubChem CID skipped", rejected);
    }
    let pubchem_chembl = chembl_pubchem.inverted()?;
    info!("Inverted UniChem mapping rows: {}", pubchem_chembl.len());

    let resolution = resolve_chain(&well_formed, &stitch_pubchem, &[pubchem_chembl])?;
    let mapped = resolution.resolved.left_values()?;
    info!("STITCH ids mapped: {}, unmapped: {}", mapped.len(), resolution.residual.len());

    let mut selection = vec!["stitch_id"];
    let mut sort_columns = vec!["stitch_id", "chembl_id"];
    if has_umls {
        selection.push("umls_cui");
        sort_columns.push("umls_cui");
    }
    let full = resolution
        .path
        .clone()
        .lazy()
        .join(
            edges.lazy().select(selection.iter().map(|c| trimmed(c)).collect::<Vec<_>>()),
            [col("stitch_id")],
            [col("stitch_id")],
            JoinArgs::new(JoinType::Inner),
        )
        .sort(sort_columns.clone(), SortMultipleOptions::default())
        .collect()?;

    let approved_rows = match approved_drugs.exists() {
        true => {
            info!("Filtering mappings to approved ChEMBL drugs using: {}", approved_drugs.display());
            let approved = read_table(approved_drugs, b',')?;
            require_columns(&approved, &["chembl_id"], &approved_drugs.display().to_string())?;
            let approved_ids = string_set(&approved, "chembl_id")?;
            let filtered = full
                .clone()
                .lazy()
                .join(id_frame("chembl_id", &approved_ids)?.lazy(), [col("chembl_id")], [col("chembl_id")], JoinArgs::new(JoinType::Inner))
                .sort(sort_columns, SortMultipleOptions::default())
                .collect()?;
            Some(write_table(filtered, &outdir.join("sider_stitch_to_chembl_phase4.csv"))?)
        }
        false => {
            warn!("{} not found, skipping approved-drug filter", approved_drugs.display());
            None
        }
    };

    let summary = MapSummary {
        stitch_ids: stitch_ids.len(),
        malformed: malformed.len(),
        mapped: mapped.len(),
        unmapped: resolution.residual.len(),
        rows: write_table(full, &outdir.join("sider_stitch_to_chembl_full.csv"))?,
        approved_rows,
    };
    write_table(id_frame("stitch_id", &resolution.residual)?, &outdir.join("sider_stitch_unmapped.csv"))?;
    write_table(id_frame("stitch_id", &malformed)?, &outdir.join("sider_stitch_malformed.csv"))?;
    Ok(summary)
}
