use crate::error::{Error, Result};
use crate::names::{min_synonym_per_key, resolve_name_column};
use crate::schema::{
    resolve_join, TableSchema, COMPONENT_TO_SEQUENCE, MECHANISM_TO_MOLECULE, MECHANISM_TO_TARGET, MOLECULE_TO_SYNONYM,
    TARGET_TO_COMPONENT,
};
use crate::tables::{join_on, require_file, write_table};
use itertools::Itertools;
use log::{debug, info, warn};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags};
use std::collections::BTreeSet;
use std::path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PhaseFilter {
    /// no filter
    #[value(name = "all")]
    All,
    /// approved drugs (max_phase = 4)
    #[value(name = "4")]
    Approved,
    /// any clinical phase (1..4)
    #[value(name = "1-4")]
    Clinical,
}

impl PhaseFilter {
    pub fn suffix(&self) -> &'static str {
        match self {
            PhaseFilter::All => "all",
            PhaseFilter::Approved => "phase4",
            PhaseFilter::Clinical => "phase1-4",
        }
    }

    pub fn predicate(&self, column: &str) -> Option<Expr> {
        let phase = col(column).cast(DataType::Float64);
        match self {
            PhaseFilter::All => None,
            PhaseFilter::Approved => Some(phase.eq(lit(4.0))),
            PhaseFilter::Clinical => Some(phase.clone().gt_eq(lit(1.0)).and(phase.lt_eq(lit(4.0)))),
        }
    }
}

/// Read access to a ChEMBL SQLite release.
pub struct ChemblDatabase {
    conn: Connection,
}

impl ChemblDatabase {
    pub fn open(db: &path::Path) -> Result<Self> {
        require_file(db)?;
        let conn = Connection::open_with_flags(db, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(ChemblDatabase { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        ChemblDatabase { conn }
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count == 1)
    }

    pub fn schema(&self, table: &str, alias: &str) -> Result<TableSchema> {
        if !self.table_exists(table)? {
            return Err(Error::SourceMissing(format!("table {}", table)));
        }
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let columns = stmt.query_map([], |row| row.get::<_, String>(1))?.collect::<rusqlite::Result<BTreeSet<String>>>()?;
        debug!("{} columns: {:?}", table, columns);
        Ok(TableSchema::new(table, alias, columns))
    }

    /// Loads the given columns as strings, naming each `alias.column`.
    pub fn load(&self, schema: &TableSchema, columns: &[&str]) -> Result<DataFrame> {
        if let Some(missing) = columns.iter().find(|c| !schema.has(c)) {
            return Err(Error::MissingColumn {
                source_name: schema.name.clone(),
                column: missing.to_string(),
            });
        }

        let sql = format!("SELECT {} FROM {}", columns.iter().join(", "), schema.name);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); columns.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, column) in values.iter_mut().enumerate() {
                column.push(match row.get::<_, Value>(idx)? {
                    Value::Null | Value::Blob(_) => None,
                    Value::Integer(v) => Some(v.to_string()),
                    Value::Real(v) => Some(v.to_string()),
                    Value::Text(v) => Some(v),
                });
            }
        }

        let df = DataFrame::new(
            columns
                .iter()
                .zip(values)
                .map(|(name, v)| Column::new(schema.qualified(name).into(), v))
                .collect(),
        )?;
        debug!("Shape of {} is {:?}", schema.name, df.shape());
        Ok(df)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractOptions {
    pub outdir: path::PathBuf,
    pub phase: PhaseFilter,
    pub fill_synonyms: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSummary {
    pub drugs: usize,
    pub edges: usize,
    pub targets: usize,
}

fn with_keys<'a>(needed: &[&'a str], keys: &[&'a str]) -> Vec<&'a str> {
    needed.iter().chain(keys.iter()).copied().unique().collect()
}

/// Drug nodes, drug -> target edges and target nodes for one phase selection.
pub fn extract(db: &ChemblDatabase, options: &ExtractOptions) -> Result<ExtractSummary> {
    let md = db.schema("molecule_dictionary", "md")?;
    let dm = db.schema("drug_mechanism", "dm")?;
    let td = db.schema("target_dictionary", "td")?;
    let tc = db.schema("target_components", "tc")?;
    let cs = db.schema("component_sequences", "cs")?;

    let dm_td = resolve_join(&dm, &td, MECHANISM_TO_TARGET)?;
    let dm_md = resolve_join(&dm, &md, MECHANISM_TO_MOLECULE)?;
    let td_tc = resolve_join(&td, &tc, TARGET_TO_COMPONENT)?;
    let tc_cs = resolve_join(&tc, &cs, COMPONENT_TO_SEQUENCE)?;
    info!("drug_mechanism -> target_dictionary: {}", dm_td);
    info!("drug_mechanism -> molecule_dictionary: {}", dm_md);

    let synonyms = match (options.fill_synonyms, db.table_exists("molecule_synonyms")?) {
        (true, true) => {
            let ms = db.schema("molecule_synonyms", "ms")?;
            let md_ms = resolve_join(&md, &ms, MOLECULE_TO_SYNONYM)?;
            let raw = db.load(&ms, &with_keys(&["synonyms"], &[md_ms.right_column]))?;
            info!("Loaded {} synonym rows", raw.height());
            let per_molecule = min_synonym_per_key(raw.lazy(), &md_ms.right_key(), &ms.qualified("synonyms"), "synonym");
            Some((md_ms, per_molecule))
        }
        (true, false) => {
            warn!("molecule_synonyms not found, names fall back to pref_name then chembl_id");
            None
        }
        (false, _) => None,
    };

    let mut md_keys = vec![dm_md.right_column];
    if let Some((md_ms, _)) = &synonyms {
        md_keys.push(md_ms.left_column);
    }
    let mut molecules = db
        .load(&md, &with_keys(&["chembl_id", "pref_name", "max_phase"], &md_keys))?
        .lazy()
        .filter(col("md.chembl_id").is_not_null());
    if let Some(phase) = options.phase.predicate("md.max_phase") {
        molecules = molecules.filter(phase);
    }

    // drug nodes
    let (named, candidates) = match synonyms {
        Some((md_ms, per_molecule)) => (join_on(molecules.clone(), per_molecule, &md_ms, JoinType::Left), vec!["md.pref_name", "synonym"]),
        None => (molecules.clone(), vec!["md.pref_name"]),
    };
    let named = resolve_name_column(&named.collect()?, &candidates, "md.chembl_id", "name")?;
    let drugs = named.lazy().select([col("md.chembl_id").alias("chembl_id"), col("name")]).collect()?;

    // drug -> target edges
    let mechanisms = db.load(&dm, &with_keys(&["mechanism_of_action", "action_type"], &[dm_md.left_column, dm_td.left_column]))?;
    let targets = db.load(&td, &with_keys(&["pref_name"], &[dm_td.right_column, td_tc.left_column]))?;
    let components = db.load(&tc, &with_keys(&[], &[td_tc.right_column, tc_cs.left_column]))?;
    let sequences = db.load(&cs, &with_keys(&["accession"], &[tc_cs.right_column]))?;
    info!(
        "Loaded {} mechanisms, {} targets, {} components, {} sequences",
        mechanisms.height(),
        targets.height(),
        components.height(),
        sequences.height()
    );

    let edge_frame = join_on(mechanisms.lazy(), molecules, &dm_md, JoinType::Inner);
    let edge_frame = join_on(edge_frame, targets.clone().lazy(), &dm_td, JoinType::Inner);
    let edge_frame = join_on(edge_frame, components.clone().lazy(), &td_tc, JoinType::Inner);
    let edges = join_on(edge_frame, sequences.clone().lazy(), &tc_cs, JoinType::Inner)
        .filter(col("md.chembl_id").is_not_null().and(col("cs.accession").is_not_null()))
        .select([
            col("md.chembl_id").alias("chembl_id"),
            col("cs.accession").alias("uniprot"),
            col("dm.mechanism_of_action").alias("mechanism"),
            col("dm.action_type").alias("action_type"),
        ])
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;

    // target nodes, only those referenced by edges
    let target_names = join_on(targets.lazy(), components.lazy(), &td_tc, JoinType::Inner);
    let target_names = join_on(target_names, sequences.lazy(), &tc_cs, JoinType::Inner)
        .select([col("cs.accession").alias("uniprot"), col("td.pref_name").alias("target_name")])
        .unique_stable(None, UniqueKeepStrategy::First);
    let target_nodes = edges
        .clone()
        .lazy()
        .select([col("uniprot")])
        .unique_stable(None, UniqueKeepStrategy::First)
        .join(target_names, [col("uniprot")], [col("uniprot")], JoinArgs::new(JoinType::Left))
        .with_column(col("target_name").fill_null(lit("")))
        .collect()?;

    let suffix = options.phase.suffix();
    let summary = ExtractSummary {
        drugs: write_table(drugs, &options.outdir.join(format!("nodes_drug_chembl_{}.csv", suffix)))?,
        edges: write_table(edges, &options.outdir.join(format!("edges_drug_targets_chembl_{}.csv", suffix)))?,
        targets: write_table(target_nodes, &options.outdir.join(format!("nodes_target_uniprot_{}.csv", suffix)))?,
    };
    info!("drugs: {}, edges: {}, targets: {}", summary.drugs, summary.edges, summary.targets);
    Ok(summary)
}
