use crate::error::Result;
use crate::evidence::render_value;
use crate::orientation::{CanonicalEdge, Direction, Endpoint, RelationRule, RelationshipRecord, Symmetry};
use crate::tables::{require_file, write_table};
use bzip2::read::MultiBzDecoder;
use log::{debug, info};
use polars::prelude::*;
use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::{fs, io, path};

#[derive(Debug, Deserialize)]
pub struct HetionetDocument {
    pub nodes: Vec<HetionetNode>,
    pub edges: Vec<HetionetEdge>,
}

#[derive(Debug, Deserialize)]
pub struct HetionetNode {
    pub kind: String,
    pub identifier: Value,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HetionetEdge {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    pub source_id: (String, Value),
    pub target_id: (String, Value),
    #[serde(default)]
    pub data: Option<Value>,
}

impl HetionetEdge {
    pub fn to_record(&self) -> RelationshipRecord {
        RelationshipRecord {
            relation: self.kind.clone().unwrap_or_default(),
            source: Endpoint {
                kind: self.source_id.0.clone(),
                id: render_value(&self.source_id.1),
            },
            target: Endpoint {
                kind: self.target_id.0.clone(),
                id: render_value(&self.target_id.1),
            },
            direction: Direction::parse(self.direction.as_deref()),
            payload: self.data.clone(),
        }
    }
}

struct NodeTable {
    kind: &'static str,
    id_column: &'static str,
    name_column: &'static str,
    file_name: &'static str,
}

const NODE_TABLES: [NodeTable; 4] = [
    NodeTable {
        kind: "Compound",
        id_column: "drugbank_id",
        name_column: "name",
        file_name: "nodes_compound.csv",
    },
    NodeTable {
        kind: "Gene",
        id_column: "entrez_id",
        name_column: "symbol",
        file_name: "nodes_gene.csv",
    },
    NodeTable {
        kind: "Disease",
        id_column: "doid",
        name_column: "name",
        file_name: "nodes_disease.csv",
    },
    NodeTable {
        kind: "Side Effect",
        id_column: "umls_cui",
        name_column: "name",
        file_name: "nodes_sideeffect.csv",
    },
];

struct EdgeTable {
    rule: RelationRule,
    subject_column: &'static str,
    object_column: &'static str,
    file_name: &'static str,
}

// one row per relation kind; the rule fixes which column is the subject
const EDGE_TABLES: [EdgeTable; 4] = [
    EdgeTable {
        rule: RelationRule {
            relation: "binds",
            subject_kind: "Compound",
            object_kind: "Gene",
            symmetry: Symmetry::Asymmetric,
        },
        subject_column: "drugbank_id",
        object_column: "entrez_id",
        file_name: "edges_drug_targets.csv",
    },
    EdgeTable {
        rule: RelationRule {
            relation: "treats",
            subject_kind: "Compound",
            object_kind: "Disease",
            symmetry: Symmetry::Asymmetric,
        },
        subject_column: "drugbank_id",
        object_column: "doid",
        file_name: "edges_drug_treats.csv",
    },
    EdgeTable {
        rule: RelationRule {
            relation: "associates",
            subject_kind: "Gene",
            object_kind: "Disease",
            symmetry: Symmetry::Symmetric,
        },
        subject_column: "entrez_id",
        object_column: "doid",
        file_name: "edges_gene_disease.csv",
    },
    EdgeTable {
        rule: RelationRule {
            relation: "causes",
            subject_kind: "Compound",
            object_kind: "Side Effect",
            symmetry: Symmetry::Asymmetric,
        },
        subject_column: "drugbank_id",
        object_column: "umls_cui",
        file_name: "edges_drug_sideeffect.csv",
    },
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Rows written per output file.
    pub rows: BTreeMap<&'static str, usize>,
    /// Records of a modelled relation whose orientation did not fit.
    pub dropped: usize,
    /// Records of relation kinds with no output table.
    pub unmodelled: usize,
}

pub fn read_document(input: &path::Path) -> Result<HetionetDocument> {
    require_file(input)?;
    let file = fs::File::open(input)?;
    let reader: Box<dyn io::Read> = match input.extension().is_some_and(|ext| ext == "bz2") {
        true => Box::new(MultiBzDecoder::new(file)),
        false => Box::new(file),
    };
    let document: HetionetDocument = serde_json::from_reader(io::BufReader::new(reader))?;
    info!("Loaded {} nodes and {} edges from {}", document.nodes.len(), document.edges.len(), input.display());
    Ok(document)
}

fn two_column_frame(left: &str, right: &str, rows: Vec<(String, String)>) -> Result<DataFrame> {
    let (lefts, rights): (Vec<String>, Vec<String>) = rows.into_iter().unzip();
    Ok(DataFrame::new(vec![Column::new(left.into(), lefts), Column::new(right.into(), rights)])?)
}

fn edge_frame(table: &EdgeTable, edges: Vec<CanonicalEdge>) -> Result<DataFrame> {
    let mut subjects = Vec::with_capacity(edges.len());
    let mut objects = Vec::with_capacity(edges.len());
    let mut evidence = Vec::with_capacity(edges.len());
    for edge in edges {
        subjects.push(edge.subject_id);
        objects.push(edge.object_id);
        evidence.push(edge.evidence);
    }
    Ok(DataFrame::new(vec![
        Column::new(table.subject_column.into(), subjects),
        Column::new(table.object_column.into(), objects),
        Column::new("evidence".into(), evidence),
    ])?)
}

/// Node tables for four kinds and canonically oriented edge tables for four relations.
pub fn extract(document: &HetionetDocument, outdir: &path::Path) -> Result<ExtractSummary> {
    let mut summary = ExtractSummary::default();

    for table in NODE_TABLES.iter() {
        let rows: Vec<(String, String)> = document
            .nodes
            .iter()
            .filter(|n| n.kind == table.kind)
            .map(|n| (render_value(&n.identifier), n.name.clone().unwrap_or_default()))
            .collect();
        debug!("{} {} nodes before deduplication", rows.len(), table.kind);
        let df = two_column_frame(table.id_column, table.name_column, rows)?;
        summary.rows.insert(table.file_name, write_table(df, &outdir.join(table.file_name))?);
    }

    let mut buckets: Vec<Vec<CanonicalEdge>> = EDGE_TABLES.iter().map(|_| Vec::new()).collect();
    for edge in document.edges.iter() {
        let record = edge.to_record();
        match EDGE_TABLES.iter().position(|t| t.rule.matches(&record.relation)) {
            Some(idx) => match EDGE_TABLES[idx].rule.normalize(&record) {
                Some(canonical) => buckets[idx].push(canonical),
                None => summary.dropped += 1,
            },
            None => summary.unmodelled += 1,
        }
    }

    for (table, edges) in EDGE_TABLES.iter().zip(buckets) {
        debug!("{} {} edges before deduplication", edges.len(), table.rule.relation);
        let df = edge_frame(table, edges)?;
        summary.rows.insert(table.file_name, write_table(df, &outdir.join(table.file_name))?);
    }

    for (file_name, rows) in summary.rows.iter() {
        info!("{:30} rows: {}", file_name, rows);
    }
    info!("Dropped by orientation: {}, other relation kinds: {}", summary.dropped, summary.unmodelled);
    Ok(summary)
}
