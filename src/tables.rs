use crate::error::{Error, Result};
use crate::schema::JoinPredicate;
use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::{fs, path};

pub fn require_file(path: &path::Path) -> Result<()> {
    match path.exists() {
        true => Ok(()),
        false => Err(Error::SourceMissing(path.display().to_string())),
    }
}

/// Reads a delimited file with a header row, keeping every column as a string.
pub fn read_table(path: &path::Path, separator: u8) -> Result<DataFrame> {
    require_file(path)?;
    let df = LazyCsvReader::new(path)
        .with_separator(separator)
        .with_infer_schema_length(Some(0))
        .with_truncate_ragged_lines(true)
        .with_has_header(true)
        .finish()?
        .collect()?;
    debug!("Shape of {} is {:?}", path.display(), df.shape());
    Ok(df)
}

pub fn require_columns(df: &DataFrame, columns: &[&str], source_name: &str) -> Result<()> {
    let available = df.get_column_names_str();
    match columns.iter().find(|column| !available.contains(*column)) {
        Some(column) => Err(Error::MissingColumn {
            source_name: source_name.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// String column with surrounding whitespace removed, keeping its name.
pub fn trimmed(name: &str) -> Expr {
    col(name).cast(DataType::String).str().strip_chars(lit(LiteralValue::untyped_null())).alias(name)
}

/// Distinct, trimmed, non-empty values of a string column.
pub fn string_set(df: &DataFrame, column: &str) -> Result<BTreeSet<String>> {
    let values = df.column(column)?.str()?;
    Ok(values.into_iter().flatten().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string).collect())
}

pub fn id_frame(column: &str, ids: &BTreeSet<String>) -> Result<DataFrame> {
    let values: Vec<&str> = ids.iter().map(String::as_str).collect();
    Ok(DataFrame::new(vec![Column::new(column.into(), values)])?)
}

/// Joins two frames whose columns are qualified by table alias. Both key columns
/// are kept so either side's identifier can be projected afterwards.
pub fn join_on(left: LazyFrame, right: LazyFrame, predicate: &JoinPredicate, how: JoinType) -> LazyFrame {
    let left_key = predicate.left_key();
    let right_key = predicate.right_key();
    left.join(
        right,
        [col(left_key.as_str())],
        [col(right_key.as_str())],
        JoinArgs::new(how).with_coalesce(JoinCoalesce::KeepColumns),
    )
}

pub fn distinct(df: DataFrame) -> Result<DataFrame> {
    Ok(df.lazy().unique_stable(None, UniqueKeepStrategy::First).collect()?)
}

/// Deduplicates on the full row and writes a comma-delimited file with a header,
/// returning the number of data rows written.
pub fn write_table(df: DataFrame, output: &path::Path) -> Result<usize> {
    let mut df = distinct(df)?;
    if let Some(parent_dir) = output.parent() {
        fs::create_dir_all(parent_dir)?;
    }
    let mut file = fs::File::create(output)?;
    CsvWriter::new(&mut file).include_header(true).with_separator(b',').finish(&mut df)?;
    info!("Wrote {} rows to {}", df.height(), output.display());
    Ok(df.height())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{resolve_join, JoinStrategy, TableSchema};

    #[test]
    fn string_set_trims_and_skips_blanks() {
        let df = df!("chembl_id" => &[Some(" CHEMBL25 "), Some("CHEMBL25"), Some(""), None, Some("CHEMBL1")]).unwrap();
        let ids = string_set(&df, "chembl_id").unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["CHEMBL1".to_string(), "CHEMBL25".to_string()]);
    }

    #[test]
    fn require_columns_names_the_missing_column() {
        let df = df!("chembl_id" => &["CHEMBL25"]).unwrap();
        assert!(require_columns(&df, &["chembl_id"], "drugs.csv").is_ok());
        match require_columns(&df, &["chembl_id", "drugbank_id"], "src1src2.txt") {
            Err(Error::MissingColumn { source_name, column }) => {
                assert_eq!(source_name, "src1src2.txt");
                assert_eq!(column, "drugbank_id");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn join_on_keeps_both_qualified_keys() {
        let mechanisms = df!("dm.molecule_chembl_id" => &["CHEMBL25", "CHEMBL2"], "dm.action_type" => &["INHIBITOR", "AGONIST"]).unwrap();
        let molecules = df!("md.chembl_id" => &["CHEMBL25"], "md.pref_name" => &["ASPIRIN"]).unwrap();
        const NATURAL: &[JoinStrategy] = &[JoinStrategy {
            name: "natural key",
            left_column: "molecule_chembl_id",
            right_column: "chembl_id",
        }];
        let predicate = resolve_join(
            &TableSchema::new("drug_mechanism", "dm", ["molecule_chembl_id", "action_type"]),
            &TableSchema::new("molecule_dictionary", "md", ["chembl_id", "pref_name"]),
            NATURAL,
        )
        .unwrap();

        let joined = join_on(mechanisms.lazy(), molecules.lazy(), &predicate, JoinType::Inner).collect().unwrap();
        assert_eq!(joined.height(), 1);
        assert!(joined.get_column_names_str().contains(&"md.chembl_id"));
        assert!(joined.get_column_names_str().contains(&"dm.molecule_chembl_id"));
    }

    #[test]
    fn write_table_deduplicates_rows() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("nodes.csv");
        let df = df!("umls_cui" => &["C0000737", "C0000737", "C0002418"], "name" => &["pain", "pain", "amblyopia"]).unwrap();
        assert_eq!(write_table(df, &output).unwrap(), 2);

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().next(), Some("umls_cui,name"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn read_table_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.csv");
        assert!(matches!(read_table(&missing, b','), Err(Error::SourceMissing(_))));
    }
}
