use crate::chain::MappingTable;
use crate::error::{Error, Result};
use crate::tables::require_file;
use log::debug;
use std::path;

const BANNER: &str = "From src";

/// Reads a UniChem source-to-source dump as a `left -> right` mapping.
///
/// Public dumps open with a `From src:'1'\tTo src:'22'` banner and carry the two
/// identifiers positionally; hand-made extracts use a header row naming the
/// columns `left` and `right` instead.
pub fn read_unichem(input: &path::Path, left: &str, right: &str) -> Result<MappingTable> {
    require_file(input)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_path(input)?;
    let mut records = rdr.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return MappingTable::from_pairs(left, right, Vec::<(String, String)>::new()),
    };
    let (left_idx, right_idx) = match header.get(0).is_some_and(|first| first.trim_start().starts_with(BANNER)) {
        true => (0, 1),
        false => {
            let position = |name: &str| {
                header.iter().position(|h| h.trim() == name).ok_or_else(|| Error::MissingColumn {
                    source_name: input.display().to_string(),
                    column: name.to_string(),
                })
            };
            (position(left)?, position(right)?)
        }
    };

    let mut pairs = Vec::new();
    for result in records {
        let record = result?;
        if let (Some(l), Some(r)) = (record.get(left_idx), record.get(right_idx)) {
            pairs.push((l.to_string(), r.to_string()));
        }
    }
    debug!("Read {} rows from {}", pairs.len(), input.display());
    MappingTable::from_pairs(left, right, pairs)
}
