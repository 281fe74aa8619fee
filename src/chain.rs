use crate::error::Result;
use crate::tables::{id_frame, string_set, trimmed};
use lazy_static::lazy_static;
use log::debug;
use polars::prelude::*;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref STITCH_ID: Regex = Regex::new(r"^CID0*([1-9]\d*|0)$").expect("Could not create STITCH id regex");
}

/// `CID000010917` -> `10917`, kept as a digit string of any length. Anything not
/// matching the STITCH pattern is `None`.
pub fn extract_pubchem_cid(stitch_id: &str) -> Option<String> {
    let captures = STITCH_ID.captures(stitch_id.trim())?;
    Some(captures.get(1)?.as_str().to_string())
}

/// Integer identifiers rendered without padding, e.g. `" 00123"` -> `"123"`.
pub fn canonical_integer(value: &str) -> Option<String> {
    let digits = value.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.trim_start_matches('0') {
        "" => Some("0".to_string()),
        significant => Some(significant.to_string()),
    }
}

/// Many-to-many pairs between two identifier namespaces. Both columns are
/// trimmed non-empty strings and no pair appears twice.
#[derive(Clone, Debug)]
pub struct MappingTable {
    left: String,
    right: String,
    frame: DataFrame,
}

impl MappingTable {
    pub fn new(frame: DataFrame, left: &str, right: &str) -> Result<Self> {
        let frame = frame
            .lazy()
            .select([trimmed(left), trimmed(right)])
            .filter(
                col(left)
                    .is_not_null()
                    .and(col(right).is_not_null())
                    .and(col(left).neq(lit("")))
                    .and(col(right).neq(lit(""))),
            )
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        Ok(MappingTable {
            left: left.to_string(),
            right: right.to_string(),
            frame,
        })
    }

    pub fn from_pairs<I, L, R>(left: &str, right: &str, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let (lefts, rights): (Vec<String>, Vec<String>) = pairs.into_iter().map(|(l, r)| (l.into(), r.into())).unzip();
        let frame = DataFrame::new(vec![Column::new(left.into(), lefts), Column::new(right.into(), rights)])?;
        Self::new(frame, left, right)
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn left_values(&self) -> Result<BTreeSet<String>> {
        string_set(&self.frame, &self.left)
    }

    pub fn right_values(&self) -> Result<BTreeSet<String>> {
        string_set(&self.frame, &self.right)
    }

    pub fn pairs(&self) -> Result<BTreeSet<(String, String)>> {
        let lefts = self.frame.column(&self.left)?.str()?;
        let rights = self.frame.column(&self.right)?.str()?;
        Ok(lefts
            .into_iter()
            .zip(rights.into_iter())
            .filter_map(|(l, r)| Some((l?.to_string(), r?.to_string())))
            .collect())
    }

    /// Same pairs read in the other direction.
    pub fn inverted(&self) -> Result<Self> {
        Ok(MappingTable {
            left: self.right.clone(),
            right: self.left.clone(),
            frame: self.frame.select([self.right.as_str(), self.left.as_str()])?,
        })
    }

    /// Rewrites right-hand values, dropping pairs the function rejects.
    /// Returns the rewritten table and the number of rejected pairs.
    pub fn normalize_right<F>(&self, normalize: F) -> Result<(Self, usize)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pairs = self.pairs()?;
        let before = pairs.len();
        let kept: Vec<(String, String)> = pairs.into_iter().filter_map(|(l, r)| normalize(&r).map(|r| (l, r))).collect();
        let rejected = before - kept.len();
        Ok((Self::from_pairs(&self.left, &self.right, kept)?, rejected))
    }

    /// Pairs whose right-hand value is in `ids`.
    pub fn restrict_right(&self, ids: &BTreeSet<String>) -> Result<Self> {
        let keep = id_frame(&self.right, ids)?;
        let frame = self
            .frame
            .clone()
            .lazy()
            .join(keep.lazy(), [col(self.right.as_str())], [col(self.right.as_str())], JoinArgs::new(JoinType::Inner))
            .collect()?;
        Self::new(frame, &self.left, &self.right)
    }

    /// Transitive inner join `self.left -> self.right == next.left -> next.right`.
    pub fn compose(&self, next: &MappingTable) -> Result<Self> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .join(
                next.frame.clone().lazy(),
                [col(self.right.as_str())],
                [col(next.left.as_str())],
                JoinArgs::new(JoinType::Inner),
            )
            .select([col(self.left.as_str()), col(next.right.as_str())])
            .collect()?;
        Self::new(frame, &self.left, &next.right)
    }
}

#[derive(Clone, Debug)]
pub struct ChainResolution {
    /// Seed -> final identifier pairs.
    pub resolved: MappingTable,
    /// Every surviving seed -> intermediate -> final combination, one column per namespace.
    pub path: DataFrame,
    /// Seeds with no complete chain.
    pub residual: BTreeSet<String>,
}

/// Resolves seeds through one or more mappings by successive inner joins on the
/// shared namespace. Seeds without a complete chain are returned as residuals,
/// and every seed appears either in `resolved` or in `residual`, never both.
pub fn resolve_chain(seeds: &BTreeSet<String>, first: &MappingTable, rest: &[MappingTable]) -> Result<ChainResolution> {
    let seed_column = first.left().to_string();
    let mut path = id_frame(&seed_column, seeds)?.lazy().join(
        first.frame().clone().lazy(),
        [col(seed_column.as_str())],
        [col(seed_column.as_str())],
        JoinArgs::new(JoinType::Inner),
    );
    let mut shared = first.right().to_string();
    debug!("{} -> {}: {} pairs", first.left(), first.right(), first.len());

    for mapping in rest {
        debug!("{} -> {}: {} pairs", mapping.left(), mapping.right(), mapping.len());
        path = path
            .join(
                mapping.frame().clone().lazy(),
                [col(shared.as_str())],
                [col(mapping.left())],
                JoinArgs::new(JoinType::Inner),
            )
            .unique_stable(None, UniqueKeepStrategy::First);
        shared = mapping.right().to_string();
    }

    let path = path.unique_stable(None, UniqueKeepStrategy::First).collect()?;
    let resolved = MappingTable::new(path.clone(), &seed_column, &shared)?;
    let mapped = resolved.left_values()?;
    let residual: BTreeSet<String> = seeds.difference(&mapped).cloned().collect();

    Ok(ChainResolution { resolved, path, residual })
}

#[cfg(test)]
mod test {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn pairs(values: &[(&str, &str)]) -> BTreeSet<(String, String)> {
        values.iter().map(|(l, r)| (l.to_string(), r.to_string())).collect()
    }

    fn stitch_to_pubchem() -> MappingTable {
        MappingTable::from_pairs("stitch_id", "pubchem_cid", [("CID000002244", "2244"), ("CID000010917", "10917"), ("CID000003672", "3672")]).unwrap()
    }

    fn pubchem_to_chembl() -> MappingTable {
        MappingTable::from_pairs(
            "pubchem_cid",
            "chembl_id",
            [("2244", "CHEMBL25"), ("10917", "CHEMBL1200"), ("10917", "CHEMBL3989520"), ("999", "CHEMBL1")],
        )
        .unwrap()
    }

    #[test]
    fn stitch_ids_parse_strictly() {
        assert_eq!(extract_pubchem_cid("CID000010917").as_deref(), Some("10917"));
        assert_eq!(extract_pubchem_cid("CID0").as_deref(), Some("0"));
        assert_eq!(extract_pubchem_cid("CID0000").as_deref(), Some("0"));
        assert_eq!(extract_pubchem_cid(" CID100000085 ").as_deref(), Some("100000085"));
        assert_eq!(extract_pubchem_cid("ABC123"), None);
        assert_eq!(extract_pubchem_cid("CID"), None);
        assert_eq!(extract_pubchem_cid("CID12a"), None);
        assert_eq!(extract_pubchem_cid("cid000010917"), None);
    }

    #[test]
    fn long_stitch_ids_are_not_malformed() {
        assert_eq!(extract_pubchem_cid("CID99999999999999999999999").as_deref(), Some("99999999999999999999999"));
        assert_eq!(canonical_integer("0099999999999999999999999"), Some("99999999999999999999999".to_string()));
    }

    #[test]
    fn canonical_integers() {
        assert_eq!(canonical_integer(" 0024949403"), Some("24949403".to_string()));
        assert_eq!(canonical_integer("000"), Some("0".to_string()));
        assert_eq!(canonical_integer("n/a"), None);
        assert_eq!(canonical_integer("-5"), None);
        assert_eq!(canonical_integer(""), None);
    }

    #[test]
    fn mapping_rows_are_trimmed_and_deduplicated() {
        let table = MappingTable::from_pairs("chembl_id", "drugbank_id", [(" CHEMBL25 ", "DB00945"), ("CHEMBL25", "DB00945 "), ("", "DB00001"), ("CHEMBL2", " ")]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.pairs().unwrap(), pairs(&[("CHEMBL25", "DB00945")]));
    }

    #[test]
    fn chain_keeps_every_combination_and_reports_residuals() {
        let seeds = ids(&["CID000002244", "CID000010917", "CID000003672", "CID000000001"]);
        let resolution = resolve_chain(&seeds, &stitch_to_pubchem(), &[pubchem_to_chembl()]).unwrap();

        assert_eq!(
            resolution.resolved.pairs().unwrap(),
            pairs(&[("CID000002244", "CHEMBL25"), ("CID000010917", "CHEMBL1200"), ("CID000010917", "CHEMBL3989520")])
        );
        assert_eq!(resolution.residual, ids(&["CID000000001", "CID000003672"]));
        assert_eq!(resolution.path.get_column_names_str(), vec!["stitch_id", "pubchem_cid", "chembl_id"]);
        assert_eq!(resolution.path.height(), 3);
    }

    #[test]
    fn residual_is_exactly_seeds_minus_resolved() {
        let seeds = ids(&["CID000002244", "CID000010917", "CID000003672", "CID000000001"]);
        let resolution = resolve_chain(&seeds, &stitch_to_pubchem(), &[pubchem_to_chembl()]).unwrap();
        let mapped = resolution.resolved.left_values().unwrap();

        assert!(mapped.is_disjoint(&resolution.residual));
        let union: BTreeSet<String> = mapped.union(&resolution.residual).cloned().collect();
        assert_eq!(union, seeds);
    }

    #[test]
    fn precomposed_chain_matches_stepwise_chain() {
        let seeds = ids(&["CID000002244", "CID000010917", "CID000003672", "CID000000001"]);
        let stepwise = resolve_chain(&seeds, &stitch_to_pubchem(), &[pubchem_to_chembl()]).unwrap();
        let precomposed = resolve_chain(&seeds, &stitch_to_pubchem().compose(&pubchem_to_chembl()).unwrap(), &[]).unwrap();

        assert_eq!(stepwise.resolved.pairs().unwrap(), precomposed.resolved.pairs().unwrap());
        assert_eq!(stepwise.residual, precomposed.residual);
    }

    #[test]
    fn empty_mapping_leaves_everything_residual() {
        let seeds = ids(&["P04637", "P00533"]);
        let empty = MappingTable::from_pairs("uniprot", "entrez_id", Vec::<(String, String)>::new()).unwrap();
        let resolution = resolve_chain(&seeds, &empty, &[]).unwrap();
        assert!(resolution.resolved.is_empty());
        assert_eq!(resolution.residual, seeds);
    }

    #[test]
    fn inverted_and_restricted_tables() {
        let chembl_to_pubchem = pubchem_to_chembl().inverted().unwrap();
        assert_eq!(chembl_to_pubchem.left(), "chembl_id");
        assert!(chembl_to_pubchem.pairs().unwrap().contains(&("CHEMBL25".to_string(), "2244".to_string())));

        let restricted = pubchem_to_chembl().restrict_right(&ids(&["CHEMBL1200", "CHEMBL25"])).unwrap();
        assert_eq!(restricted.right_values().unwrap(), ids(&["CHEMBL1200", "CHEMBL25"]));
    }

    #[test]
    fn normalize_right_counts_rejections() {
        let raw = MappingTable::from_pairs("chembl_id", "pubchem_cid", [("CHEMBL25", "002244"), ("CHEMBL2", "not-a-cid")]).unwrap();
        let (normalized, rejected) = raw.normalize_right(canonical_integer).unwrap();
        assert_eq!(rejected, 1);
        assert_eq!(normalized.pairs().unwrap(), pairs(&[("CHEMBL25", "2244")]));
    }
}
