use crate::error::Result;
use polars::prelude::*;

/// First candidate that is present and not blank, else the fallback identifier.
///
/// A blank candidate counts as missing, so an empty preferred name never hides a
/// usable synonym.
pub fn resolve_name<'a, I>(candidates: I, fallback: &str) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates.into_iter().flatten().find(|c| !c.trim().is_empty()).unwrap_or(fallback).to_string()
}

/// Adds `output` to `df`, resolving one name per row from the candidate columns
/// in priority order and falling back to the row's identifier column.
pub fn resolve_name_column(df: &DataFrame, candidates: &[&str], fallback: &str, output: &str) -> Result<DataFrame> {
    let candidate_columns = candidates.iter().map(|name| Ok(df.column(name)?.str()?)).collect::<Result<Vec<_>>>()?;
    let fallback_column = df.column(fallback)?.str()?;

    let names: Vec<String> = (0..df.height())
        .map(|idx| resolve_name(candidate_columns.iter().map(|c| c.get(idx)), fallback_column.get(idx).unwrap_or_default()))
        .collect();

    let mut named = df.clone();
    named.with_column(Column::new(output.into(), names))?;
    Ok(named)
}

/// One synonym per key: the lexicographically smallest non-blank value, so the
/// choice never depends on the order rows come back from the source.
pub fn min_synonym_per_key(synonyms: LazyFrame, key: &str, value: &str, output: &str) -> LazyFrame {
    synonyms
        .with_column(col(value).str().strip_chars(lit(LiteralValue::untyped_null())).alias(value))
        .filter(col(value).is_not_null().and(col(value).neq(lit(""))))
        .group_by([col(key)])
        .agg([col(value).min().alias(output)])
}
