use crate::error::{Error, Result};
use log::debug;
use std::collections::BTreeSet;
use std::fmt;

/// Column names of one source table as found in a particular release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub alias: String,
    pub columns: BTreeSet<String>,
}

impl TableSchema {
    pub fn new<I, S>(name: &str, alias: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableSchema {
            name: name.to_string(),
            alias: alias.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.alias, column)
    }
}

/// One historical way of joining two tables, declared by the columns it needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinStrategy {
    pub name: &'static str,
    pub left_column: &'static str,
    pub right_column: &'static str,
}

// drug_mechanism -> target_dictionary
pub const MECHANISM_TO_TARGET: &[JoinStrategy] = &[
    JoinStrategy {
        name: "surrogate key",
        left_column: "tid",
        right_column: "tid",
    },
    JoinStrategy {
        name: "natural key",
        left_column: "target_chembl_id",
        right_column: "chembl_id",
    },
    JoinStrategy {
        name: "natural key",
        left_column: "target_chembl_id",
        right_column: "target_chembl_id",
    },
];

// drug_mechanism -> molecule_dictionary
pub const MECHANISM_TO_MOLECULE: &[JoinStrategy] = &[
    JoinStrategy {
        name: "surrogate key",
        left_column: "molregno",
        right_column: "molregno",
    },
    JoinStrategy {
        name: "natural key",
        left_column: "molecule_chembl_id",
        right_column: "chembl_id",
    },
];

// molecule_dictionary -> molecule_synonyms
pub const MOLECULE_TO_SYNONYM: &[JoinStrategy] = &[JoinStrategy {
    name: "surrogate key",
    left_column: "molregno",
    right_column: "molregno",
}];

// target_dictionary -> target_components
pub const TARGET_TO_COMPONENT: &[JoinStrategy] = &[JoinStrategy {
    name: "surrogate key",
    left_column: "tid",
    right_column: "tid",
}];

// target_components -> component_sequences
pub const COMPONENT_TO_SEQUENCE: &[JoinStrategy] = &[JoinStrategy {
    name: "surrogate key",
    left_column: "component_id",
    right_column: "component_id",
}];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinPredicate {
    pub strategy: &'static str,
    pub left_alias: String,
    pub left_column: &'static str,
    pub right_alias: String,
    pub right_column: &'static str,
}

impl JoinPredicate {
    pub fn left_key(&self) -> String {
        format!("{}.{}", self.left_alias, self.left_column)
    }

    pub fn right_key(&self) -> String {
        format!("{}.{}", self.right_alias, self.right_column)
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {} ({})", self.right_key(), self.left_key(), self.strategy)
    }
}

/// Picks the first strategy whose columns exist on both sides. Strategies are
/// tried in the order given, so surrogate keys should come first.
pub fn resolve_join(left: &TableSchema, right: &TableSchema, strategies: &[JoinStrategy]) -> Result<JoinPredicate> {
    let strategy = strategies
        .iter()
        .find(|s| left.has(s.left_column) && right.has(s.right_column))
        .ok_or_else(|| Error::SchemaMismatch {
            left: left.name.clone(),
            right: right.name.clone(),
        })?;

    let predicate = JoinPredicate {
        strategy: strategy.name,
        left_alias: left.alias.clone(),
        left_column: strategy.left_column,
        right_alias: right.alias.clone(),
        right_column: strategy.right_column,
    };
    debug!("{} -> {}: {}", left.name, right.name, predicate);
    Ok(predicate)
}
