use crate::evidence::extract_evidence;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
    Both,
    Absent,
    Unrecognised,
}

impl Direction {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|d| d.trim().to_lowercase()).as_deref() {
            None | Some("") => Direction::Absent,
            Some("forward") => Direction::Forward,
            Some("reverse") | Some("backward") => Direction::Reverse,
            Some("both") => Direction::Both,
            Some(_) => Direction::Unrecognised,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symmetry {
    /// Only re-oriented when the record is explicitly undirected.
    Asymmetric,
    /// Always stored in the canonical order, whichever endpoint came first.
    Symmetric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    AsIs,
    Swapped,
    Drop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationshipRecord {
    pub relation: String,
    pub source: Endpoint,
    pub target: Endpoint,
    pub direction: Direction,
    pub payload: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalEdge {
    pub relation: &'static str,
    pub subject_id: String,
    pub object_id: String,
    pub evidence: String,
}

/// Canonical (subject kind, object kind) pair of one relation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationRule {
    pub relation: &'static str,
    pub subject_kind: &'static str,
    pub object_kind: &'static str,
    pub symmetry: Symmetry,
}

impl RelationRule {
    pub fn matches(&self, relation: &str) -> bool {
        relation.trim().eq_ignore_ascii_case(self.relation)
    }

    /// Decision table over symmetry x direction x endpoint order.
    pub fn classify(&self, source_kind: &str, target_kind: &str, direction: Direction) -> Orientation {
        let in_order = source_kind == self.subject_kind && target_kind == self.object_kind;
        let flipped = source_kind == self.object_kind && target_kind == self.subject_kind;

        match (self.symmetry, direction, in_order, flipped) {
            (_, Direction::Reverse | Direction::Unrecognised, _, _) => Orientation::Drop,
            (Symmetry::Asymmetric, Direction::Forward | Direction::Absent | Direction::Both, true, _) => Orientation::AsIs,
            (Symmetry::Asymmetric, Direction::Both, false, true) => Orientation::Swapped,
            (Symmetry::Symmetric, _, true, _) => Orientation::AsIs,
            (Symmetry::Symmetric, _, false, true) => Orientation::Swapped,
            _ => Orientation::Drop,
        }
    }

    pub fn normalize(&self, record: &RelationshipRecord) -> Option<CanonicalEdge> {
        if !self.matches(&record.relation) {
            return None;
        }
        let (subject, object) = match self.classify(&record.source.kind, &record.target.kind, record.direction) {
            Orientation::AsIs => (&record.source, &record.target),
            Orientation::Swapped => (&record.target, &record.source),
            Orientation::Drop => return None,
        };
        Some(CanonicalEdge {
            relation: self.relation,
            subject_id: subject.id.clone(),
            object_id: object.id.clone(),
            evidence: extract_evidence(record.payload.as_ref()),
        })
    }
}
