//! Index type vocabulary.
//!
//! Declarations spell projection types the way the infrastructure files do
//! (`ALL`, `KEYS_ONLY`, `INCLUDE`). The remote schema vocabulary names the
//! corresponding index types `AllIndex`, `GlobalKeysOnlyIndex` and so on.
//! [`index_type_name`] applies the textual rule and [`IndexType::from_name`]
//! resolves the result through a closed table.

use super::types::{IndexKind, ProjectionType};

/// Every index type the remote schema vocabulary knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    All,
    KeysOnly,
    Include,
    GlobalAll,
    GlobalKeysOnly,
    GlobalInclude,
}

const INDEX_TYPES: [(&str, IndexType); 6] = [
    ("AllIndex", IndexType::All),
    ("KeysOnlyIndex", IndexType::KeysOnly),
    ("IncludeIndex", IndexType::Include),
    ("GlobalAllIndex", IndexType::GlobalAll),
    ("GlobalKeysOnlyIndex", IndexType::GlobalKeysOnly),
    ("GlobalIncludeIndex", IndexType::GlobalInclude),
];

impl IndexType {
    /// Resolves a type identifier such as `GlobalAllIndex`.
    pub fn from_name(name: &str) -> Option<Self> {
        INDEX_TYPES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, index_type)| *index_type)
    }

    pub fn from_parts(kind: IndexKind, projection: ProjectionType) -> Self {
        match (kind, projection) {
            (IndexKind::Local, ProjectionType::All) => IndexType::All,
            (IndexKind::Local, ProjectionType::KeysOnly) => IndexType::KeysOnly,
            (IndexKind::Local, ProjectionType::Include) => IndexType::Include,
            (IndexKind::Global, ProjectionType::All) => IndexType::GlobalAll,
            (IndexKind::Global, ProjectionType::KeysOnly) => IndexType::GlobalKeysOnly,
            (IndexKind::Global, ProjectionType::Include) => IndexType::GlobalInclude,
        }
    }

    pub fn name(&self) -> &'static str {
        INDEX_TYPES
            .iter()
            .find(|(_, index_type)| index_type == self)
            .map(|(name, _)| *name)
            .unwrap_or("AllIndex")
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            IndexType::All | IndexType::KeysOnly | IndexType::Include => IndexKind::Local,
            _ => IndexKind::Global,
        }
    }

    pub fn projection(&self) -> ProjectionType {
        match self {
            IndexType::All | IndexType::GlobalAll => ProjectionType::All,
            IndexType::KeysOnly | IndexType::GlobalKeysOnly => ProjectionType::KeysOnly,
            IndexType::Include | IndexType::GlobalInclude => ProjectionType::Include,
        }
    }
}

/// Builds an index type identifier from a declared projection type.
///
/// Segments separated by `_`, `-` or whitespace are capitalized and joined,
/// `Index` is appended and global indexes get a `Global` prefix:
/// `KEYS_ONLY` becomes `KeysOnlyIndex` or `GlobalKeysOnlyIndex`.
pub fn index_type_name(projection_type: &str, global: bool) -> String {
    let mut name = String::new();
    if global {
        name.push_str("Global");
    }
    for segment in projection_type
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
    {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(&chars.as_str().to_lowercase());
        }
    }
    name.push_str("Index");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_type_name_local() {
        assert_eq!(index_type_name("ALL", false), "AllIndex");
        assert_eq!(index_type_name("KEYS_ONLY", false), "KeysOnlyIndex");
        assert_eq!(index_type_name("INCLUDE", false), "IncludeIndex");
    }

    #[test]
    fn test_index_type_name_global() {
        assert_eq!(index_type_name("ALL", true), "GlobalAllIndex");
        assert_eq!(index_type_name("KEYS_ONLY", true), "GlobalKeysOnlyIndex");
        assert_eq!(index_type_name("include", true), "GlobalIncludeIndex");
    }

    #[test]
    fn test_every_generated_name_resolves() {
        for projection in ["ALL", "KEYS_ONLY", "INCLUDE"] {
            for global in [false, true] {
                let name = index_type_name(projection, global);
                let index_type = IndexType::from_name(&name).unwrap();
                assert_eq!(index_type.name(), name);
                assert_eq!(index_type.kind() == IndexKind::Global, global);
                assert_eq!(index_type.projection().as_str(), projection);
            }
        }
    }

    #[test]
    fn test_unknown_projection_does_not_resolve() {
        assert_eq!(IndexType::from_name(&index_type_name("SOME", true)), None);
    }

    #[test]
    fn test_from_parts_round_trips_through_name() {
        let index_type = IndexType::from_parts(IndexKind::Global, ProjectionType::KeysOnly);
        assert_eq!(index_type, IndexType::GlobalKeysOnly);
        assert_eq!(index_type.name(), "GlobalKeysOnlyIndex");
    }
}
