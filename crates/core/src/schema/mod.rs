mod document;
mod naming;
mod translator;
mod types;

pub use document::{
    AttributeDeclaration, IndexDeclaration, OneOrMany, SchemaDocument, TableDeclaration,
    TABLE_RESOURCE_KIND,
};
pub use naming::{index_type_name, IndexType};
pub use translator::{translate, SchemaTranslator};
pub use types::{
    AttributeType, IndexDefinition, IndexKind, KeyDefinition, KeyRole, KeySchema, ProjectionType,
    TableSchema, Throughput, DEFAULT_CAPACITY_UNITS,
};
