// ColumnSchema — derived mapping from column name to column index.
//
// Arrow's own `Schema::column_with_name` already walks `Vec<Field>` linearly;
// this wrapper caches that as a hash map once per batch so repeated
// predicate-column resolution during analysis stays O(1), matching the
// teacher's habit of caching derived lookups next to the raw schema
// (`catalog::mod` did the same for table metadata before it was trimmed).

use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::SchemaRef;

use crate::error::{QueryError, Result};

#[derive(Debug, Clone)]
pub struct ColumnSchema {
    schema: SchemaRef,
    index_by_name: Arc<HashMap<String, usize>>,
}

impl ColumnSchema {
    pub fn new(schema: SchemaRef) -> Self {
        let index_by_name = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().clone(), i))
            .collect();
        Self {
            schema,
            index_by_name: Arc::new(index_by_name),
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Resolve a column name to its index. Case-sensitive.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.index_by_name
            .get(name)
            .copied()
            .ok_or_else(|| QueryError::ColumnNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.fields().is_empty()
    }
}
