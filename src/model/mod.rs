//! Tabular data model: columns, schema, rows and tables

use crate::error::{AnonError, Result};
use crate::generalization::Generalizer;
use crate::partition::{Partition, Value};
use std::fmt;
use std::sync::Arc;

/// A column definition
///
/// A column with a generalizer is an identifier: it takes part in cost
/// computation and gets generalized. Other columns are carried as they are.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    generalizer: Option<Arc<dyn Generalizer>>,
    weight: f64,
}

impl Column {
    /// Identifier column with weight 1.0
    pub fn identifier<G: Generalizer + 'static>(name: impl Into<String>, generalizer: G) -> Self {
        Self::new(name, Some(Arc::new(generalizer)), 1.0)
    }

    /// Non-identifier column
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, None, 1.0)
    }

    /// Column with an optional shared generalizer; a weight that is not a
    /// positive number falls back to 1.0
    pub fn new(name: impl Into<String>, generalizer: Option<Arc<dyn Generalizer>>, weight: f64) -> Self {
        let weight = if weight.is_finite() && weight > 0.0 { weight } else { 1.0 };
        Self {
            name: name.into(),
            generalizer,
            weight,
        }
    }

    pub fn with_weight(self, weight: f64) -> Self {
        Self::new(self.name, self.generalizer, weight)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generalizer(&self) -> Option<&dyn Generalizer> {
        self.generalizer.as_deref()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_identifier(&self) -> bool {
        self.generalizer.is_some()
    }
}

/// Ordered column definitions
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Indices of identifier columns paired with their generalizers
    pub fn identifiers(&self) -> impl Iterator<Item = (usize, &Column, &dyn Generalizer)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.generalizer().map(|g| (i, c, g)))
    }
}

/// One partition per schema column
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub data: Vec<Partition>,
}

/// A schema plus the rows conforming to it
#[derive(Debug, Clone, Default)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Append a row of raw values
    ///
    /// Identifier cells go through the column generalizer's `init_item`,
    /// other cells become plain items.
    pub fn add_row<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.schema.len() {
            return Err(AnonError::RowArity {
                expected: self.schema.len(),
                actual: values.len(),
            });
        }

        let data = self
            .schema
            .columns()
            .iter()
            .zip(values)
            .map(|(column, value)| match column.generalizer() {
                Some(generalizer) => generalizer.init_item(value),
                None => Partition::Item(value),
            })
            .collect();

        self.rows.push(Row { data });
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for column in self.schema.columns() {
            write!(f, "{}\t", column.name())?;
        }
        writeln!(f)?;
        for row in &self.rows {
            for partition in &row.data {
                write!(f, "{}\t", partition)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
