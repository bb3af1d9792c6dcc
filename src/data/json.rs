//! JSON table documents

use crate::generalization::{
    FloatRangeGeneralizer, Generalizer, Hierarchy, HierarchyGeneralizer, IntRangeGeneralizer,
    PrefixGeneralizer, Suppressor,
};
use crate::model::{Column, Schema, Table};
use crate::partition::Value;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A table as stored on disk: column definitions plus rows of raw values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDocument {
    pub columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,

    /// Columns without a generalizer are not identifiers
    #[serde(default)]
    pub generalizer: Option<GeneralizerSpec>,

    #[serde(default)]
    pub weight: Option<f64>,
}

/// Generalizer definition, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneralizerSpec {
    Suppress,
    Hierarchy { children: usize, items: Vec<Value> },
    IntHierarchy { items: Vec<i64> },
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    Prefix { max_words: usize },
}

impl GeneralizerSpec {
    pub fn build(&self) -> Result<Arc<dyn Generalizer>> {
        let generalizer: Arc<dyn Generalizer> = match self {
            GeneralizerSpec::Suppress => Arc::new(Suppressor),
            GeneralizerSpec::Hierarchy { children, items } => Arc::new(HierarchyGeneralizer::new(
                Hierarchy::auto_build(*children, items.iter().cloned())?,
            )),
            GeneralizerSpec::IntHierarchy { items } => {
                Arc::new(HierarchyGeneralizer::from_ints(items.iter().copied())?)
            }
            GeneralizerSpec::IntRange { min, max } => {
                if min > max {
                    return Err(anyhow!("int range {}..{} is empty", min, max));
                }
                Arc::new(IntRangeGeneralizer::new(*min, *max))
            }
            GeneralizerSpec::FloatRange { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(anyhow!("float range {}..{} must have finite bounds", min, max));
                }
                if min > max {
                    return Err(anyhow!("float range {}..{} is empty", min, max));
                }
                Arc::new(FloatRangeGeneralizer::new(*min, *max))
            }
            GeneralizerSpec::Prefix { max_words } => {
                if *max_words == 0 {
                    return Err(anyhow!("prefix generalizer needs at least one word"));
                }
                Arc::new(PrefixGeneralizer::new(*max_words))
            }
        };
        Ok(generalizer)
    }
}

impl TableDocument {
    /// Build the schema and load every row
    pub fn into_table(self) -> Result<Table> {
        let columns = self
            .columns
            .iter()
            .map(|spec| -> Result<Column> {
                let generalizer = spec
                    .generalizer
                    .as_ref()
                    .map(GeneralizerSpec::build)
                    .transpose()
                    .with_context(|| format!("Invalid generalizer for column '{}'", spec.name))?;
                let weight = spec.weight.unwrap_or(1.0);
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(anyhow!(
                        "weight of column '{}' must be positive, got {}",
                        spec.name,
                        weight
                    ));
                }
                Ok(Column::new(spec.name.clone(), generalizer, weight))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut table = Table::new(Schema::new(columns));
        for (idx, row) in self.rows.into_iter().enumerate() {
            table
                .add_row(row)
                .with_context(|| format!("Invalid row {}", idx))?;
        }
        Ok(table)
    }
}

/// Parse a table document from a JSON string
pub fn parse_table(json: &str) -> Result<Table> {
    let document: TableDocument = serde_json::from_str(json).context("Malformed table document")?;
    document.into_table()
}

/// Load a table document from disk
pub fn load_table(path: &str) -> Result<Table> {
    log::info!("Reading table file: {}", path);

    if !Path::new(path).exists() {
        return Err(anyhow!("File not found: {}", path));
    }

    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let table = parse_table(&contents).with_context(|| format!("Failed to load {}", path))?;

    log::info!(
        "Loaded {} rows with {} columns ({} identifiers)",
        table.len(),
        table.schema().len(),
        table.schema().identifiers().count()
    );

    Ok(table)
}
