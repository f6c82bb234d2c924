//! Column resolution.
//!
//! Operations only see the columns declared for their graph, not the whole
//! dataset: [`graph_columns`] picks those out of a [`Dataset`] and
//! [`resolve`] looks operation inputs up among them.

use crate::config::GraphDefinition;
use crate::error::{GraphError, GraphResult};
use crate::models::{Dataset, Series};

/// A series together with the column name it was loaded under.
pub type NamedColumn<'a> = (&'a str, &'a Series);

/// Collect the graph's declared columns from a dataset, in declaration order.
pub fn graph_columns<'a>(
    graph: &'a GraphDefinition,
    dataset: &'a Dataset,
) -> GraphResult<Vec<NamedColumn<'a>>> {
    graph
        .columns
        .iter()
        .map(|name| dataset.column(name).map(|series| (name.as_str(), series)))
        .collect()
}

/// Look up every input column, preserving the requested order.
///
/// Fails on the first name that is not among `available`.
pub fn resolve<'a>(
    columns: &[String],
    available: &[NamedColumn<'a>],
) -> GraphResult<Vec<&'a Series>> {
    columns
        .iter()
        .map(|wanted| {
            available
                .iter()
                .find(|(name, _)| *name == wanted.as_str())
                .map(|(_, series)| *series)
                .ok_or_else(|| GraphError::ColumnNotFound(wanted.clone()))
        })
        .collect()
}
