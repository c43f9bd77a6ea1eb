//! Per-facet clause builders.
//!
//! Each selected facet becomes one bool whose `should` clauses OR the
//! selected values together. Values that cannot be compiled are dropped
//! with a warning; the rest of the facet still applies.

use crate::context::FieldNameResolver;
use crate::error::{FacetError, Result};
use crate::query::dsl::{BoolQuery, QueryNode, RangeQuery};
use crate::types::{FacetKind, FieldValue, SelectedFilters, SelectedValue};

fn reject(err: FacetError) {
    tracing::warn!("[CLAUSE] dropping criterion: {}", err);
}

/// Attach the injected relevance filter once the bool has something to
/// constrain.
fn with_injected(mut clause: BoolQuery, inject: Option<&QueryNode>) -> BoolQuery {
    if let Some(filter) = inject {
        if !clause.should.is_empty() {
            clause = clause.filter(filter.clone());
        }
    }
    clause
}

fn term_value(kind: Option<FacetKind>, facet: &str, value: &SelectedValue) -> Result<FieldValue> {
    let raw = match value {
        SelectedValue::Scalar(s) => s,
        SelectedValue::Range { .. } => {
            return Err(FacetError::InvalidTermValue {
                facet: facet.to_string(),
                value: value.to_param(),
            })
        }
    };
    if kind == Some(FacetKind::Category) {
        return raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| FacetError::InvalidTermValue {
                facet: facet.to_string(),
                value: raw.clone(),
            });
    }
    Ok(FieldValue::Text(raw.clone()))
}

/// OR of `term` clauses, one per value. Category ids are matched as integers.
pub fn terms_clause(
    fields: &dyn FieldNameResolver,
    facet: &str,
    values: &[SelectedValue],
    inject: Option<&QueryNode>,
) -> Result<BoolQuery> {
    let field = fields.field_name(facet)?;
    let kind = FacetKind::from_name(facet);

    let clause = values
        .iter()
        .filter(|v| !v.is_empty())
        .filter_map(|v| term_value(kind, facet, v).map_err(reject).ok())
        .fold(BoolQuery::new(), |acc, value| {
            acc.should(QueryNode::Term {
                field: field.clone(),
                value,
            })
        });

    Ok(with_injected(clause, inject))
}

/// OR of `range` clauses. The upper bound gets the inclusive epsilon.
pub fn range_clause(
    fields: &dyn FieldNameResolver,
    facet: &str,
    values: &[SelectedValue],
    inject: Option<&QueryNode>,
) -> Result<BoolQuery> {
    let field = fields.field_name(facet)?;

    let clause = values
        .iter()
        .filter_map(|v| v.numeric_range(facet).map_err(reject).ok().flatten())
        .fold(BoolQuery::new(), |acc, range| {
            acc.should(
                RangeQuery::new(field.clone())
                    .gte(range.min)
                    .lt(range.inclusive_upper()),
            )
        });

    Ok(with_injected(clause, inject))
}

/// Dispatch on the facet kind.
pub fn facet_clause(
    fields: &dyn FieldNameResolver,
    facet: &str,
    values: &[SelectedValue],
    inject: Option<&QueryNode>,
) -> Result<BoolQuery> {
    match FacetKind::from_name(facet) {
        Some(kind) if kind.is_range() => range_clause(fields, facet, values, inject),
        Some(_) => terms_clause(fields, facet, values, inject),
        None => Err(FacetError::UnknownField(facet.to_string())),
    }
}

/// One clause per active selected facet, skipping `excluded`. Facets whose
/// values were all rejected contribute nothing.
pub fn selection_clauses(
    fields: &dyn FieldNameResolver,
    selected: &SelectedFilters,
    excluded: Option<&str>,
    inject: Option<&QueryNode>,
) -> Result<Vec<QueryNode>> {
    selected
        .active_except(excluded)
        .map(|(name, values)| facet_clause(fields, name, values, inject))
        .filter(|clause| !matches!(clause, Ok(c) if c.is_empty()))
        .map(|clause| clause.map(QueryNode::Bool))
        .collect()
}
