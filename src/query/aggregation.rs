//! Facet count aggregations.
//!
//! Each declared facet gets one filter aggregation scoped by the listing's
//! base constraint and by every selected facet except itself, so its option
//! counts answer "what if I also picked this" instead of echoing the current
//! selection.

use super::QueryCompiler;
use crate::error::Result;
use crate::query::clause::selection_clauses;
use crate::query::dsl::{AggregationNode, Aggregations, BoolQuery, QueryNode, RangeBucket};
use crate::types::{FilterData, FilterStruct, NumericRange, RANGE_UPPER_EPSILON};

impl QueryCompiler<'_> {
    pub fn build_aggregation_query(&self, data: &FilterData) -> Result<Aggregations> {
        if data.filters.is_empty() {
            return Ok(Aggregations::default());
        }

        let has_selection = data.selected.has_selection();
        let resolver = self.base_resolver();
        let mut aggregations = Vec::with_capacity(data.filters.len());

        for declared in &data.filters {
            if declared.criteria.is_empty() {
                tracing::debug!("[AGGS] {} has no criteria, skipped", declared.input_name);
                continue;
            }

            let field = self.fields.field_name(&declared.input_name)?;
            let Some(bucket) = bucket_aggregation(declared, &field) else {
                continue;
            };
            let excluded = Some(declared.input_name.as_str());
            let base = resolver.resolve(
                data.controller,
                data.id_entity,
                data.selected.selects_categories(excluded),
            )?;

            let scope = if has_selection {
                let mut must = selection_clauses(self.fields, &data.selected, excluded, None)?;
                if !base.is_empty() {
                    must.push(base.into());
                }
                BoolQuery {
                    must,
                    ..BoolQuery::default()
                }
            } else {
                base
            };

            aggregations.push(AggregationNode::Filter {
                name: field,
                filter: scope.into(),
                aggregations: vec![bucket],
            });
        }

        let text_clauses = self.text_clauses(data)?;
        if !text_clauses.is_empty() {
            aggregations = aggregations
                .into_iter()
                .map(|agg| scope_by_text(agg, &text_clauses))
                .collect();
        }

        tracing::debug!(
            "[AGGS] controller={} declared={} emitted={}",
            data.controller.as_str(),
            data.filters.len(),
            aggregations.len()
        );
        Ok(Aggregations(aggregations))
    }
}

/// Range buckets for price and weight, terms for everything else. The last
/// range bucket is widened so the top of the scale is counted.
fn bucket_aggregation(declared: &FilterStruct, field: &str) -> Option<AggregationNode> {
    let is_range = declared.kind().map(|k| k.is_range()).unwrap_or(false);
    if !is_range {
        return Some(AggregationNode::Terms {
            name: field.to_string(),
            field: field.to_string(),
        });
    }

    let last = declared.criteria.len() - 1;
    let ranges: Vec<RangeBucket> = declared
        .criteria
        .iter()
        .enumerate()
        .filter_map(|(i, criterion)| {
            match NumericRange::parse(&declared.input_name, &criterion.value) {
                Ok(range) => {
                    let extra = if i == last { RANGE_UPPER_EPSILON } else { 0.0 };
                    Some(RangeBucket {
                        key: criterion.value.clone(),
                        from: range.min,
                        to: range.max + extra,
                    })
                }
                Err(e) => {
                    tracing::warn!("[AGGS] dropping bucket: {}", e);
                    None
                }
            }
        })
        .collect();

    if ranges.is_empty() {
        tracing::warn!("[AGGS] {} has no usable buckets, skipped", declared.input_name);
        return None;
    }

    Some(AggregationNode::Range {
        name: field.to_string(),
        field: field.to_string(),
        ranges,
    })
}

/// Require one of the text clauses on top of the facet's own scope.
fn scope_by_text(agg: AggregationNode, text_clauses: &[QueryNode]) -> AggregationNode {
    match agg {
        AggregationNode::Filter {
            name,
            filter,
            aggregations,
        } => {
            let keep_scope = !matches!(&filter, QueryNode::Bool(b) if b.is_empty());
            let scoped = BoolQuery {
                filter: if keep_scope { vec![filter] } else { Vec::new() },
                should: text_clauses.to_vec(),
                minimum_should_match: Some(1),
                ..BoolQuery::default()
            };
            AggregationNode::Filter {
                name,
                filter: scoped.into(),
                aggregations,
            }
        }
        other => other,
    }
}
