pub mod aggregation;
pub mod builder;
pub mod clause;
pub mod controller;
pub mod dsl;

use crate::config::{CompilerConfig, DEFAULT_BEST_SALES_MIN_SOLD};
use crate::context::{FieldNameResolver, RequestContext, TextQueryProvider};
use crate::error::{FacetError, Result};
use crate::text::normalize_search_text;
use crate::types::{Controller, FilterData};
use controller::BaseQueryResolver;
use dsl::{Aggregations, BoolQuery, QueryNode, SearchBody};

/// Compiles a [`FilterData`] into the result query and the facet
/// aggregations. Holds only read-only collaborators, so one compiler can
/// serve any number of requests.
pub struct QueryCompiler<'a> {
    fields: &'a dyn FieldNameResolver,
    text: Option<&'a dyn TextQueryProvider>,
    context: Option<RequestContext>,
    best_sales_min_sold: i64,
}

/// Everything a listing page sends to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRequest {
    pub result: SearchBody,
    pub count: SearchBody,
    pub aggregations: Aggregations,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(fields: &'a dyn FieldNameResolver) -> Self {
        QueryCompiler {
            fields,
            text: None,
            context: None,
            best_sales_min_sold: DEFAULT_BEST_SALES_MIN_SOLD,
        }
    }

    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.best_sales_min_sold = config.best_sales_min_sold;
        self
    }

    pub fn with_text_provider(mut self, text: &'a dyn TextQueryProvider) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn compile(&self, data: &FilterData) -> Result<CompiledRequest> {
        Ok(CompiledRequest {
            result: self.build_result_query(data, false)?,
            count: self.build_result_query(data, true)?,
            aggregations: self.build_aggregation_query(data)?,
        })
    }

    pub(crate) fn base_resolver(&self) -> BaseQueryResolver<'_> {
        BaseQueryResolver::new(self.fields, self.context.as_ref(), self.best_sales_min_sold)
    }

    /// Relevance clauses for the text-search listing; empty for every other
    /// listing or when there is no usable text.
    pub(crate) fn text_clauses(&self, data: &FilterData) -> Result<Vec<QueryNode>> {
        if data.controller != Controller::TextSearch {
            return Ok(Vec::new());
        }
        let text = match data.search_query.as_deref().map(normalize_search_text) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(Vec::new()),
        };
        let provider = self
            .text
            .ok_or_else(|| FacetError::Config("no free-text query provider configured".into()))?;
        provider.text_clauses(&text)
    }

    /// The text clauses as one filter: at least one must match.
    pub(crate) fn relevance_filter(text_clauses: &[QueryNode]) -> Option<QueryNode> {
        if text_clauses.is_empty() {
            return None;
        }
        let filter = BoolQuery {
            should: text_clauses.to_vec(),
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        };
        Some(filter.into())
    }
}
