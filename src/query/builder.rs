use super::QueryCompiler;
use crate::error::Result;
use crate::query::clause::selection_clauses;
use crate::query::dsl::{BoolQuery, SearchBody, SortClause};
use crate::types::FilterData;

impl QueryCompiler<'_> {
    /// Query returning the products of a listing page.
    ///
    /// With `count_only` the body carries no sort and no pagination, which is
    /// what the total-count request needs.
    pub fn build_result_query(&self, data: &FilterData, count_only: bool) -> Result<SearchBody> {
        let text_clauses = self.text_clauses(data)?;
        let relevance = Self::relevance_filter(&text_clauses);

        let selection = selection_clauses(self.fields, &data.selected, None, relevance.as_ref())?;
        let base = self.base_resolver().resolve(
            data.controller,
            data.id_entity,
            data.selected.selects_categories(None),
        )?;

        let mut root = BoolQuery::new();
        if !selection.is_empty() {
            root = root.must(BoolQuery {
                must: selection,
                ..BoolQuery::default()
            });
        }
        if !base.is_empty() {
            root = root.must(base);
        }
        if !text_clauses.is_empty() {
            root.should = text_clauses;
            root.minimum_should_match = Some(1);
        }

        tracing::debug!(
            "[RESULT] controller={} count_only={} clauses={}",
            data.controller.as_str(),
            count_only,
            root.clause_count()
        );

        let mut body = SearchBody::new(root);
        if count_only {
            return Ok(body);
        }

        body.sort = vec![SortClause {
            field: self.sort_field(&data.order_by),
            way: data.order_way,
        }];
        body.from = Some(data.from);
        body.size = Some(data.size);
        Ok(body)
    }

    /// Facet names sort on their index field; anything else is used verbatim.
    fn sort_field(&self, order_by: &str) -> String {
        self.fields
            .field_name(order_by)
            .unwrap_or_else(|_| order_by.to_string())
    }
}
