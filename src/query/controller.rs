//! Base constraint for each listing type.
//!
//! The resolver is a pure function of its inputs: it reads the request
//! context it is handed and keeps nothing between calls, so the result query
//! and every facet aggregation see the same base constraint.

use crate::context::{FieldNameResolver, RequestContext};
use crate::error::{FacetError, Result};
use crate::query::clause::terms_clause;
use crate::query::dsl::{BoolQuery, QueryNode, RangeQuery};
use crate::types::{Controller, SelectedValue};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct BaseQueryResolver<'a> {
    fields: &'a dyn FieldNameResolver,
    context: Option<&'a RequestContext>,
    best_sales_min_sold: i64,
}

impl<'a> BaseQueryResolver<'a> {
    pub fn new(
        fields: &'a dyn FieldNameResolver,
        context: Option<&'a RequestContext>,
        best_sales_min_sold: i64,
    ) -> Self {
        BaseQueryResolver {
            fields,
            context,
            best_sales_min_sold,
        }
    }

    /// An empty bool means the listing adds no constraint.
    /// `categories_selected` suppresses the category constraint when the
    /// applicable selection already picks categories.
    pub fn resolve(
        &self,
        controller: Controller,
        id_entity: i64,
        categories_selected: bool,
    ) -> Result<BoolQuery> {
        let base = match controller {
            Controller::Manufacturer => self.manufacturer(id_entity)?,
            Controller::PricesDrop => self.prices_drop()?,
            Controller::BestSales => self.best_sales(),
            Controller::NewProducts => self.new_products()?,
            Controller::TextSearch => BoolQuery::new(),
            Controller::Category | Controller::Default => {
                if categories_selected {
                    tracing::debug!("[BASE] categories selected, skipping category constraint");
                    BoolQuery::new()
                } else {
                    self.category(id_entity)?
                }
            }
        };
        tracing::debug!(
            "[BASE] controller={} id={} clauses={}",
            controller.as_str(),
            id_entity,
            base.clause_count()
        );
        Ok(base)
    }

    fn require_context(&self, controller: Controller) -> Result<&'a RequestContext> {
        self.context.ok_or_else(|| {
            FacetError::Config(format!(
                "listing '{}' needs a request context",
                controller.as_str()
            ))
        })
    }

    fn manufacturer(&self, id_manufacturer: i64) -> Result<BoolQuery> {
        let field = self.fields.field_name("manufacturer")?;
        Ok(BoolQuery::new().must(QueryNode::term(field, id_manufacturer)))
    }

    fn category(&self, id_category: i64) -> Result<BoolQuery> {
        let categories = terms_clause(
            self.fields,
            "category",
            &[SelectedValue::scalar(id_category.to_string())],
            None,
        )?;
        Ok(BoolQuery::new().must(categories))
    }

    fn prices_drop(&self) -> Result<BoolQuery> {
        let ctx = self.require_context(Controller::PricesDrop)?;
        Ok(BoolQuery::new().must_not(QueryNode::term(ctx.reduction_field(), 0i64)))
    }

    fn best_sales(&self) -> BoolQuery {
        BoolQuery::new().must(RangeQuery::new("number_sold").gt(self.best_sales_min_sold))
    }

    fn new_products(&self) -> Result<BoolQuery> {
        let ctx = self.require_context(Controller::NewProducts)?;
        let since = ctx.new_products_since()?.format(DATE_FORMAT).to_string();
        Ok(BoolQuery::new().must(RangeQuery::new("date_add").gt(since)))
    }
}
