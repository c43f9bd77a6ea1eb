//! Collaborators the compiler calls into: field-name mapping, per-request
//! shop context and the free-text query builder.

use crate::config::CompilerConfig;
use crate::error::{FacetError, Result};
use crate::query::dsl::QueryNode;
use crate::types::FacetKind;
use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Maps a logical filter name to the index field that stores it.
pub trait FieldNameResolver {
    fn field_name(&self, logical: &str) -> Result<String>;
}

static STATIC_FIELD_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("category", "categories"),
        ("manufacturer", "id_manufacturer"),
        ("price", "price"),
        ("weight", "weight"),
        ("quantity", "in_stock"),
    ])
});

/// Built-in mapping; `feature_<id>` and `attribute_group_<id>` map to
/// themselves. Overrides win over the built-in table.
#[derive(Debug, Clone, Default)]
pub struct DefaultFieldNames {
    overrides: IndexMap<String, String>,
}

impl DefaultFieldNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: IndexMap<String, String>) -> Self {
        DefaultFieldNames { overrides }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::with_overrides(config.field_names.clone())
    }
}

impl FieldNameResolver for DefaultFieldNames {
    fn field_name(&self, logical: &str) -> Result<String> {
        if let Some(field) = self.overrides.get(logical) {
            return Ok(field.clone());
        }
        if let Some(field) = STATIC_FIELD_NAMES.get(logical) {
            return Ok(field.to_string());
        }
        match FacetKind::from_name(logical) {
            Some(FacetKind::Feature) | Some(FacetKind::AttributeGroup) => Ok(logical.to_string()),
            _ => Err(FacetError::UnknownField(logical.to_string())),
        }
    }
}

/// Shop state for one request, passed explicitly to the base-query resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub id_customer_group: u32,
    pub id_country: u32,
    pub id_currency: u32,
    pub new_product_days: u32,
    pub now: NaiveDateTime,
}

impl RequestContext {
    /// Index field flagging a price reduction for this customer group,
    /// country and currency.
    pub fn reduction_field(&self) -> String {
        format!(
            "reduction_group_{}_country_{}_currency_{}",
            self.id_customer_group, self.id_country, self.id_currency
        )
    }

    /// Products added after this moment count as new.
    pub fn new_products_since(&self) -> Result<NaiveDateTime> {
        self.now
            .checked_sub_signed(Duration::days(i64::from(self.new_product_days)))
            .ok_or_else(|| {
                FacetError::Config(format!(
                    "newProductDays {} reaches before the earliest representable date",
                    self.new_product_days
                ))
            })
    }
}

pub trait ContextProvider {
    fn request_context(&self) -> Result<RequestContext>;
}

/// Fixed ids from the caller, day window from configuration, wall clock
/// read once per call.
#[derive(Debug, Clone)]
pub struct StaticContextProvider {
    pub id_customer_group: Option<u32>,
    pub id_country: Option<u32>,
    pub id_currency: Option<u32>,
    pub new_product_days: u32,
}

impl StaticContextProvider {
    pub fn new(config: &CompilerConfig) -> Self {
        StaticContextProvider {
            id_customer_group: None,
            id_country: None,
            id_currency: None,
            new_product_days: config.effective_new_product_days(),
        }
    }

    pub fn with_ids(mut self, customer_group: u32, country: u32, currency: u32) -> Self {
        self.id_customer_group = Some(customer_group);
        self.id_country = Some(country);
        self.id_currency = Some(currency);
        self
    }
}

impl ContextProvider for StaticContextProvider {
    fn request_context(&self) -> Result<RequestContext> {
        let missing = |what: &str| FacetError::Config(format!("no {} in request context", what));
        Ok(RequestContext {
            id_customer_group: self.id_customer_group.ok_or_else(|| missing("customer group"))?,
            id_country: self.id_country.ok_or_else(|| missing("country"))?,
            id_currency: self.id_currency.ok_or_else(|| missing("currency"))?,
            new_product_days: self.new_product_days,
            now: chrono::Local::now().naive_local(),
        })
    }
}

/// Builds relevance clauses for already-normalized search text.
pub trait TextQueryProvider {
    fn text_clauses(&self, text: &str) -> Result<Vec<QueryNode>>;
}

/// One `multi_match` over the search fields, plus a `prefix` on the last
/// word so partially typed queries still match.
#[derive(Debug, Clone)]
pub struct MultiMatchTextQuery {
    pub fields: Vec<String>,
    pub prefix_field: String,
}

impl MultiMatchTextQuery {
    pub fn from_config(config: &CompilerConfig) -> Self {
        MultiMatchTextQuery {
            fields: config.search_fields.clone(),
            prefix_field: "name".to_string(),
        }
    }
}

impl TextQueryProvider for MultiMatchTextQuery {
    fn text_clauses(&self, text: &str) -> Result<Vec<QueryNode>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mut clauses = vec![QueryNode::MultiMatch {
            query: text.to_string(),
            fields: self.fields.clone(),
        }];
        if let Some(last) = text.split_whitespace().last() {
            clauses.push(QueryNode::Prefix {
                field: self.prefix_field.clone(),
                value: last.to_lowercase(),
            });
        }
        Ok(clauses)
    }
}
