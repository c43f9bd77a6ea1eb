use crate::error::{FacetError, Result};
use crate::url_parser::{encode_key, encode_value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Upper-bound adjustment applied to numeric ranges so the displayed maximum
/// is matched even though the engine treats `lt` as exclusive.
pub const RANGE_UPPER_EPSILON: f64 = 0.01;

/// A scalar carried by a term or range bound in the compiled query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Integer(i) => serde_json::json!(i),
            FieldValue::Float(f) => serde_json::json!(f),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// The kind of a filterable facet, derived from its input name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    Category,
    Manufacturer,
    Quantity,
    Price,
    Weight,
    Feature,
    AttributeGroup,
}

impl FacetKind {
    pub const FEATURE_PREFIX: &'static str = "feature_";
    pub const ATTRIBUTE_GROUP_PREFIX: &'static str = "attribute_group_";

    /// Returns `None` for names outside the accepted filter set.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "category" => Some(FacetKind::Category),
            "manufacturer" => Some(FacetKind::Manufacturer),
            "quantity" => Some(FacetKind::Quantity),
            "price" => Some(FacetKind::Price),
            "weight" => Some(FacetKind::Weight),
            _ if name.starts_with(Self::FEATURE_PREFIX) => Some(FacetKind::Feature),
            _ if name.starts_with(Self::ATTRIBUTE_GROUP_PREFIX) => Some(FacetKind::AttributeGroup),
            _ => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, FacetKind::Price | FacetKind::Weight)
    }
}

/// Closed `[min, max]` range decoded from a `"min:max"` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    /// Decode a `"min:max"` encoding as stored on declared criteria.
    pub fn parse(facet: &str, encoded: &str) -> Result<Self> {
        let (min, max) = encoded
            .split_once(':')
            .ok_or_else(|| FacetError::invalid_range(facet, encoded, "missing ':' separator"))?;
        Self::from_parts(facet, min, max)
    }

    pub fn from_parts(facet: &str, min: &str, max: &str) -> Result<Self> {
        let raw = || format!("{}:{}", min, max);
        let min = parse_bound(min)
            .ok_or_else(|| FacetError::invalid_range(facet, raw(), "min is not a number"))?;
        let max = parse_bound(max)
            .ok_or_else(|| FacetError::invalid_range(facet, raw(), "max is not a number"))?;
        Ok(NumericRange { min, max })
    }

    /// Exclusive upper bound matching `max` inclusively.
    pub fn inclusive_upper(&self) -> f64 {
        self.max + RANGE_UPPER_EPSILON
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One selected value for a facet: a scalar for terms facets, a raw
/// `min:max` pair for range facets. Numeric coercion happens when compiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SelectedValue {
    Range { min_value: String, max_value: String },
    Scalar(String),
}

impl SelectedValue {
    pub fn range(min: impl Into<String>, max: impl Into<String>) -> Self {
        SelectedValue::Range {
            min_value: min.into(),
            max_value: max.into(),
        }
    }

    pub fn scalar(value: impl Into<String>) -> Self {
        SelectedValue::Scalar(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SelectedValue::Scalar(s) => s.is_empty(),
            SelectedValue::Range {
                min_value,
                max_value,
            } => min_value.is_empty() && max_value.is_empty(),
        }
    }

    /// Numeric bounds of a selected range. `Ok(None)` marks an empty entry,
    /// which contributes nothing.
    pub fn numeric_range(&self, facet: &str) -> Result<Option<NumericRange>> {
        if self.is_empty() {
            return Ok(None);
        }
        match self {
            SelectedValue::Range {
                min_value,
                max_value,
            } => NumericRange::from_parts(facet, min_value, max_value).map(Some),
            SelectedValue::Scalar(s) => Err(FacetError::invalid_range(
                facet,
                s.as_str(),
                "missing ':' separator",
            )),
        }
    }

    /// Encoding used in URLs: the scalar itself or `min:max`.
    pub fn to_param(&self) -> String {
        match self {
            SelectedValue::Scalar(s) => s.clone(),
            SelectedValue::Range {
                min_value,
                max_value,
            } => format!("{}:{}", min_value, max_value),
        }
    }
}

/// Selected filters keyed by facet name, in the order they were encountered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SelectedFilters(IndexMap<String, Vec<SelectedValue>>);

impl SelectedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `name` is present, even with no values.
    pub fn touch(&mut self, name: &str) {
        self.0.entry(name.to_string()).or_default();
    }

    pub fn push(&mut self, name: &str, value: SelectedValue) {
        self.0.entry(name.to_string()).or_default().push(value);
    }

    pub fn with(mut self, name: &str, values: Vec<SelectedValue>) -> Self {
        self.0.entry(name.to_string()).or_default().extend(values);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[SelectedValue]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SelectedValue])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Entries that actually constrain something, optionally leaving one
    /// facet out.
    pub fn active_except<'a>(
        &'a self,
        excluded: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a str, &'a [SelectedValue])> + 'a {
        self.iter()
            .filter(move |(name, values)| !values.is_empty() && Some(*name) != excluded)
    }

    /// True when at least one facet has a non-empty selection.
    pub fn has_selection(&self) -> bool {
        self.active_except(None).next().is_some()
    }

    /// True when `category` is explicitly selected, ignoring `excluded`.
    pub fn selects_categories(&self, excluded: Option<&str>) -> bool {
        self.active_except(excluded)
            .any(|(name, _)| name == "category")
    }

    /// Rebuild a form-encoded query string that parses back to this
    /// selection.
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(name, values)| {
                let joined = values
                    .iter()
                    .map(|v| encode_value(&v.to_param()))
                    .collect::<Vec<_>>()
                    .join("-");
                format!("{}={}", encode_key(name), joined)
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// One selectable option of a declared facet. For range facets `value`
/// carries the `"min:max"` bucket encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Criterion {
    pub name: String,
    pub value: String,
}

impl Criterion {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Criterion {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A facet declared for the current listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterStruct {
    pub input_name: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

impl FilterStruct {
    pub fn new(input_name: impl Into<String>, criteria: Vec<Criterion>) -> Self {
        FilterStruct {
            input_name: input_name.into(),
            criteria,
        }
    }

    pub fn kind(&self) -> Option<FacetKind> {
        FacetKind::from_name(&self.input_name)
    }
}

/// Listing type that owns the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Controller {
    Manufacturer,
    Category,
    PricesDrop,
    BestSales,
    NewProducts,
    TextSearch,
    /// Any other listing; constrained like a category page.
    Default,
}

impl Controller {
    pub fn from_name(name: &str) -> Self {
        match name {
            "manufacturer" => Controller::Manufacturer,
            "category" => Controller::Category,
            "prices-drop" => Controller::PricesDrop,
            "best-sales" => Controller::BestSales,
            "new-products" => Controller::NewProducts,
            "module-brad-search" => Controller::TextSearch,
            _ => Controller::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Controller::Manufacturer => "manufacturer",
            Controller::Category => "category",
            Controller::PricesDrop => "prices-drop",
            Controller::BestSales => "best-sales",
            Controller::NewProducts => "new-products",
            Controller::TextSearch => "module-brad-search",
            Controller::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortWay {
    #[default]
    Asc,
    Desc,
}

impl SortWay {
    /// Case-insensitive; anything but `desc` sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortWay::Desc
        } else {
            SortWay::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortWay::Asc => "asc",
            SortWay::Desc => "desc",
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Everything one request needs to compile its queries.
#[derive(Debug, Clone)]
pub struct FilterData {
    pub controller: Controller,
    /// Category or manufacturer id, 0 when the listing has none.
    pub id_entity: i64,
    pub filters: Vec<FilterStruct>,
    pub selected: SelectedFilters,
    pub order_by: String,
    pub order_way: SortWay,
    pub from: usize,
    pub size: usize,
    /// Raw free-text input for the text-search listing.
    pub search_query: Option<String>,
}

impl FilterData {
    pub fn new(controller: Controller, id_entity: i64) -> Self {
        FilterData {
            controller,
            id_entity,
            filters: Vec::new(),
            selected: SelectedFilters::new(),
            order_by: "_score".to_string(),
            order_way: SortWay::Desc,
            from: 0,
            size: DEFAULT_PAGE_SIZE,
            search_query: None,
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterStruct>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_selected(mut self, selected: SelectedFilters) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_order(mut self, order_by: impl Into<String>, order_way: SortWay) -> Self {
        self.order_by = order_by.into();
        self.order_way = order_way;
        self
    }

    /// 1-based page number; page 0 is treated as the first page.
    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.from = page.saturating_sub(1).saturating_mul(per_page);
        self.size = per_page;
        self
    }

    pub fn with_search_query(mut self, raw: impl Into<String>) -> Self {
        self.search_query = Some(raw.into());
        self
    }
}
