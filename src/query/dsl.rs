//! Typed query and aggregation trees with their engine JSON form.
//!
//! Trees are plain values: builders return new nodes and nothing is
//! mutated after a tree is handed out, so two compilations of the same
//! input compare equal with `==`.

use crate::types::{FieldValue, SortWay};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Bool(BoolQuery),
    Term { field: String, value: FieldValue },
    Range(RangeQuery),
    MultiMatch { query: String, fields: Vec<String> },
    Prefix { field: String, value: String },
    /// Clause produced by an external collaborator, passed through as-is.
    Raw(Value),
}

impl QueryNode {
    pub fn term(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        QueryNode::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn as_bool(&self) -> Option<&BoolQuery> {
        match self {
            QueryNode::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            QueryNode::Bool(b) => b.to_json(),
            QueryNode::Term { field, value } => json!({ "term": { field: value.to_json() } }),
            QueryNode::Range(r) => r.to_json(),
            QueryNode::MultiMatch { query, fields } => json!({
                "multi_match": { "query": query, "fields": fields }
            }),
            QueryNode::Prefix { field, value } => json!({ "prefix": { field: value } }),
            QueryNode::Raw(v) => v.clone(),
        }
    }
}

impl From<BoolQuery> for QueryNode {
    fn from(b: BoolQuery) -> Self {
        QueryNode::Bool(b)
    }
}

impl From<RangeQuery> for QueryNode {
    fn from(r: RangeQuery) -> Self {
        QueryNode::Range(r)
    }
}

/// Boolean combination. An empty bool places no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
    pub filter: Vec<QueryNode>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, q: impl Into<QueryNode>) -> Self {
        self.must.push(q.into());
        self
    }

    pub fn should(mut self, q: impl Into<QueryNode>) -> Self {
        self.should.push(q.into());
        self
    }

    pub fn must_not(mut self, q: impl Into<QueryNode>) -> Self {
        self.must_not.push(q.into());
        self
    }

    pub fn filter(mut self, q: impl Into<QueryNode>) -> Self {
        self.filter.push(q.into());
        self
    }

    pub fn minimum_should_match(mut self, n: u32) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len() + self.filter.len()
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (occur, clauses) in [
            ("must", &self.must),
            ("must_not", &self.must_not),
            ("should", &self.should),
            ("filter", &self.filter),
        ] {
            if !clauses.is_empty() {
                body.insert(
                    occur.to_string(),
                    Value::Array(clauses.iter().map(QueryNode::to_json).collect()),
                );
            }
        }
        if let Some(n) = self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(n));
        }
        json!({ "bool": Value::Object(body) })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<FieldValue>,
    pub gte: Option<FieldValue>,
    pub lt: Option<FieldValue>,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        RangeQuery {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
        }
    }

    pub fn gt(mut self, v: impl Into<FieldValue>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn gte(mut self, v: impl Into<FieldValue>) -> Self {
        self.gte = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<FieldValue>) -> Self {
        self.lt = Some(v.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let mut bounds = Map::new();
        for (op, bound) in [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
        ] {
            if let Some(v) = bound {
                bounds.insert(op.to_string(), v.to_json());
            }
        }
        json!({ "range": { self.field.clone(): Value::Object(bounds) } })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub field: String,
    pub way: SortWay,
}

impl SortClause {
    pub fn to_json(&self) -> Value {
        json!({ self.field.clone(): { "order": self.way.as_str() } })
    }
}

/// Search request body: the query plus optional sort and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBody {
    pub query: QueryNode,
    pub sort: Vec<SortClause>,
    pub from: Option<usize>,
    pub size: Option<usize>,
}

impl SearchBody {
    pub fn new(query: impl Into<QueryNode>) -> Self {
        SearchBody {
            query: query.into(),
            sort: Vec::new(),
            from: None,
            size: None,
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.from.is_some() || self.size.is_some() || !self.sort.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.to_json());
        if !self.sort.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sort.iter().map(SortClause::to_json).collect()),
            );
        }
        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBucket {
    pub key: String,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationNode {
    Filter {
        name: String,
        filter: QueryNode,
        aggregations: Vec<AggregationNode>,
    },
    Terms {
        name: String,
        field: String,
    },
    Range {
        name: String,
        field: String,
        ranges: Vec<RangeBucket>,
    },
}

impl AggregationNode {
    pub fn name(&self) -> &str {
        match self {
            AggregationNode::Filter { name, .. }
            | AggregationNode::Terms { name, .. }
            | AggregationNode::Range { name, .. } => name,
        }
    }

    /// Body of this aggregation without its name.
    pub fn to_json(&self) -> Value {
        match self {
            AggregationNode::Filter {
                filter,
                aggregations,
                ..
            } => {
                let mut body = Map::new();
                body.insert("filter".to_string(), filter.to_json());
                if !aggregations.is_empty() {
                    body.insert("aggregations".to_string(), named(aggregations));
                }
                Value::Object(body)
            }
            AggregationNode::Terms { field, .. } => json!({ "terms": { "field": field } }),
            AggregationNode::Range { field, ranges, .. } => {
                let ranges: Vec<Value> = ranges
                    .iter()
                    .map(|b| json!({ "key": b.key, "from": b.from, "to": b.to }))
                    .collect();
                json!({ "range": { "field": field, "ranges": ranges, "keyed": true } })
            }
        }
    }
}

fn named(aggs: &[AggregationNode]) -> Value {
    let mut map = Map::new();
    for agg in aggs {
        map.insert(agg.name().to_string(), agg.to_json());
    }
    Value::Object(map)
}

/// Top-level aggregation set, one filter aggregation per declared facet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregations(pub Vec<AggregationNode>);

impl Aggregations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&AggregationNode> {
        self.0.iter().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregationNode> {
        self.0.iter()
    }

    pub fn to_json(&self) -> Value {
        if self.0.is_empty() {
            return json!({});
        }
        json!({ "aggregations": named(&self.0) })
    }
}
