//! Faceted-search query compiler.
//!
//! Turns the filters a shopper picked (parsed from the listing URL) into two
//! things for the search engine: the boolean query that fetches the result
//! page, and one filter aggregation per declared facet that counts what each
//! option would return. Facet counts are self-excluding: a facet's own
//! selection never narrows its own counts.
//!
//! ```no_run
//! use facetq::{url_parser, Controller, DefaultFieldNames, FilterData, QueryCompiler};
//!
//! let parsed = url_parser::parse_query_string("manufacturer=5&price=10:50");
//! let data = FilterData::new(Controller::Category, 3).with_selected(parsed.selected);
//! let fields = DefaultFieldNames::new();
//! let compiled = QueryCompiler::new(&fields).compile(&data).unwrap();
//! println!("{}", compiled.result.to_json());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod query;
pub mod text;
pub mod types;
pub mod url_parser;

#[cfg(test)]
mod integ_tests;

pub use config::CompilerConfig;
pub use context::{
    ContextProvider, DefaultFieldNames, FieldNameResolver, MultiMatchTextQuery, RequestContext,
    StaticContextProvider, TextQueryProvider,
};
pub use error::{FacetError, Result};
pub use query::dsl::{
    AggregationNode, Aggregations, BoolQuery, QueryNode, RangeBucket, RangeQuery, SearchBody,
};
pub use query::{CompiledRequest, QueryCompiler};
pub use types::{
    Controller, Criterion, FacetKind, FieldValue, FilterData, FilterStruct, SelectedFilters,
    SelectedValue, SortWay,
};
pub use url_parser::ParsedFilters;
