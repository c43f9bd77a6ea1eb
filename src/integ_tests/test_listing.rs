//! Listing scenarios: raw query string in, result query and facet
//! aggregations out.

use crate::config::CompilerConfig;
use crate::context::{
    ContextProvider, DefaultFieldNames, MultiMatchTextQuery, RequestContext, StaticContextProvider,
};
use crate::error::FacetError;
use crate::query::dsl::QueryNode;
use crate::query::QueryCompiler;
use crate::types::{Controller, Criterion, FilterData, FilterStruct, SortWay};
use crate::url_parser::parse_query_string;
use chrono::NaiveDate;
use serde_json::{json, Value};

// ============================================================
// Shared helpers
// ============================================================

fn declared_facets() -> Vec<FilterStruct> {
    vec![
        FilterStruct::new(
            "manufacturer",
            vec![Criterion::new("Acme", "5"), Criterion::new("Globex", "6")],
        ),
        FilterStruct::new(
            "price",
            vec![
                Criterion::new("0 - 10", "0:10"),
                Criterion::new("10 - 50", "10:50"),
            ],
        ),
        FilterStruct::new(
            "category",
            vec![Criterion::new("Shoes", "11"), Criterion::new("Hats", "12")],
        ),
    ]
}

fn listing(controller: Controller, id: i64, query: &str) -> FilterData {
    FilterData::new(controller, id)
        .with_filters(declared_facets())
        .with_selected(parse_query_string(query).selected)
}

fn context() -> RequestContext {
    RequestContext {
        id_customer_group: 1,
        id_country: 8,
        id_currency: 2,
        new_product_days: 20,
        now: NaiveDate::from_ymd_opt(2024, 3, 25)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap(),
    }
}

fn f64_at(v: &Value, pointer: &str) -> f64 {
    v.pointer(pointer)
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("no number at {}", pointer))
}

// ============================================================
// Category listing with manufacturer and price selected
// ============================================================

#[test]
fn test_category_listing_result_query() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "manufacturer=5&price=10:50");

    let json = compiler.build_result_query(&data, false).unwrap().to_json();
    let selection = &json["query"]["bool"]["must"][0]["bool"]["must"];

    assert_eq!(
        selection[0],
        json!({"bool": {"should": [{"term": {"id_manufacturer": "5"}}]}})
    );
    assert_eq!(
        f64_at(selection, "/1/bool/should/0/range/price/gte"),
        10.0
    );
    assert!((f64_at(selection, "/1/bool/should/0/range/price/lt") - 50.01).abs() < 1e-9);
    assert_eq!(
        json["query"]["bool"]["must"][1],
        json!({"bool": {"must": [{"bool": {"should": [{"term": {"categories": 3}}]}}]}})
    );
    assert_eq!(json["sort"], json!([{"_score": {"order": "desc"}}]));
    assert_eq!(json["from"], json!(0));
    assert_eq!(json["size"], json!(12));
}

#[test]
fn test_category_listing_price_aggregation_excludes_price() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "manufacturer=5&price=10:50");

    let json = compiler.build_aggregation_query(&data).unwrap().to_json();
    let price_scope = &json["aggregations"]["price"]["filter"]["bool"]["must"];
    assert_eq!(
        price_scope,
        &json!([
            {"bool": {"should": [{"term": {"id_manufacturer": "5"}}]}},
            {"bool": {"must": [{"bool": {"should": [{"term": {"categories": 3}}]}}]}}
        ])
    );

    let manufacturer_scope = json["aggregations"]["id_manufacturer"]["filter"].to_string();
    assert!(manufacturer_scope.contains("\"price\""));
    assert!(!manufacturer_scope.contains("id_manufacturer"));
    assert!(manufacturer_scope.contains("\"categories\":3"));
}

#[test]
fn test_aggregation_buckets_are_keyed() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "");

    let json = compiler.build_aggregation_query(&data).unwrap().to_json();
    let range = &json["aggregations"]["price"]["aggregations"]["price"]["range"];
    assert_eq!(range["field"], json!("price"));
    assert_eq!(range["keyed"], json!(true));
    assert_eq!(range["ranges"][0]["key"], json!("0:10"));
    assert_eq!(f64_at(range, "/ranges/0/to"), 10.0);
    assert!((f64_at(range, "/ranges/1/to") - 50.01).abs() < 1e-9);

    assert_eq!(
        json["aggregations"]["categories"]["aggregations"],
        json!({"categories": {"terms": {"field": "categories"}}})
    );
}

#[test]
fn test_no_selection_scopes_every_facet_by_base_only() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "page=2&orderby=price");
    let base = json!({"bool": {"must": [{"bool": {"should": [{"term": {"categories": 3}}]}}]}});

    let json = compiler.build_aggregation_query(&data).unwrap().to_json();
    for name in ["id_manufacturer", "price", "categories"] {
        assert_eq!(json["aggregations"][name]["filter"], base, "facet {}", name);
    }
}

// ============================================================
// Category selection replaces the listing category
// ============================================================

#[test]
fn test_selected_category_drops_base_in_result_but_not_in_own_facet() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "category=11-12&manufacturer=6");

    let result = compiler.build_result_query(&data, true).unwrap().to_json();
    assert!(!result.to_string().contains("\"categories\":3"));
    assert!(result.to_string().contains("\"categories\":11"));

    let aggs = compiler.build_aggregation_query(&data).unwrap().to_json();
    let category_scope = aggs["aggregations"]["categories"]["filter"].to_string();
    assert!(category_scope.contains("\"categories\":3"));
    assert!(!category_scope.contains("\"categories\":11"));

    let manufacturer_scope = aggs["aggregations"]["id_manufacturer"]["filter"].to_string();
    assert!(!manufacturer_scope.contains("\"categories\":3"));
    assert!(manufacturer_scope.contains("\"categories\":12"));
}

// ============================================================
// Other listing types
// ============================================================

#[test]
fn test_prices_drop_listing() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields).with_context(context());
    let data = listing(Controller::PricesDrop, 0, "");

    let json = compiler.build_result_query(&data, true).unwrap().to_json();
    assert_eq!(
        json["query"],
        json!({"bool": {"must": [{"bool": {"must_not": [
            {"term": {"reduction_group_1_country_8_currency_2": 0}}
        ]}}]}})
    );
}

#[test]
fn test_new_products_listing_uses_context_clock() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields).with_context(context());
    let data = listing(Controller::NewProducts, 0, "manufacturer=5");

    let compiled = compiler.compile(&data).unwrap();
    let expected = json!({"range": {"date_add": {"gt": "2024-03-05 09:05:07"}}});
    assert_eq!(
        compiled.count.to_json()["query"]["bool"]["must"][1]["bool"]["must"][0],
        expected
    );
    let scope = compiled.aggregations.to_json()["aggregations"]["price"]["filter"].to_string();
    assert!(scope.contains("2024-03-05 09:05:07"));
}

#[test]
fn test_new_products_window_beyond_calendar_is_config_error() {
    let config = CompilerConfig::from_json(r#"{"newProductDays": 4294967295}"#).unwrap();
    let fields = DefaultFieldNames::from_config(&config);
    let context = StaticContextProvider::new(&config)
        .with_ids(1, 8, 2)
        .request_context()
        .unwrap();
    let compiler = QueryCompiler::new(&fields)
        .with_config(&config)
        .with_context(context);
    let data = listing(Controller::NewProducts, 0, "");

    assert!(matches!(
        compiler.build_result_query(&data, false),
        Err(FacetError::Config(_))
    ));
    assert!(matches!(
        compiler.build_aggregation_query(&data),
        Err(FacetError::Config(_))
    ));
}

#[test]
fn test_context_listing_without_context_fails() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::PricesDrop, 0, "");
    assert!(matches!(
        compiler.compile(&data),
        Err(FacetError::Config(_))
    ));
}

#[test]
fn test_best_sales_threshold_from_config() {
    let fields = DefaultFieldNames::new();
    let config = CompilerConfig {
        best_sales_min_sold: 40,
        ..CompilerConfig::default()
    };
    let compiler = QueryCompiler::new(&fields).with_config(&config);
    let data = listing(Controller::BestSales, 0, "");
    let json = compiler.build_result_query(&data, true).unwrap().to_json();
    assert_eq!(
        json["query"]["bool"]["must"][0],
        json!({"bool": {"must": [{"range": {"number_sold": {"gt": 40}}}]}})
    );
}

#[test]
fn test_unknown_controller_behaves_like_category() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let as_default = listing(Controller::from_name("cms"), 3, "price=0:10");
    let as_category = listing(Controller::Category, 3, "price=0:10");

    let a = compiler.compile(&as_default).unwrap();
    let b = compiler.compile(&as_category).unwrap();
    assert_eq!(a.result, b.result);
    assert_eq!(a.aggregations, b.aggregations);
}

// ============================================================
// Text search
// ============================================================

#[test]
fn test_text_search_listing() {
    let fields = DefaultFieldNames::new();
    let text = MultiMatchTextQuery::from_config(&CompilerConfig::default());
    let compiler = QueryCompiler::new(&fields).with_text_provider(&text);
    let data = listing(Controller::from_name("module-brad-search"), 0, "price=0:10")
        .with_search_query("Caf%C3%A9+Cr%C3%A8me");

    let compiled = compiler.compile(&data).unwrap();
    let root = compiled.result.query.as_bool().unwrap();
    assert!(matches!(
        &root.should[0],
        QueryNode::MultiMatch { query, .. } if query == "Cafe Creme"
    ));
    assert!(matches!(
        &root.should[1],
        QueryNode::Prefix { field, value } if field == "name" && value == "creme"
    ));
    assert_eq!(root.minimum_should_match, Some(1));

    let aggs = compiled.aggregations.to_json();
    let price_scope = &aggs["aggregations"]["price"]["filter"]["bool"];
    assert!(price_scope.get("filter").is_none());
    assert_eq!(price_scope["minimum_should_match"], json!(1));
    let manufacturer_scope = &aggs["aggregations"]["id_manufacturer"]["filter"]["bool"];
    assert_eq!(manufacturer_scope["filter"].as_array().unwrap().len(), 1);
}

// ============================================================
// Malformed input
// ============================================================

#[test]
fn test_malformed_values_only_drop_themselves() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "price=cheap-0:10&category=shoes-11");

    let json = compiler.build_result_query(&data, true).unwrap().to_json();
    let selection = &json["query"]["bool"]["must"][0]["bool"]["must"];
    assert_eq!(selection[0]["bool"]["should"].as_array().unwrap().len(), 1);
    assert_eq!(
        selection[1],
        json!({"bool": {"should": [{"term": {"categories": 11}}]}})
    );
}

#[test]
fn test_empty_selection_value_is_ignored() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let with_empty = listing(Controller::Category, 3, "manufacturer=");
    let without = listing(Controller::Category, 3, "");

    let a = compiler.compile(&with_empty).unwrap();
    let b = compiler.compile(&without).unwrap();
    assert_eq!(a.result, b.result);
    assert_eq!(a.aggregations, b.aggregations);
}

#[test]
fn test_ordering_and_paging_only_touch_result_query() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = listing(Controller::Category, 3, "manufacturer=5")
        .with_order("manufacturer", SortWay::Asc)
        .with_page(3, 10);

    let compiled = compiler.compile(&data).unwrap();
    let result = compiled.result.to_json();
    assert_eq!(result["sort"], json!([{"id_manufacturer": {"order": "asc"}}]));
    assert_eq!(result["from"], json!(20));
    assert_eq!(result["size"], json!(10));
    assert_eq!(compiled.count.query, compiled.result.query);
    assert!(!compiled.count.is_paginated());
}
