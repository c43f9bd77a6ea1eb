//! Facet counts never narrow by their own selection, and the result query and
//! the aggregations always agree on the base constraint.

use crate::context::{DefaultFieldNames, FieldNameResolver};
use crate::query::clause::facet_clause;
use crate::query::dsl::{AggregationNode, QueryNode};
use crate::query::QueryCompiler;
use crate::types::{Controller, Criterion, FilterData, FilterStruct};
use crate::url_parser::parse_query_string;

const QUERY: &str = "manufacturer=5-6&price=10:50&weight=0:2-2:5&quantity=1&feature_7=21&attribute_group_3=9";

fn declared() -> Vec<FilterStruct> {
    let one = |name: &str, value: &str| FilterStruct::new(name, vec![Criterion::new(value, value)]);
    vec![
        one("manufacturer", "5"),
        one("price", "0:10"),
        one("weight", "0:2"),
        one("quantity", "1"),
        one("feature_7", "21"),
        one("attribute_group_3", "9"),
    ]
}

fn scope_clauses(node: &AggregationNode) -> Vec<QueryNode> {
    match node {
        AggregationNode::Filter { filter, .. } => filter
            .as_bool()
            .map(|b| b.must.clone())
            .unwrap_or_default(),
        other => panic!("expected filter aggregation, got {:?}", other),
    }
}

#[test]
fn test_every_facet_excludes_only_itself() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);

    for controller in [Controller::Category, Controller::Manufacturer, Controller::BestSales] {
        let data = FilterData::new(controller, 4)
            .with_filters(declared())
            .with_selected(parse_query_string(QUERY).selected);
        let aggs = compiler.build_aggregation_query(&data).unwrap();
        assert_eq!(aggs.len(), declared().len());

        for facet in declared() {
            let field = fields.field_name(&facet.input_name).unwrap();
            let scope = scope_clauses(aggs.get(&field).unwrap());

            for (name, values) in data.selected.iter() {
                let clause: QueryNode = facet_clause(&fields, name, values, None).unwrap().into();
                assert_eq!(
                    scope.contains(&clause),
                    name != facet.input_name,
                    "{:?}: facet {} vs selected {}",
                    controller,
                    facet.input_name,
                    name
                );
            }
        }
    }
}

#[test]
fn test_base_constraint_shared_with_result_query() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);

    for controller in [Controller::Category, Controller::Manufacturer, Controller::BestSales] {
        let data = FilterData::new(controller, 4)
            .with_filters(declared())
            .with_selected(parse_query_string(QUERY).selected);
        let compiled = compiler.compile(&data).unwrap();
        let base = compiled.count.query.as_bool().unwrap().must[1].clone();

        for agg in compiled.aggregations.iter() {
            let scope = scope_clauses(agg);
            assert_eq!(scope.last(), Some(&base), "{:?}: {}", controller, agg.name());
        }
    }
}

#[test]
fn test_compilation_is_deterministic() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let data = FilterData::new(Controller::Category, 4)
        .with_filters(declared())
        .with_selected(parse_query_string(QUERY).selected);

    let first = compiler.compile(&data).unwrap();
    let second = compiler.compile(&data).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.aggregations.to_json().to_string(),
        second.aggregations.to_json().to_string()
    );
}

#[test]
fn test_query_string_round_trip_compiles_identically() {
    let fields = DefaultFieldNames::new();
    let compiler = QueryCompiler::new(&fields);
    let parsed = parse_query_string(QUERY);
    let reparsed = parse_query_string(&parsed.selected.to_query_string());
    assert_eq!(parsed.selected, reparsed.selected);

    let a = FilterData::new(Controller::Category, 4).with_selected(parsed.selected);
    let b = FilterData::new(Controller::Category, 4).with_selected(reparsed.selected);
    assert_eq!(
        compiler.build_result_query(&a, false).unwrap(),
        compiler.build_result_query(&b, false).unwrap()
    );
}
