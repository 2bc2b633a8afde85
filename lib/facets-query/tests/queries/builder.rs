use crate::test_utils::{build, config};
use sparql_facets_model::{FacetSort, NamedNode, SearchRequest, View};
use sparql_facets_query::{
    build_count, build_entity_construct, build_facet_aggregate, build_id_page, CountPlan,
    Query, QueryKind,
};

fn parses(query: &Query) {
    let text = query.to_string();
    if let Err(error) = spargebra::Query::parse(&text, None) {
        panic!("generated query is invalid: {error}\n{text}");
    }
}

fn count_query(request: &SearchRequest) -> Query {
    match build_count(request) {
        CountPlan::Query(query) => query,
        CountPlan::Known(count) => panic!("expected a count query, got the known count {count}"),
    }
}

#[test]
fn test_count_query() {
    let config = config();
    let request = build(&config, |b| b);
    let query = count_query(&request);
    parses(&query);
    insta::assert_snapshot!(query, @r#"
    PREFIX dcterms: <http://purl.org/dc/terms/>
    PREFIX nmo: <http://nomisma.org/ontology#>
    PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

    SELECT (COUNT(DISTINCT ?id) AS ?__count__) WHERE {
      ?id a <http://nomisma.org/ontology#Denomination> .
      ?id skos:prefLabel ?lab .
      FILTER(LANGMATCHES(LANG(?lab), "en"))
    }
    "#);
}

#[test]
fn test_id_page_with_search_and_bound_facet() {
    let config = config();
    let request = build(&config, |b| {
        b.query("Roman \"as\"")
            .facet_filter("num_label", ["Roman"])
            .rows(20)
            .page(2)
            .sort("label")
    });
    let query = build_id_page(&request).unwrap();
    parses(&query);
    insta::assert_snapshot!(query, @r#"
    PREFIX dcterms: <http://purl.org/dc/terms/>
    PREFIX nmo: <http://nomisma.org/ontology#>
    PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

    SELECT DISTINCT ?id WHERE {
      ?id a <http://nomisma.org/ontology#Denomination> .
      ?id skos:prefLabel ?lab .
      ?id dcterms:isPartOf ?num .
      ?num skos:prefLabel ?num_lab .
      FILTER(LANGMATCHES(LANG(?lab), "en"))
      FILTER(LANGMATCHES(LANG(?num_lab), "en"))
      FILTER(CONTAINS(STR(?lab), "Roman \"as\""))
      FILTER(STR(?num_lab) = "Roman")
    }
    ORDER BY ?lab
    LIMIT 20
    OFFSET 20
    "#);
}

#[test]
fn test_id_page_without_offset() {
    let config = config();
    let request = build(&config, |b| b);
    let query = build_id_page(&request).unwrap();
    assert!(query.to_string().ends_with("}\nLIMIT 10"));
}

#[test]
fn test_multiple_bound_values() {
    let config = config();
    let request = build(&config, |b| b.facet_filter("num_label", ["Greek", "Roman"]));
    let query = count_query(&request);
    parses(&query);
    assert!(query
        .to_string()
        .contains(r#"  FILTER(STR(?num_lab) IN ("Greek", "Roman"))"#));
}

#[test]
fn test_search_over_multiple_variables() {
    let config = config();
    let request = build(&config, |b| {
        b.view(View::Show).query("as").search_field("all_fields")
    });
    let query = count_query(&request);
    parses(&query);
    assert!(query
        .to_string()
        .contains(r#"  FILTER(CONTAINS(STR(CONCAT(?lab, ?defn)), "as"))"#));
}

#[test]
fn test_search_with_filter_template() {
    let config = config();
    let request = build(&config, |b| b.query("De\\n").search_field("prefix"));
    let query = count_query(&request);
    parses(&query);
    assert!(query
        .to_string()
        .contains(r#"  FILTER(STRSTARTS(LCASE(STR(?lab)), LCASE("De\\n")))"#));
}

#[test]
fn test_empty_search_emits_no_filter() {
    let config = config();
    let mut request = build(&config, |b| b.query("as"));
    request.free_text.as_mut().unwrap().term.clear();
    assert!(!count_query(&request).to_string().contains("CONTAINS"));
}

#[test]
fn test_entity_construct_for_multiple_ids() {
    let config = config();
    let request = build(&config, |b| b);
    let ids = [
        NamedNode::new_unchecked("http://nomisma.org/id/as"),
        NamedNode::new_unchecked("http://nomisma.org/id/denarius"),
    ];
    let query = build_entity_construct(&request, &ids).unwrap();
    parses(&query);
    assert_eq!(query.kind(), QueryKind::Construct);
    insta::assert_snapshot!(query, @r#"
    PREFIX dcterms: <http://purl.org/dc/terms/>
    PREFIX nmo: <http://nomisma.org/ontology#>
    PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

    CONSTRUCT {
      ?id a <http://nomisma.org/ontology#Denomination> .
      ?id skos:prefLabel ?lab .
    } WHERE {
      ?id a <http://nomisma.org/ontology#Denomination> .
      ?id skos:prefLabel ?lab .
      FILTER(LANGMATCHES(LANG(?lab), "en"))
      FILTER(?id IN (<http://nomisma.org/id/as>, <http://nomisma.org/id/denarius>))
    }
    "#);
}

#[test]
fn test_entity_construct_for_single_id() {
    let config = config();
    let request = build(&config, |b| b.id("http://nomisma.org/id/as"));
    assert_eq!(build_count(&request), CountPlan::Known(1));
    let ids = [NamedNode::new_unchecked("http://nomisma.org/id/as")];
    let query = build_entity_construct(&request, &ids).unwrap();
    parses(&query);
    let text = query.to_string();
    assert!(text.contains("  ?id skos:definition ?defn .\n"));
    assert!(text.contains("  FILTER(?id = <http://nomisma.org/id/as>)\n"));
}

#[test]
fn test_facet_aggregate_by_count() {
    let config = config();
    let request = build(&config, |b| b);
    let facet = &request.facets[0];
    let query = build_facet_aggregate(&request, facet);
    parses(&query);
    insta::assert_snapshot!(query, @r#"
    PREFIX dcterms: <http://purl.org/dc/terms/>
    PREFIX nmo: <http://nomisma.org/ontology#>
    PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

    SELECT ?num_lab (COUNT(DISTINCT ?id) AS ?__count__) WHERE {
      ?id a <http://nomisma.org/ontology#Denomination> .
      ?id skos:prefLabel ?lab .
      ?id dcterms:isPartOf ?num .
      ?num skos:prefLabel ?num_lab .
      FILTER(LANGMATCHES(LANG(?lab), "en"))
      FILTER(LANGMATCHES(LANG(?num_lab), "en"))
    }
    GROUP BY ?num_lab
    ORDER BY DESC(?__count__)
    LIMIT 11
    "#);
}

#[test]
fn test_facet_page_by_index_with_prefix() {
    let config = config();
    let request = build(&config, |b| {
        b.facet_page("num_label", 2, Some(FacetSort::Index), Some("Ro".to_owned()))
    });
    assert_eq!(build_count(&request), CountPlan::Known(0));
    assert!(build_id_page(&request).is_err());

    let query = build_facet_aggregate(&request, &request.facets[0]);
    parses(&query);
    insta::assert_snapshot!(query, @r#"
    PREFIX dcterms: <http://purl.org/dc/terms/>
    PREFIX nmo: <http://nomisma.org/ontology#>
    PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

    SELECT ?num_lab (COUNT(DISTINCT ?id) AS ?__count__) WHERE {
      ?id a <http://nomisma.org/ontology#Denomination> .
      ?id skos:prefLabel ?lab .
      ?id dcterms:isPartOf ?num .
      ?num skos:prefLabel ?num_lab .
      FILTER(LANGMATCHES(LANG(?lab), "en"))
      FILTER(LANGMATCHES(LANG(?num_lab), "en"))
      FILTER(STRSTARTS(STR(?num_lab), "Ro"))
    }
    GROUP BY ?num_lab
    ORDER BY ?num_lab
    LIMIT 21
    OFFSET 20
    "#);
}

#[test]
fn test_facet_with_predicate() {
    let config = config();
    let request = build(&config, |b| b);
    let query = build_facet_aggregate(&request, &request.facets[1]);
    parses(&query);
    let text = query.to_string();
    assert!(text.contains("  ?id skos:broader ?broader .\n"));
    assert!(!text.contains("LIMIT"));
}

#[test]
fn test_queries_are_deterministic() {
    let config = config();
    let request = build(&config, |b| b.query("x").facet_filter("num_label", ["a", "b"]));
    assert_eq!(
        build_id_page(&request).unwrap().to_string(),
        build_id_page(&request).unwrap().to_string()
    );
}
