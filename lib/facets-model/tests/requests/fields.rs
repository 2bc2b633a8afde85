use crate::test_utils::config;
use sparql_facets_model::{FieldDefinition, FieldSource, SearchRequest, TriplePattern, View};

#[test]
fn show_fields_are_keyed_like_framed_documents() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .view(View::Show)
        .build()
        .unwrap();
    let keys = request
        .fields
        .iter()
        .map(FieldDefinition::document_key)
        .collect::<Vec<_>>();
    assert_eq!(keys, ["skos:prefLabel", "nm:authority", "dcterms:isPartOf"]);
}

#[test]
fn dots_inside_pattern_literals_do_not_split() {
    let config = config();
    let part_of = &config.show_fields[2];
    let FieldSource::Patterns(patterns) = part_of.source() else {
        panic!("expected patterns");
    };
    assert_eq!(
        patterns.iter().map(TriplePattern::as_str).collect::<Vec<_>>(),
        [
            "?id dcterms:isPartOf ?part",
            r#"?part skos:prefLabel "Greek coins. Silver .""#,
            "?part skos:prefLabel ?part_lab",
        ]
    );
    assert_eq!(part_of.value_predicate(), Some("skos:prefLabel"));
}
