use sparql_facets_model::SearchConfig;

const CONFIG: &str = r#"{
    "entity_class": "nmo:Denomination",
    "prefixes": {
        "dcterms": "http://purl.org/dc/terms/",
        "nmo": "http://nomisma.org/ontology#",
        "skos": "http://www.w3.org/2004/02/skos/core#"
    },
    "frame": {
        "@context": {"nm": "http://nomisma.org/id/"},
        "@type": "nmo:Denomination"
    },
    "index_fields": [
        {"name": "skos:prefLabel", "variable": "?lab", "filter_language": true}
    ],
    "show_fields": [
        {"name": "label", "variable": "?lab", "predicate": "<http://www.w3.org/2004/02/skos/core#prefLabel>"},
        {"name": "authority", "variable": "?auth", "predicate": "http://nomisma.org/id/authority"},
        {
            "name": "part_of",
            "variable": "?part_lab",
            "patterns": "?id dcterms:isPartOf ?part . ?part skos:prefLabel \"Greek coins. Silver .\" . ?part skos:prefLabel ?part_lab",
            "key": "dcterms:isPartOf"
        }
    ],
    "facets": [
        {"name": "topic", "variable": "?topic", "predicate": "dcterms:subject", "limit": 5}
    ],
    "search_fields": [
        {"name": "label", "variable": "?lab", "default": true}
    ],
    "sort_fields": [
        {"name": "label", "clause": "?lab asc"}
    ],
    "max_rows": 50,
    "facet_page_limit": 7
}"#;

pub fn config() -> SearchConfig {
    SearchConfig::from_json_str(CONFIG).unwrap()
}
