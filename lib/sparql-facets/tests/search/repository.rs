use crate::test_utils::{build, config, denominations, skewed_topics, RecordingTransport};
use sparql_facets::{FacetItem, Repository, SearchError, TransportConfig, TransportError};
use sparql_facets_model::{ConfigError, FacetSort, SearchRequest};
use std::time::Duration;

fn items(values: &[(&str, u64)]) -> Vec<FacetItem> {
    values
        .iter()
        .map(|(value, hits)| FacetItem::new(*value, *hits))
        .collect()
}

#[tokio::test]
async fn search_english_denominations() {
    let config = config();
    let repository = Repository::new(denominations());
    let response = repository
        .search(&build(&config, |b| b))
        .await
        .unwrap();

    assert_eq!(response.total(), 3);
    insta::assert_json_snapshot!(response.documents(), @r#"
    [
      {
        "@id": "http://example.com/as",
        "@type": "nmo:Denomination",
        "skos:prefLabel": "As"
      },
      {
        "@id": "http://example.com/drachm",
        "@type": "nmo:Denomination",
        "skos:prefLabel": "Drachm"
      },
      {
        "@id": "http://example.com/obol",
        "@type": "nmo:Denomination",
        "skos:prefLabel": "Obol"
      }
    ]
    "#);

    let topic = response.facet("topic").unwrap();
    assert_eq!(topic.items(), items(&[("Greek", 2), ("Roman", 1)]));
    assert_eq!(topic.sort(), FacetSort::Count);
    assert!(!topic.has_more());

    let label = response.facet("label").unwrap();
    assert_eq!(
        label.items(),
        items(&[("As", 1), ("Drachm", 1), ("Obol", 1)])
    );
}

#[tokio::test]
async fn documents_follow_the_requested_sort() {
    let config = config();
    let repository = Repository::new(denominations());
    let response = repository
        .search(&build(&config, |b| b.sort("label_desc")))
        .await
        .unwrap();

    let ids = response
        .documents()
        .iter()
        .filter_map(|d| d.id())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        [
            "http://example.com/obol",
            "http://example.com/drachm",
            "http://example.com/as"
        ]
    );
}

#[tokio::test]
async fn free_text_restricts_total_and_facets() {
    let config = config();
    let repository = Repository::new(denominations());
    let response = repository
        .search(&build(&config, |b| b.query("ol")))
        .await
        .unwrap();

    assert_eq!(response.total(), 1);
    assert_eq!(response.documents().len(), 1);
    assert_eq!(response.documents()[0].id(), Some("http://example.com/obol"));
    assert_eq!(
        response.facet("topic").unwrap().items(),
        items(&[("Greek", 1)])
    );
}

#[tokio::test]
async fn free_text_with_quotes_matches_nothing() {
    let config = config();
    let repository = Repository::new(denominations());
    let response = repository
        .search(&build(&config, |b| b.query(r#"Obol" } ?x ?y ?z {"#)))
        .await
        .unwrap();

    assert_eq!(response.total(), 0);
    assert!(response.documents().is_empty());
}

#[tokio::test]
async fn bound_facets_restrict_the_results() {
    let config = config();
    let repository = Repository::new(denominations());

    let roman = repository
        .search(&build(&config, |b| b.facet_filter("topic", ["Roman"])))
        .await
        .unwrap();
    assert_eq!(roman.total(), 1);
    assert_eq!(roman.documents()[0].id(), Some("http://example.com/as"));
    assert_eq!(
        roman.facet("topic").unwrap().items(),
        items(&[("Roman", 1)])
    );

    let both = repository
        .search(&build(&config, |b| {
            b.facet_filter("topic", ["Roman"])
                .facet_filter("topic", ["Greek"])
        }))
        .await
        .unwrap();
    assert_eq!(both.total(), 3);
}

#[tokio::test]
async fn facets_sorted_by_count() {
    let config = config();
    let repository = Repository::new(skewed_topics());
    let response = repository
        .search(&build(&config, |b| b.rows(0)))
        .await
        .unwrap();

    let topic = response.facet("topic").unwrap().items();
    assert_eq!(topic.len(), 3);
    assert_eq!(topic[0].hits, 9);
    assert_eq!(topic[1].hits, 9);
    assert_eq!(topic[2], FacetItem::new("A", 5));
}

#[tokio::test]
async fn zero_rows_only_aggregates_facets() {
    let config = config();
    let transport = RecordingTransport::new(denominations());
    let repository = Repository::new(transport.clone());
    let response = repository
        .search(&build(&config, |b| b.rows(0)))
        .await
        .unwrap();

    assert_eq!(response.total(), 0);
    assert!(response.documents().is_empty());
    assert_eq!(response.facets().len(), 2);

    let queries = transport.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().all(|q| q.contains("GROUP BY")));
}

#[tokio::test]
async fn page_beyond_total_keeps_total() {
    let config = config();
    let transport = RecordingTransport::new(denominations());
    let repository = Repository::new(transport.clone());
    let response = repository
        .search(&build(&config, |b| b.start(10)))
        .await
        .unwrap();

    assert_eq!(response.total(), 3);
    assert!(response.documents().is_empty());
    assert!(!transport.queries().iter().any(|q| q.contains("CONSTRUCT")));
}

#[tokio::test]
async fn huge_page_keeps_total() {
    let config = config();
    let transport = RecordingTransport::new(denominations());
    let repository = Repository::new(transport.clone());
    let response = repository
        .search(&build(&config, |b| b.page(u64::MAX)))
        .await
        .unwrap();

    assert_eq!(response.total(), 3);
    assert_eq!(response.start(), u64::MAX);
    assert!(response.documents().is_empty());
    assert!(!transport.queries().iter().any(|q| q.contains("CONSTRUCT")));
}

#[tokio::test]
async fn second_page() {
    let config = config();
    let repository = Repository::new(denominations());
    let response = repository
        .search(&build(&config, |b| b.rows(2).page(2)))
        .await
        .unwrap();

    assert_eq!(response.total(), 3);
    assert_eq!(response.start(), 2);
    assert_eq!(response.current_page(), 2);
    assert_eq!(response.total_pages(), 2);
    assert_eq!(response.documents().len(), 1);
    assert_eq!(response.documents()[0].id(), Some("http://example.com/obol"));
}

#[tokio::test]
async fn repeated_searches_are_identical() {
    let config = config();
    let repository = Repository::new(denominations());
    let request = build(&config, |b| b.query("o"));

    let first = repository.search(&request).await.unwrap();
    let second = repository.search(&request).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn find_uses_show_fields() {
    let config = config();
    let repository = Repository::new(denominations());
    let document = repository
        .find(&config, "http://example.com/drachm", None)
        .await
        .unwrap();

    insta::assert_json_snapshot!(document, @r#"
    {
      "@id": "http://example.com/drachm",
      "@type": "nmo:Denomination",
      "skos:prefLabel": "Drachm",
      "skos:definition": "A Greek silver coin."
    }
    "#);
}

#[tokio::test]
async fn find_renders_show_fields() {
    let config = config();
    let repository = Repository::new(denominations());
    let document = repository
        .find(&config, "http://example.com/drachm", Some("fr"))
        .await
        .unwrap();

    assert_eq!(
        document.render(&config.show_fields[1]).as_deref(),
        Some("Une monnaie grecque en argent.")
    );
    insta::assert_json_snapshot!(document.render_fields(&config.show_fields), @r#"
    {
      "skos:prefLabel": "Drachme",
      "Definition": "Une monnaie grecque en argent."
    }
    "#);
}

#[tokio::test]
async fn find_in_other_language() {
    let config = config();
    let repository = Repository::new(denominations());
    let document = repository
        .find(&config, "http://example.com/drachm", Some("fr"))
        .await
        .unwrap();

    assert_eq!(
        document.get("skos:prefLabel").and_then(|v| v.as_str()),
        Some("Drachme")
    );
}

#[tokio::test]
async fn find_missing_record() {
    let config = config();
    let repository = Repository::new(denominations());
    let error = repository
        .find(&config, "http://example.com/missing", None)
        .await
        .unwrap_err();

    assert!(matches!(&error, SearchError::NotFound(id) if id == "http://example.com/missing"));
    assert!(error.is_not_found());
    assert_eq!(error.user_message(), "record not found");
}

#[tokio::test]
async fn find_invalid_iri() {
    let config = config();
    let repository = Repository::new(denominations());
    let error = repository
        .find(&config, "not an iri", None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        SearchError::Config(ConfigError::InvalidIri { .. })
    ));
}

#[tokio::test]
async fn facet_pages() {
    let config = config();
    let repository = Repository::new(denominations());

    let first = repository
        .facet_page(
            SearchRequest::builder(&config),
            "topic",
            1,
            Some(FacetSort::Index),
            None,
        )
        .await
        .unwrap();
    assert_eq!(first.items(), items(&[("Greek", 2)]));
    assert_eq!(first.limit(), Some(1));
    assert_eq!(first.offset(), Some(0));
    assert!(first.has_more());

    let second = repository
        .facet_page(
            SearchRequest::builder(&config),
            "topic",
            2,
            Some(FacetSort::Index),
            None,
        )
        .await
        .unwrap();
    assert_eq!(second.items(), items(&[("Roman", 1)]));
    assert_eq!(second.offset(), Some(1));
    assert!(!second.has_more());
}

#[tokio::test]
async fn facet_page_with_prefix() {
    let config = config();
    let repository = Repository::new(denominations());
    let aggregation = repository
        .facet_page(
            SearchRequest::builder(&config),
            "label",
            1,
            None,
            Some("Dr".to_owned()),
        )
        .await
        .unwrap();

    assert_eq!(aggregation.items(), items(&[("Drachm", 1)]));
    assert_eq!(aggregation.sort(), FacetSort::Index);
    assert_eq!(aggregation.prefix(), Some("Dr"));
}

#[tokio::test]
async fn facets_keep_request_order() {
    let config = config();
    let transport =
        RecordingTransport::new(denominations()).delaying("?topic", Duration::from_millis(50));
    let repository = Repository::new(transport).with_config(TransportConfig {
        max_concurrent_facets: 4,
        ..TransportConfig::default()
    });
    let response = repository
        .search(&build(&config, |b| b.rows(0)))
        .await
        .unwrap();

    let names = response
        .facets()
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>();
    assert_eq!(names, ["topic", "label"]);
}

#[tokio::test]
async fn failing_facet_fails_the_search() {
    let config = config();
    let transport = RecordingTransport::new(denominations()).failing("?facet_lab");
    let repository = Repository::new(transport);
    let error = repository
        .search(&build(&config, |b| b))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        SearchError::Transport(TransportError::Server(_))
    ));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn slow_queries_time_out() {
    let config = config();
    let transport =
        RecordingTransport::new(denominations()).delaying("COUNT", Duration::from_secs(5));
    let repository = Repository::new(transport).with_config(TransportConfig {
        timeout: Duration::from_millis(20),
        ..TransportConfig::default()
    });
    let error = repository
        .search(&build(&config, |b| b))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        SearchError::Transport(TransportError::Connection(_))
    ));
    assert!(error.is_retryable());
    assert_eq!(error.user_message(), "search unavailable");
}
