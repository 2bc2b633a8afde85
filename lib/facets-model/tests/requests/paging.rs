use crate::test_utils::config;
use sparql_facets_model::{FacetSort, Page, SearchRequest};

#[test]
fn rows_are_clamped_and_pages_translated() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .rows(500)
        .page(3)
        .build()
        .unwrap();
    assert_eq!(request.page, Page::new(50, 100));
}

#[test]
fn huge_page_yields_saturated_start() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .page(u64::MAX)
        .build()
        .unwrap();
    assert_eq!(request.page, Page::new(10, u64::MAX));
    assert_eq!(request.facets[0].offset, None);
}

#[test]
fn huge_rows_and_page_yield_saturated_start() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .rows(u64::MAX)
        .page(u64::MAX / 2)
        .build()
        .unwrap();
    assert_eq!(request.page, Page::new(50, u64::MAX));
}

#[test]
fn explicit_start_wins_over_page() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .start(u64::MAX)
        .page(2)
        .build()
        .unwrap();
    assert_eq!(request.page, Page::new(10, u64::MAX));
}

#[test]
fn facet_page_uses_configured_page_limit() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .facet_page("topic", 3, Some(FacetSort::Index), None)
        .build()
        .unwrap();
    assert!(request.is_facet_only());
    assert_eq!(request.facets.len(), 1);
    let facet = &request.facets[0];
    assert_eq!(facet.sort, FacetSort::Index);
    assert_eq!(facet.limit, Some(8));
    assert_eq!(facet.offset, Some(14));
    assert_eq!(facet.page_size, Some(7));
}

#[test]
fn huge_facet_page_saturates_offset() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .facet_page("topic", u64::MAX, None, Some(String::new()))
        .build()
        .unwrap();
    let facet = &request.facets[0];
    assert_eq!(facet.offset, Some(u64::MAX));
    assert_eq!(facet.limit, Some(8));
    assert_eq!(facet.prefix, None);
}

#[test]
fn facet_page_zero_starts_at_the_beginning() {
    let config = config();
    let request = SearchRequest::builder(&config)
        .facet_page("topic", 0, None, None)
        .build()
        .unwrap();
    assert_eq!(request.facets[0].offset, Some(0));
}
