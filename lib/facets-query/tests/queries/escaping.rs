use crate::test_utils::{build, config};
use sparql_facets_query::{build_id_page, string_literal};
use spargebra::algebra::{Expression, Function, GraphPattern};

/// Collects the literal needles of all `CONTAINS` calls in the pattern.
fn contains_needles(pattern: &GraphPattern, needles: &mut Vec<String>) {
    match pattern {
        GraphPattern::Filter { expr, inner } => {
            expression_needles(expr, needles);
            contains_needles(inner, needles);
        }
        GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. }
        | GraphPattern::OrderBy { inner, .. }
        | GraphPattern::Group { inner, .. }
        | GraphPattern::Extend { inner, .. } => contains_needles(inner, needles),
        GraphPattern::Join { left, right } => {
            contains_needles(left, needles);
            contains_needles(right, needles);
        }
        _ => {}
    }
}

fn expression_needles(expression: &Expression, needles: &mut Vec<String>) {
    match expression {
        Expression::FunctionCall(Function::Contains, args) => {
            if let Some(Expression::Literal(needle)) = args.get(1) {
                needles.push(needle.value().to_owned());
            }
        }
        Expression::And(left, right) => {
            expression_needles(left, needles);
            expression_needles(right, needles);
        }
        _ => {}
    }
}

fn round_trip(term: &str) -> Vec<String> {
    let config = config();
    let request = build(&config, |b| b.query(term));
    let text = build_id_page(&request).unwrap().to_string();
    let query = spargebra::Query::parse(&text, None)
        .unwrap_or_else(|error| panic!("generated query is invalid: {error}\n{text}"));
    let spargebra::Query::Select { pattern, .. } = query else {
        panic!("expected a SELECT query");
    };
    let mut needles = Vec::new();
    contains_needles(&pattern, &mut needles);
    needles
}

#[test]
fn test_quotes_and_backslashes_round_trip() {
    for term in [
        r#"Roman "as""#,
        r"C:\coins\",
        r#"\" } FILTER(true) #"#,
        "line\nbreak\tand\rreturn",
        "\"\"\"",
    ] {
        assert_eq!(round_trip(term), vec![term.to_owned()], "term {term:?}");
    }
}

#[test]
fn test_injection_stays_inside_the_literal() {
    let term = r#"x")) } SELECT * WHERE { ?s ?p ?o "#;
    assert_eq!(round_trip(term), vec![term.to_owned()]);
}

#[test]
fn test_string_literal_matches_sparql_escapes() {
    assert_eq!(string_literal("a\\b\"c"), r#""a\\b\"c""#);
}
