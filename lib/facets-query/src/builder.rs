use crate::ast::{Expression, Filter, Function, GroupPattern, Projection, Query};
use crate::escape::string_literal;
use crate::BuildError;
use sparql_facets_model::{
    BoundValue, FacetRequest, FacetSort, FieldDefinition, FieldSource, NamedNode, OrderCondition,
    SearchRequest, TriplePattern, Variable, ID_VARIABLE, QUERY_PLACEHOLDER,
};

/// The alias of the aggregated count in count and facet queries.
pub const COUNT_VARIABLE: &str = "__count__";

/// The variable that is bound to the entities.
pub fn id_variable() -> Variable {
    Variable::new_unchecked(ID_VARIABLE)
}

/// The alias of the aggregated count in count and facet queries.
pub fn count_variable() -> Variable {
    Variable::new_unchecked(COUNT_VARIABLE)
}

/// How the total number of matching entities is obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountPlan {
    /// The count is known without asking the store.
    Known(u64),
    /// The count is the `?__count__` binding of the single solution of the query.
    Query(Query),
}

/// Returns the patterns that connect `?id` with the variable of `field`.
///
/// Explicit patterns are used verbatim. Otherwise, the pattern `?id <predicate> ?variable` is
/// synthesized from the predicate of the field (which defaults to its name).
pub fn resolve_patterns(field: &FieldDefinition) -> Vec<TriplePattern> {
    match field.source() {
        FieldSource::Predicate(predicate) => {
            vec![TriplePattern::connecting(predicate, field.variable())]
        }
        FieldSource::Patterns(patterns) => patterns.clone(),
    }
}

/// Builds the query that counts all entities matching `request`.
pub fn build_count(request: &SearchRequest) -> CountPlan {
    if request.page.rows == 0 {
        return CountPlan::Known(0);
    }
    if request.id.is_some() {
        return CountPlan::Known(1);
    }
    CountPlan::Query(Query::select(
        request.prefixes.clone(),
        vec![count_projection()],
        where_clause(request),
    ))
}

/// Builds the query for the ids of the entities on the requested page.
pub fn build_id_page(request: &SearchRequest) -> Result<Query, BuildError> {
    if request.page.rows == 0 {
        return Err(BuildError::NoRowsRequested);
    }
    Ok(Query::select_distinct(
        request.prefixes.clone(),
        vec![Projection::Variable(id_variable())],
        where_clause(request),
    )
    .with_order_by(request.sort.clone())
    .with_limit(Some(request.page.rows))
    .with_offset((request.page.start > 0).then_some(request.page.start)))
}

/// Builds the query that constructs the fields of the entities in `ids`.
///
/// The template re-emits the patterns of the `WHERE` clause such that the resulting graph contains
/// all triples needed to frame the entities.
pub fn build_entity_construct(
    request: &SearchRequest,
    ids: &[NamedNode],
) -> Result<Query, BuildError> {
    let id_filter = match ids {
        [] => return Err(BuildError::NoIds),
        [id] => Expression::from(id_variable()).equal(id.clone().into()),
        ids => Expression::from(id_variable()).is_in(ids.iter().cloned().map(Expression::from)),
    };

    let mut pattern = where_clause(request);
    pattern.push_filter(Filter::Expression(id_filter));
    let template = construct_template(request);
    Ok(Query::construct(request.prefixes.clone(), template, pattern))
}

/// Builds the query that aggregates the values of `facet` over all entities matching `request`.
pub fn build_facet_aggregate(request: &SearchRequest, facet: &FacetRequest) -> Query {
    let variable = facet.variable().clone();
    let mut pattern = where_clause(request);
    pattern.extend_patterns(resolve_patterns(&facet.field));
    if facet.field.language_filter() {
        pattern.push_filter(language_filter(&variable, &request.language));
    }

    let order_by = match facet.sort {
        FacetSort::Count => OrderCondition::descending(count_variable()),
        FacetSort::Index => OrderCondition::ascending(variable.clone()),
    };
    Query::select(
        request.prefixes.clone(),
        vec![Projection::Variable(variable.clone()), count_projection()],
        pattern,
    )
    .with_group_by(vec![variable])
    .with_order_by(vec![order_by])
    .with_limit(facet.limit)
    .with_offset(facet.offset)
}

fn count_projection() -> Projection {
    Projection::CountDistinct {
        variable: id_variable(),
        alias: count_variable(),
    }
}

fn construct_template(request: &SearchRequest) -> Vec<TriplePattern> {
    let mut template = vec![TriplePattern::entity_type(&request.entity_class)];
    for pattern in request.fields.iter().flat_map(resolve_patterns) {
        if !template.contains(&pattern) {
            template.push(pattern);
        }
    }
    template
}

/// The `WHERE` clause shared by the count, id page, entity and facet queries.
fn where_clause(request: &SearchRequest) -> GroupPattern {
    let mut pattern = GroupPattern::default();
    pattern.push_pattern(TriplePattern::entity_type(&request.entity_class));

    let filtered_facets = request.bound_facets.iter().map(|b| &b.field).chain(
        request
            .facets
            .iter()
            .filter(|f| f.prefix.is_some())
            .map(|f| &f.field),
    );
    let fields = request.fields.iter().chain(filtered_facets).collect::<Vec<_>>();
    for field in &fields {
        pattern.extend_patterns(resolve_patterns(field));
    }

    for field in fields.iter().filter(|f| f.language_filter()) {
        pattern.push_filter(language_filter(field.variable(), &request.language));
    }

    if let Some(free_text) = &request.free_text {
        if !free_text.term.is_empty() {
            match &free_text.filters {
                Some(templates) => {
                    let term = string_literal(&free_text.term);
                    for template in templates {
                        pattern.push_filter(Filter::Raw(
                            template.replace(QUERY_PLACEHOLDER, &term),
                        ));
                    }
                }
                None => {
                    if let Some(filter) =
                        contains_filter(&free_text.variables, &free_text.term)
                    {
                        pattern.push_filter(filter);
                    }
                }
            }
        }
    }

    for bound in &request.bound_facets {
        let value = Expression::from(bound.variable().clone()).str();
        let expression = match &bound.value {
            BoundValue::Single(v) => value.equal(Expression::literal(v.as_str())),
            BoundValue::Multiple(values) => {
                value.is_in(values.iter().map(|v| Expression::literal(v.as_str())))
            }
        };
        pattern.push_filter(Filter::Expression(expression));
    }

    for facet in &request.facets {
        if let Some(prefix) = &facet.prefix {
            pattern.push_filter(Filter::Expression(Expression::call(
                Function::StrStarts,
                [
                    Expression::from(facet.variable().clone()).str(),
                    Expression::literal(prefix.as_str()),
                ],
            )));
        }
    }

    pattern
}

/// `FILTER(LANGMATCHES(LANG(?variable), "language"))`
fn language_filter(variable: &Variable, language: &str) -> Filter {
    Filter::Expression(Expression::call(
        Function::LangMatches,
        [
            Expression::call(Function::Lang, [Expression::from(variable.clone())]),
            Expression::literal(language),
        ],
    ))
}

/// `FILTER(CONTAINS(STR(?v), "term"))` or `FILTER(CONTAINS(STR(CONCAT(?a, ?b)), "term"))`
fn contains_filter(variables: &[Variable], term: &str) -> Option<Filter> {
    let haystack = match variables {
        [] => return None,
        [variable] => Expression::from(variable.clone()),
        variables => Expression::call(
            Function::Concat,
            variables.iter().cloned().map(Expression::from),
        ),
    };
    Some(Filter::Expression(Expression::call(
        Function::Contains,
        [haystack.str(), Expression::literal(term)],
    )))
}
