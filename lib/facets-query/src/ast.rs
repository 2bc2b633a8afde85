//! A small SPARQL query AST that covers exactly the query shapes issued by the search.
//!
//! Queries are assembled from clauses and rendered to text once via [`Display`](fmt::Display).

use crate::escape::write_string_literal;
use sparql_facets_model::{NamedNode, OrderCondition, Prefixes, TriplePattern, Variable};
use std::fmt;

/// The shape of the result of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// The query returns solutions (variable bindings).
    Select,
    /// The query returns a graph.
    Construct,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Select => f.write_str("SELECT"),
            QueryKind::Construct => f.write_str("CONSTRUCT"),
        }
    }
}

/// An element of a `SELECT` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Projection {
    Variable(Variable),
    /// `(COUNT(DISTINCT ?variable) AS ?alias)`
    CountDistinct { variable: Variable, alias: Variable },
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Variable(variable) => write!(f, "{variable}"),
            Projection::CountDistinct { variable, alias } => {
                write!(f, "(COUNT(DISTINCT {variable}) AS {alias})")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryForm {
    Select {
        distinct: bool,
        projection: Vec<Projection>,
    },
    Construct {
        template: Vec<TriplePattern>,
    },
}

/// Built-in functions used in filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    Str,
    Lang,
    LangMatches,
    Concat,
    Contains,
    StrStarts,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Function::Str => "STR",
            Function::Lang => "LANG",
            Function::LangMatches => "LANGMATCHES",
            Function::Concat => "CONCAT",
            Function::Contains => "CONTAINS",
            Function::StrStarts => "STRSTARTS",
        })
    }
}

/// A filter expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    Variable(Variable),
    /// A simple literal. It is escaped when rendered.
    Literal(String),
    NamedNode(NamedNode),
    Call(Function, Vec<Expression>),
    Equal(Box<Expression>, Box<Expression>),
    In(Box<Expression>, Vec<Expression>),
}

impl Expression {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn call(function: Function, args: impl IntoIterator<Item = Expression>) -> Self {
        Self::Call(function, args.into_iter().collect())
    }

    /// `STR(self)`
    #[must_use]
    pub fn str(self) -> Self {
        Self::call(Function::Str, [self])
    }

    #[must_use]
    pub fn equal(self, other: Expression) -> Self {
        Self::Equal(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn is_in(self, values: impl IntoIterator<Item = Expression>) -> Self {
        Self::In(Box::new(self), values.into_iter().collect())
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<NamedNode> for Expression {
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Variable(variable) => write!(f, "{variable}"),
            Expression::Literal(value) => write_string_literal(f, value),
            Expression::NamedNode(node) => write!(f, "{node}"),
            Expression::Call(function, args) => {
                write!(f, "{function}(")?;
                write_separated(f, args)?;
                f.write_str(")")
            }
            Expression::Equal(left, right) => write!(f, "{left} = {right}"),
            Expression::In(expression, values) => {
                write!(f, "{expression} IN (")?;
                write_separated(f, values)?;
                f.write_str(")")
            }
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[impl fmt::Display]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// A `FILTER` in a group pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Expression(Expression),
    /// A complete, pre-rendered filter clause, e.g., a configured search filter.
    Raw(String),
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Expression(expression) => write!(f, "FILTER({expression})"),
            Filter::Raw(filter) => f.write_str(filter),
        }
    }
}

/// A basic graph pattern followed by filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupPattern {
    patterns: Vec<TriplePattern>,
    filters: Vec<Filter>,
}

impl GroupPattern {
    /// Adds `pattern` unless an identical pattern is already present.
    pub fn push_pattern(&mut self, pattern: TriplePattern) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    pub fn extend_patterns(&mut self, patterns: impl IntoIterator<Item = TriplePattern>) {
        for pattern in patterns {
            self.push_pattern(pattern);
        }
    }

    /// Adds `filter` unless an identical filter is already present.
    pub fn push_filter(&mut self, filter: Filter) {
        if !self.filters.contains(&filter) {
            self.filters.push(filter);
        }
    }

    pub fn patterns(&self) -> &[TriplePattern] {
        &self.patterns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl fmt::Display for GroupPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{\n")?;
        for pattern in &self.patterns {
            writeln!(f, "  {pattern} .")?;
        }
        for filter in &self.filters {
            writeln!(f, "  {filter}")?;
        }
        f.write_str("}")
    }
}

/// A complete SPARQL query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    prefixes: Prefixes,
    form: QueryForm,
    pattern: GroupPattern,
    group_by: Vec<Variable>,
    order_by: Vec<OrderCondition>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    fn new(prefixes: Prefixes, form: QueryForm, pattern: GroupPattern) -> Self {
        Self {
            prefixes,
            form,
            pattern,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn select(prefixes: Prefixes, projection: Vec<Projection>, pattern: GroupPattern) -> Self {
        Self::new(
            prefixes,
            QueryForm::Select {
                distinct: false,
                projection,
            },
            pattern,
        )
    }

    pub fn select_distinct(
        prefixes: Prefixes,
        projection: Vec<Projection>,
        pattern: GroupPattern,
    ) -> Self {
        Self::new(
            prefixes,
            QueryForm::Select {
                distinct: true,
                projection,
            },
            pattern,
        )
    }

    pub fn construct(
        prefixes: Prefixes,
        template: Vec<TriplePattern>,
        pattern: GroupPattern,
    ) -> Self {
        Self::new(prefixes, QueryForm::Construct { template }, pattern)
    }

    #[must_use]
    pub fn with_group_by(mut self, variables: Vec<Variable>) -> Self {
        self.group_by = variables;
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, conditions: Vec<OrderCondition>) -> Self {
        self.order_by = conditions;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn kind(&self) -> QueryKind {
        match self.form {
            QueryForm::Select { .. } => QueryKind::Select,
            QueryForm::Construct { .. } => QueryKind::Construct,
        }
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    pub fn pattern(&self) -> &GroupPattern {
        &self.pattern
    }

    pub fn order_by(&self) -> &[OrderCondition] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, namespace) in self.prefixes.iter() {
            writeln!(f, "PREFIX {prefix}: <{namespace}>")?;
        }
        if !self.prefixes.is_empty() {
            writeln!(f)?;
        }

        match &self.form {
            QueryForm::Select {
                distinct,
                projection,
            } => {
                f.write_str("SELECT ")?;
                if *distinct {
                    f.write_str("DISTINCT ")?;
                }
                for (i, element) in projection.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(" ")?;
            }
            QueryForm::Construct { template } => {
                f.write_str("CONSTRUCT {\n")?;
                for pattern in template {
                    writeln!(f, "  {pattern} .")?;
                }
                f.write_str("} ")?;
            }
        }
        write!(f, "WHERE {}", self.pattern)?;

        if !self.group_by.is_empty() {
            f.write_str("\nGROUP BY")?;
            for variable in &self.group_by {
                write!(f, " {variable}")?;
            }
        }
        if !self.order_by.is_empty() {
            f.write_str("\nORDER BY")?;
            for condition in &self.order_by {
                write!(f, " {condition}")?;
            }
        }
        if let Some(limit) = self.limit {
            write!(f, "\nLIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, "\nOFFSET {offset}")?;
        }
        Ok(())
    }
}
