use crate::field::parse_variable;
use crate::ConfigError;
use oxrdf::Variable;
use serde::Deserialize;
use std::fmt;

/// A single `ORDER BY` condition on a variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderCondition {
    variable: Variable,
    descending: bool,
}

impl OrderCondition {
    pub fn ascending(variable: Variable) -> Self {
        Self {
            variable,
            descending: false,
        }
    }

    pub fn descending(variable: Variable) -> Self {
        Self {
            variable,
            descending: true,
        }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Parses a clause such as `?label asc, ?date desc`. An empty clause yields no conditions.
    pub fn parse_clause(clause: &str) -> Result<Vec<Self>, ConfigError> {
        clause
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut tokens = part.split_whitespace();
                let variable = tokens
                    .next()
                    .filter(|v| v.starts_with(['?', '$']))
                    .ok_or_else(|| ConfigError::InvalidSort(clause.to_owned()))?;
                let variable = parse_variable(variable, clause)
                    .map_err(|_| ConfigError::InvalidSort(clause.to_owned()))?;
                let descending = match tokens.next().map(str::to_ascii_lowercase).as_deref() {
                    None | Some("asc") => false,
                    Some("desc") => true,
                    Some(_) => return Err(ConfigError::InvalidSort(clause.to_owned())),
                };
                if tokens.next().is_some() {
                    return Err(ConfigError::InvalidSort(clause.to_owned()));
                }
                Ok(Self {
                    variable,
                    descending,
                })
            })
            .collect()
    }
}

impl fmt::Display for OrderCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "DESC({})", self.variable)
        } else {
            write!(f, "{}", self.variable)
        }
    }
}

/// A named sort option that users can choose from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortField {
    name: String,
    label: String,
    conditions: Vec<OrderCondition>,
}

impl SortField {
    pub fn new(name: impl Into<String>, conditions: Vec<OrderCondition>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            conditions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The conditions of this sort option. Empty if the store's order should be used.
    pub fn conditions(&self) -> &[OrderCondition] {
        &self.conditions
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawSortField {
    name: String,
    label: Option<String>,
    clause: String,
}

impl RawSortField {
    pub fn validate(self) -> Result<SortField, ConfigError> {
        let mut field = SortField::new(self.name, OrderCondition::parse_clause(&self.clause)?);
        if let Some(label) = self.label {
            field.label = label;
        }
        Ok(field)
    }
}
