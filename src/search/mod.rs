// Search queries over the recipe corpus

mod parser;

use crate::recipe::Recipe;
use serde::Serialize;
use std::fmt;

/// A parsed search query.
///
/// Top-level queries are always [`Query::All`]; an empty conjunction matches
/// every recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Query {
    Tag(String),
    Ingredient(String),
    /// Matches a tag, an ingredient or a word of the name, description or note
    Generic(String),
    All(Vec<Query>),
}

impl Query {
    pub fn parse(input: &str) -> Self {
        parser::parse(input)
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        match self {
            Query::Tag(tag) => recipe.has_tag(tag),
            Query::Ingredient(name) => recipe.has_ingredient(name),
            Query::Generic(term) => {
                recipe.has_tag(term) || recipe.has_ingredient(term) || recipe.has_word(term)
            }
            Query::All(clauses) => clauses.iter().all(|clause| clause.matches(recipe)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Query::All(clauses) if clauses.is_empty())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Tag(tag) => write!(f, "[Tag: {tag}]"),
            Query::Ingredient(name) => write!(f, "[Ingredient: {name}]"),
            Query::Generic(term) => write!(f, "[Generic: {term}]"),
            Query::All(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{clause}")?;
                }
                Ok(())
            }
        }
    }
}
