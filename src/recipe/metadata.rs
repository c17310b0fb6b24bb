// Recipe header block: `name`, `serves`, `tags`, ...
use crate::error::{LoadError, LoadResult};
use crate::recipe::lexer::split_words;
use serde::Serialize;
use std::fmt::Debug;

pub const SCHEMA_VERSION: u32 = 2;

/// Lowercase, trim and hyphenate a recipe identifier
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeMetadata {
    pub id: String,
    pub lang: String,
    pub filename: String,
    pub name: String,
    pub serves: u32,
    pub servings_unit: Option<String>,
    pub servings_increment: f64,
    pub description: Option<String>,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub related: Vec<String>,
    pub attribution: Option<String>,
    pub hide_from_all: bool,
    pub schema_version: u32,
}

/// Collects header fields, each of which may be assigned only once.
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    id: Option<String>,
    lang: Option<String>,
    filename: Option<String>,
    name: Option<String>,
    serves: Option<u32>,
    servings_unit: Option<String>,
    servings_increment: Option<f64>,
    description: Option<String>,
    note: Option<String>,
    tags: Option<Vec<String>>,
    related: Option<Vec<String>>,
    attribution: Option<String>,
    hide_from_all: Option<bool>,
    schema_version: Option<u32>,
}

fn set_once<T: Debug>(slot: &mut Option<T>, field: &str, value: T) -> LoadResult<()> {
    if let Some(old) = slot {
        return Err(LoadError::new(format!(
            "Recipe meta attribute {field} already set\n  old: {old:?}\n  new: {value:?}"
        )));
    }
    *slot = Some(value);
    Ok(())
}

macro_rules! setter {
    ($fn_name:ident, $field:ident, $ty:ty) => {
        pub fn $fn_name(&mut self, value: $ty) -> LoadResult<&mut Self> {
            set_once(&mut self.$field, stringify!($field), value)?;
            Ok(self)
        }
    };
}

impl MetadataBuilder {
    pub fn new(id: &str, lang: &str, filename: &str) -> Self {
        Self {
            id: Some(normalize_id(id)),
            lang: Some(lang.to_string()),
            filename: Some(filename.to_string()),
            ..Self::default()
        }
    }

    setter!(name, name, String);
    setter!(serves, serves, u32);
    setter!(servings_unit, servings_unit, String);
    setter!(servings_increment, servings_increment, f64);
    setter!(description, description, String);
    setter!(note, note, String);
    setter!(tags, tags, Vec<String>);
    setter!(related, related, Vec<String>);
    setter!(attribution, attribution, String);
    setter!(hide_from_all, hide_from_all, bool);
    setter!(schema_version, schema_version, u32);

    /// Parse the value of a `serves <count> [<unit>] [<increment>]` line
    pub fn serves_line(&mut self, value: &str) -> LoadResult<&mut Self> {
        let parts = split_words(value)?;
        let count = parts
            .first()
            .ok_or_else(|| LoadError::new("`serves` needs a serving count"))?;
        let count: u32 = count.parse().map_err(|e| {
            LoadError::with_cause(format!("Serving count '{count}' is not a whole number"), e)
        })?;
        if count == 0 {
            return Err(LoadError::new("Serving count must be at least 1"));
        }
        self.serves(count)?;

        if let Some(unit) = parts.get(1) {
            self.servings_unit(unit.clone())?;
        }
        if let Some(increment) = parts.get(2) {
            let increment = if increment.contains('.') {
                increment.parse::<f64>().map_err(|e| {
                    LoadError::with_cause(format!("Serving increment '{increment}' is not a number"), e)
                })?
            } else {
                let whole = increment.parse::<u32>().map_err(|e| {
                    LoadError::with_cause(
                        format!("Serving increment '{increment}' is not a whole number"),
                        e,
                    )
                })?;
                f64::from(whole)
            };
            self.servings_increment(increment)?;
        }
        if parts.len() > 3 {
            return Err(LoadError::new(format!(
                "Too many fields in `serves` line: {parts:?}"
            )));
        }
        Ok(self)
    }

    /// Check mandatory fields and the schema version
    pub fn build(self) -> LoadResult<RecipeMetadata> {
        let name_hint = self.name.clone().unwrap_or_default();
        let id = self
            .id
            .ok_or_else(|| LoadError::new(format!("Recipe {name_hint}: id is required")))?;
        let lang = self
            .lang
            .ok_or_else(|| LoadError::new(format!("Recipe {id}: language is required")))?;
        let filename = self.filename.ok_or_else(|| {
            LoadError::new(format!("Recipe {id}.{lang}: filename is required"))
        })?;
        let name = self
            .name
            .ok_or_else(|| LoadError::new(format!("Recipe {id}.{lang}: name is required")))?;
        let serves = self.serves.ok_or_else(|| {
            LoadError::new(format!(
                "Recipe {id}.{lang}: serving size (`serves`) is required"
            ))
        })?;
        let schema_version = self.schema_version.unwrap_or(SCHEMA_VERSION);
        if schema_version != SCHEMA_VERSION {
            return Err(LoadError::new(format!(
                "Recipe {id}.{lang}: schema version (`version`) expected to be {SCHEMA_VERSION}, is {schema_version}"
            )));
        }

        Ok(RecipeMetadata {
            id,
            lang,
            filename,
            name,
            serves,
            servings_unit: self.servings_unit,
            servings_increment: self.servings_increment.unwrap_or(1.0),
            description: self.description,
            note: self.note,
            tags: self.tags.unwrap_or_default(),
            related: self.related.unwrap_or_default(),
            attribution: self.attribution,
            hide_from_all: self.hide_from_all.unwrap_or(false),
            schema_version,
        })
    }
}

/// Split a comma list, trimming and lowercasing entries and dropping empty ones
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}
