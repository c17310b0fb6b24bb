// First-generation YAML recipes (`.yml` / `.yaml`), converted on load
use crate::error::{LoadError, LoadResult};
use crate::recipe::metadata::{normalize_id, split_list, MetadataBuilder};
use crate::recipe::model::{Recipe, SectionDraft, Step};
use crate::recipe::quantity::{Ingredient, InstructionPart};
use serde::Deserialize;
use std::io::Read;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyIngredient {
    ingredient: String,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyStep {
    instructions: String,
    #[serde(default)]
    ingredients: Vec<LegacyIngredient>,
    #[serde(default)]
    internal_ingredients: Vec<String>,
    #[serde(default)]
    hidden_ingredients: Vec<String>,
    #[serde(default)]
    yields: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyRecipe {
    name: String,
    serves: u32,
    #[serde(default)]
    servings_unit: Option<String>,
    #[serde(default)]
    servings_increment: Option<f64>,
    #[serde(default)]
    descr: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    tags: Option<OneOrMany>,
    #[serde(default)]
    hide_from_all: bool,
    #[serde(default)]
    related: Vec<String>,
    #[serde(default)]
    prep: Vec<LegacyStep>,
    #[serde(default)]
    mis_en_place: Vec<LegacyStep>,
    #[serde(default)]
    cooking: Vec<LegacyStep>,
    #[serde(default)]
    passive_cooking: Vec<LegacyStep>,
    #[serde(default)]
    cooking2: Vec<LegacyStep>,
    #[serde(default)]
    passive_cooking2: Vec<LegacyStep>,
}

/// Parse a legacy YAML recipe from a reader
pub fn parse<R: Read>(reader: R, id: &str, lang: &str, filename: &str) -> LoadResult<Recipe> {
    debug!("Parsing legacy recipe document {}", filename);

    let legacy: LegacyRecipe = serde_yaml::from_reader(reader)
        .map_err(|e| LoadError::with_cause(format!("Invalid legacy recipe: {e}"), e))?;
    convert(legacy, id, lang, filename)
}

fn convert(legacy: LegacyRecipe, id: &str, lang: &str, filename: &str) -> LoadResult<Recipe> {
    if legacy.serves == 0 {
        return Err(LoadError::new("Serving count must be at least 1"));
    }
    let serves = legacy.serves;

    let mut meta = MetadataBuilder::new(id, lang, filename);
    meta.name(legacy.name)?.serves(serves)?;
    if let Some(unit) = legacy.servings_unit {
        meta.servings_unit(unit)?;
    }
    if let Some(increment) = legacy.servings_increment {
        meta.servings_increment(increment)?;
    }
    if let Some(descr) = legacy.descr {
        meta.description(descr.trim().to_string())?;
    }
    if let Some(note) = legacy.note {
        meta.note(note.trim().to_string())?;
    }
    if let Some(tags) = legacy.tags {
        let tags = match tags {
            OneOrMany::One(list) => split_list(&list),
            OneOrMany::Many(items) => items
                .iter()
                .map(|t| t.trim().trim_matches(',').to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        };
        meta.tags(tags)?;
    }
    if !legacy.related.is_empty() {
        meta.related(legacy.related.iter().map(|r| normalize_id(r)).collect())?;
    }
    if legacy.hide_from_all {
        meta.hide_from_all(true)?;
    }
    let metadata = meta.build()?;

    let lists = [
        ("Prep", legacy.prep),
        ("Mis-en-place", legacy.mis_en_place),
        ("Cooking", legacy.cooking),
        ("Passive cooking", legacy.passive_cooking),
        ("Cooking pt. 2", legacy.cooking2),
        ("Passive cooking pt. 2", legacy.passive_cooking2),
    ];

    let sections = lists
        .into_iter()
        .filter(|(_, steps)| !steps.is_empty())
        .map(|(heading, steps)| SectionDraft {
            heading: Some(heading.to_string()),
            steps: steps.into_iter().map(|s| convert_step(s, serves)).collect(),
        })
        .collect();

    Recipe::assemble(metadata, sections)
}

fn convert_step(legacy: LegacyStep, serves: u32) -> Step {
    let mut step = Step::new(serves);
    step.instructions = vec![InstructionPart::Text {
        value: legacy.instructions.trim().to_string(),
    }];
    step.ingredients = legacy
        .ingredients
        .into_iter()
        .map(|i| Ingredient::new(serves, i.ingredient, i.amount, i.unit))
        .collect();
    step.internal_ingredients = legacy.internal_ingredients;
    step.hidden_ingredients = legacy.hidden_ingredients;
    step.yields = match legacy.yields {
        None => Vec::new(),
        Some(OneOrMany::One(name)) => vec![name.trim().to_lowercase()],
        Some(OneOrMany::Many(names)) => names.iter().map(|n| n.trim().to_lowercase()).collect(),
    };
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::model::StepId;

    const PANCAKES: &str = r#"
name: Pancakes
serves: 4
servings_unit: pancakes
descr: Fluffy breakfast pancakes
tags: Breakfast, sweet
related: [Maple Syrup]
mis_en_place:
  - instructions: Whisk the dry ingredients
    ingredients:
      - ingredient: flour
        amount: 200
        unit: g
      - ingredient: salt
    yields: dry mix
cooking:
  - instructions: Fold in milk and eggs
    internal_ingredients: [dry mix]
    ingredients:
      - ingredient: milk
        amount: 300
        unit: ml
      - ingredient: flour
        amount: 50
        unit: g
  - instructions: Fry in a hot pan
"#;

    #[test]
    fn test_convert_legacy_recipe() {
        let recipe = parse(PANCAKES.as_bytes(), "Pancakes", "en", "Pancakes.en.yml").unwrap();

        assert_eq!(recipe.metadata.id, "pancakes");
        assert_eq!(recipe.metadata.servings_unit.as_deref(), Some("pancakes"));
        assert_eq!(recipe.metadata.tags, vec!["breakfast", "sweet"]);
        assert_eq!(recipe.metadata.related, vec!["maple-syrup"]);
        assert_eq!(
            recipe.metadata.description.as_deref(),
            Some("Fluffy breakfast pancakes")
        );

        let headings: Vec<_> = recipe
            .sections
            .iter()
            .map(|s| s.heading.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(headings, vec!["Mis-en-place", "Cooking"]);

        assert_eq!(recipe.edges(), vec![(StepId(0), StepId(1)), (StepId(1), StepId(2))]);

        let flour = recipe
            .total_ingredients
            .iter()
            .find(|i| i.name == "flour")
            .unwrap();
        assert_eq!(flour.amount, Some(250.0));
    }

    #[test]
    fn test_tag_list_form() {
        let yaml = "name: Tea\nserves: 1\ntags: [Hot, ' Drink,']\n";
        let recipe = parse(yaml.as_bytes(), "tea", "en", "tea.en.yml").unwrap();
        assert_eq!(recipe.metadata.tags, vec!["hot", "drink"]);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let yaml = "name: Tea\nserves: 1\nflavour: strong\n";
        let err = parse(yaml.as_bytes(), "tea", "en", "tea.en.yml").unwrap_err();
        assert!(err.message.contains("flavour"));
    }

    #[test]
    fn test_missing_serves() {
        let err = parse("name: Tea\n".as_bytes(), "tea", "en", "tea.en.yml").unwrap_err();
        assert!(err.message.contains("serves"));
    }

    #[test]
    fn test_unused_legacy_yield_fails() {
        let yaml = "name: Tea\nserves: 1\nprep:\n  - instructions: Boil water\n    yields: hot water\n";
        let err = parse(yaml.as_bytes(), "tea", "en", "tea.en.yml").unwrap_err();
        assert!(err.message.contains("never used"));
    }
}
