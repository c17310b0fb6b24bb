use crate::format::{format_num, round_up};
use crate::recipe::{Ingredient, InstructionPart, Recipe, Step, StepId};
use serde::{Deserialize, Serialize};

/// `?lang=` on any endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LangParams {
    #[serde(default)]
    pub lang: Option<String>,
}

/// Search request parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Recipe card for listings and search results
#[derive(Debug, Clone, Serialize)]
pub struct RecipeCard {
    pub id: String,
    pub lang: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeListResponse {
    pub lang: String,
    pub total: usize,
    pub recipes: Vec<RecipeCard>,
    pub popular_tags: Vec<TagCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub lang: String,
    /// Normalized form of the parsed query
    pub query: String,
    pub total: usize,
    pub results: Vec<RecipeCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

impl From<(String, usize)> for TagCount {
    fn from((tag, count): (String, usize)) -> Self {
        Self { tag, count }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub lang: String,
    pub tags: Vec<TagCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub lang: String,
    pub recipes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguagesResponse {
    pub current: String,
    pub default: String,
    pub languages: Vec<LanguageInfo>,
}

/// Full recipe details
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: String,
    pub lang: String,
    pub name: String,
    pub serves: u32,
    pub servings_unit: Option<String>,
    pub servings_increment: f64,
    pub description: Option<String>,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub attribution: Option<String>,
    pub image_url: Option<String>,
    /// Other languages this recipe is available in
    pub translations: Vec<String>,
    pub related: Vec<RelatedRecipe>,
    pub ingredients: Vec<IngredientDetail>,
    pub sections: Vec<SectionDetail>,
    pub roots: Vec<StepId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedRecipe {
    pub id: String,
    pub name: String,
}

/// Ingredient with quantity
#[derive(Debug, Clone, Serialize)]
pub struct IngredientDetail {
    pub name: String,
    pub amount: Option<f64>,
    /// Amount rendered as a kitchen fraction, e.g. `1 ½`
    pub amount_display: Option<String>,
    pub unit: Option<String>,
    pub amount_per_serving: Option<f64>,
    /// Whole items to buy for unit-less ingredients, e.g. 1.5 onions -> 2
    pub count: Option<i64>,
}

impl From<&Ingredient> for IngredientDetail {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            amount: ingredient.amount,
            amount_display: ingredient.amount.map(format_num),
            unit: ingredient.unit.clone(),
            amount_per_serving: ingredient.amount_per_serving,
            count: match ingredient.unit {
                Some(_) => None,
                None => ingredient.amount.map(round_up),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDetail {
    pub heading: Option<String>,
    pub steps: Vec<StepDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepDetail {
    pub id: StepId,
    pub instructions: Vec<InstructionPart>,
    pub ingredients: Vec<IngredientDetail>,
    pub references: Vec<String>,
    pub yields: Vec<String>,
    pub upstream: Vec<StepId>,
    pub downstream: Vec<StepId>,
}

impl StepDetail {
    pub fn new(id: StepId, step: &Step) -> Self {
        Self {
            id,
            instructions: step.instructions.clone(),
            ingredients: step.ingredients.iter().map(IngredientDetail::from).collect(),
            // Hidden references are graph-only and not shown
            references: step.internal_ingredients.clone(),
            yields: step.yields.clone(),
            upstream: step.upstream.clone(),
            downstream: step.downstream.clone(),
        }
    }
}

impl SectionDetail {
    pub fn from_recipe(recipe: &Recipe) -> Vec<Self> {
        recipe
            .sections
            .iter()
            .map(|section| Self {
                heading: section.heading.clone(),
                steps: recipe
                    .section_steps(section)
                    .iter()
                    .zip(section.steps.clone())
                    .map(|(step, index)| StepDetail::new(StepId(index), step))
                    .collect(),
            })
            .collect()
    }
}

/// System statistics
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_recipes: usize,
    pub total_translations: usize,
    pub total_languages: usize,
    pub total_tags: usize,
    pub loaded_at: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub recipes: usize,
    pub loaded_at: String,
}
