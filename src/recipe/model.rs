use crate::error::LoadResult;
use crate::recipe::graph;
use crate::recipe::metadata::RecipeMetadata;
use crate::recipe::quantity::{Ingredient, IngredientTotals, InstructionPart};
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;

/// Index of a step in its recipe's step arena (document order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StepId(pub usize);

#[derive(Debug, Clone, Default, Serialize)]
pub struct Step {
    pub serves: u32,
    pub instructions: Vec<InstructionPart>,
    pub ingredients: Vec<Ingredient>,
    pub internal_ingredients: Vec<String>,
    pub hidden_ingredients: Vec<String>,
    pub yields: Vec<String>,
    pub no_dependency: bool,
    /// Index of the owning section
    pub section: usize,
    /// Zero-based position inside the owning section
    pub ordinal: usize,
    pub upstream: Vec<StepId>,
    pub downstream: Vec<StepId>,
}

impl Step {
    pub fn new(serves: u32) -> Self {
        Self {
            serves,
            ..Self::default()
        }
    }

    /// Every yield this step consumes, visible or hidden
    pub fn references(&self) -> impl Iterator<Item = &String> {
        self.internal_ingredients
            .iter()
            .chain(self.hidden_ingredients.iter())
    }

    /// Human readable position used in error notes
    pub fn location(&self) -> String {
        format!(
            "in step #{} of section #{}",
            self.ordinal + 1,
            self.section + 1
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub heading: Option<String>,
    /// The section's slice of the recipe step arena
    pub steps: Range<usize>,
}

/// Steps grouped by section, before the recipe is assembled
#[derive(Debug, Default)]
pub struct SectionDraft {
    pub heading: Option<String>,
    pub steps: Vec<Step>,
}

impl SectionDraft {
    pub fn is_blank(&self) -> bool {
        self.heading.is_none() && self.steps.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub metadata: RecipeMetadata,
    pub sections: Vec<Section>,
    pub steps: Vec<Step>,
    pub total_ingredients: IngredientTotals,
    pub roots: Vec<StepId>,
    #[serde(skip)]
    word_bag: HashSet<String>,
    #[serde(skip)]
    tag_bag: HashSet<String>,
    #[serde(skip)]
    ingredient_bag: HashSet<String>,
}

impl Recipe {
    /// Flatten sections into the step arena, merge ingredients and link the
    /// dependency graph.
    pub fn assemble(metadata: RecipeMetadata, drafts: Vec<SectionDraft>) -> LoadResult<Self> {
        let mut sections = Vec::with_capacity(drafts.len());
        let mut steps = Vec::new();

        for (section_index, draft) in drafts.into_iter().enumerate() {
            let start = steps.len();
            for (ordinal, mut step) in draft.steps.into_iter().enumerate() {
                step.section = section_index;
                step.ordinal = ordinal;
                steps.push(step);
            }
            sections.push(Section {
                heading: draft.heading,
                steps: start..steps.len(),
            });
        }

        let mut total_ingredients = IngredientTotals::new();
        for ingredient in steps.iter().flat_map(|s| s.ingredients.iter()) {
            total_ingredients.merge(ingredient, metadata.serves);
        }

        let word_bag = [
            Some(metadata.name.as_str()),
            metadata.description.as_deref(),
            metadata.note.as_deref(),
        ]
        .into_iter()
        .flatten()
        .flat_map(str::split_whitespace)
        .map(str::to_lowercase)
        .collect();
        let tag_bag = metadata.tags.iter().cloned().collect();
        let ingredient_bag = total_ingredients
            .iter()
            .map(|i| i.name.to_lowercase())
            .collect();

        let mut recipe = Self {
            metadata,
            sections,
            steps,
            total_ingredients,
            roots: Vec::new(),
            word_bag,
            tag_bag,
            ingredient_bag,
        };
        graph::build(&mut recipe)?;
        Ok(recipe)
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn lang(&self) -> &str {
        &self.metadata.lang
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn section_steps(&self, section: &Section) -> &[Step] {
        &self.steps[section.steps.clone()]
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_bag.contains(&tag.to_lowercase())
    }

    pub fn has_ingredient(&self, ingredient: &str) -> bool {
        self.ingredient_bag.contains(&ingredient.to_lowercase())
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.word_bag.contains(&word.to_lowercase())
    }

    /// Every (upstream, downstream) edge of the dependency graph
    pub fn edges(&self) -> Vec<(StepId, StepId)> {
        self.steps
            .iter()
            .enumerate()
            .flat_map(|(index, step)| step.downstream.iter().map(move |&d| (StepId(index), d)))
            .collect()
    }
}
