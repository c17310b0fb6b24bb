// Cross-recipe checks that only make sense once the whole folder is loaded
use crate::recipe::close_matches;
use crate::error::LoadError;
use crate::recipe::Recipe;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// A non-fatal problem spanning several recipes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorpusWarning {
    #[error(
        "Tag '{tag}' of language {lang} potentially misspelled.\n  Tag present in files: {}\n  Candidate tags:\n{}",
        .recipes.join(", "),
        render_candidates(.candidates)
    )]
    MisspelledTag {
        lang: String,
        tag: String,
        recipes: Vec<String>,
        candidates: Vec<(String, Vec<String>)>,
    },

    #[error("Recipe {recipe} references unknown related recipe {related}.{}", render_suggestions(.candidates))]
    UnknownRelated {
        recipe: String,
        related: String,
        candidates: Vec<String>,
    },

    #[error("Recipe {recipe} references {related} but {related} is not translated to {lang}")]
    MissingTranslation {
        recipe: String,
        related: String,
        lang: String,
    },
}

fn render_candidates(candidates: &[(String, Vec<String>)]) -> String {
    candidates
        .iter()
        .map(|(tag, recipes)| format!("    - {tag} in {}", recipes.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_suggestions(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!("\n  Possibly misspelled, candidates: {}", candidates.join(", "))
    }
}

/// Every tag seen per language, with the recipes using it.
///
/// Fed one recipe at a time while a folder loads, then turned into
/// misspelling warnings once all recipes are known.
#[derive(Debug, Default)]
pub struct TagVocabulary {
    by_lang: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl TagVocabulary {
    pub fn observe(&mut self, recipe: &Recipe) {
        let tags = self.by_lang.entry(recipe.lang().to_string()).or_default();
        for tag in &recipe.metadata.tags {
            let users = tags.entry(tag.clone()).or_default();
            if !users.iter().any(|id| id == recipe.id()) {
                users.push(recipe.id().to_string());
            }
        }
    }

    pub fn finish(self) -> Vec<CorpusWarning> {
        let mut warnings = Vec::new();

        for (lang, tags) in &self.by_lang {
            for (tag, recipes) in tags {
                let similar = close_matches(
                    tag,
                    tags.keys().map(String::as_str).filter(|other| *other != tag),
                );
                if similar.is_empty() {
                    continue;
                }

                warnings.push(CorpusWarning::MisspelledTag {
                    lang: lang.clone(),
                    tag: tag.clone(),
                    recipes: recipes.clone(),
                    candidates: similar
                        .into_iter()
                        .map(|other| {
                            let users = tags.get(&other).cloned().unwrap_or_default();
                            (other, users)
                        })
                        .collect(),
                });
            }
        }

        warnings
    }
}

/// Outcome of loading a folder: per-file errors and corpus-wide warnings
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<LoadError>,
    pub warnings: Vec<CorpusWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Emit every error and warning through tracing
    pub fn log(&self) {
        if !self.errors.is_empty() {
            warn!(
                "{} recipes failed to load and will be ignored",
                self.errors.len()
            );
        }
        for error in &self.errors {
            warn!("{}", error.report());
        }
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}
