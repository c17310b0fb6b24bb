// Corpus of recipes loaded from a folder, indexed by id, language and tag

pub mod reloader;
pub mod store;
pub mod validate;

use crate::error::{Error, LoadError, LoadResult, Result};
use crate::recipe::{self, close_matches, legacy, normalize_id, Recipe};
use crate::search::Query;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

// Re-exports
pub use reloader::Reloader;
pub use store::CookbookStore;
pub use validate::{CorpusWarning, LoadReport, TagVocabulary};

pub const FALLBACK_LANG: &str = "en";
pub const NO_IMAGE: &str = "static/no-image.png";

/// On-disk recipe formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Line-oriented `.recipe` documents
    Recipe,
    /// First-generation `.yml` / `.yaml` documents
    Legacy,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "recipe" => Some(Self::Recipe),
            "yml" | "yaml" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// The parts of `<raw id>.<lang>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFileName<'a> {
    pub raw_id: &'a str,
    pub lang: &'a str,
    pub extension: &'a str,
}

impl<'a> RecipeFileName<'a> {
    /// Split a file name; `None` when there is no extension at all
    pub fn split(file_name: &'a str) -> Option<LoadResult<Self>> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        Some(match stem.rsplit_once('.') {
            Some((raw_id, lang)) if !raw_id.is_empty() && !lang.is_empty() => Ok(Self {
                raw_id,
                lang,
                extension,
            }),
            _ => Err(LoadError::new(format!(
                "Recipe file name '{file_name}' has no language tag, expected <name>.<lang>.{extension}"
            ))),
        })
    }
}

/// All translations of one recipe
#[derive(Debug, Clone, Default)]
pub struct RecipeTranslations {
    pub translations: BTreeMap<String, Arc<Recipe>>,
}

impl RecipeTranslations {
    /// The translation in `lang`, else in `fallback`, else any
    pub fn get(&self, lang: &str, fallback: &str) -> Option<&Arc<Recipe>> {
        self.translations
            .get(lang)
            .or_else(|| self.translations.get(fallback))
            .or_else(|| self.translations.values().next())
    }

    pub fn name(&self, lang: &str, fallback: &str) -> Option<&str> {
        self.get(lang, fallback).map(|r| r.name())
    }
}

#[derive(Debug)]
pub struct Cookbook {
    folder: PathBuf,
    loaded_at: DateTime<Utc>,
    by_id: BTreeMap<String, RecipeTranslations>,
    by_language: BTreeMap<String, Vec<Arc<Recipe>>>,
    by_lang_and_tag: HashMap<String, BTreeMap<String, Vec<Arc<Recipe>>>>,
    tag_counts: HashMap<String, HashMap<String, usize>>,
}

impl Cookbook {
    pub fn empty(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            loaded_at: Utc::now(),
            by_id: BTreeMap::new(),
            by_language: BTreeMap::new(),
            by_lang_and_tag: HashMap::new(),
            tag_counts: HashMap::new(),
        }
    }

    /// Load every recipe below `path`.
    ///
    /// A broken recipe is recorded in the report and skipped; only a missing
    /// folder fails the whole load.
    pub fn load_folder(path: impl AsRef<Path>) -> Result<(Self, LoadReport)> {
        let folder = path.as_ref();
        if !folder.is_dir() {
            return Err(Error::NotFound(format!(
                "No cookbook location at {}",
                folder.display()
            )));
        }

        let mut book = Self::empty(folder);
        let mut report = LoadReport::default();
        let mut vocabulary = TagVocabulary::default();

        for entry in WalkDir::new(folder).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let message = format!("Failed to walk {}", folder.display());
                    report.errors.push(LoadError::with_cause(message, e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(format) = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(DocumentFormat::from_extension)
            else {
                continue;
            };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let outcome = RecipeFileName::split(&file_name)
                .unwrap_or_else(|| Err(LoadError::new("Recipe file without extension")))
                .and_then(|name| load_file(entry.path(), &name, &file_name, format))
                .and_then(|recipe| book.insert(recipe))
                .map(|recipe| vocabulary.observe(&recipe));

            if let Err(e) = outcome {
                report
                    .errors
                    .push(e.with_note(format!("in recipe '{file_name}'")));
            }
        }

        report.warnings.extend(vocabulary.finish());
        report.warnings.extend(book.validate_related());

        info!(
            "Cookbook: {} recipes loaded (path: {})",
            book.by_id.len(),
            folder.display()
        );
        for (lang, recipes) in &book.by_language {
            info!("- {}: {}", lang, recipes.len());
        }

        Ok((book, report))
    }

    /// Add a parsed recipe to every index
    pub fn insert(&mut self, recipe: Recipe) -> LoadResult<Arc<Recipe>> {
        let id = recipe.id().to_string();
        let lang = recipe.lang().to_string();

        let translations = self.by_id.entry(id.clone()).or_default();
        if let Some(existing) = translations.translations.get(&lang) {
            return Err(LoadError::new(format!(
                "Duplicate recipe {id} for language {lang}, already loaded from '{}'",
                existing.metadata.filename
            )));
        }

        let recipe = Arc::new(recipe);
        translations
            .translations
            .insert(lang.clone(), Arc::clone(&recipe));

        self.by_language
            .entry(lang.clone())
            .or_default()
            .push(Arc::clone(&recipe));

        let tags = self.by_lang_and_tag.entry(lang.clone()).or_default();
        let counts = self.tag_counts.entry(lang).or_default();
        for tag in &recipe.metadata.tags {
            tags.entry(tag.clone()).or_default().push(Arc::clone(&recipe));
            *counts.entry(tag.clone()).or_default() += 1;
        }

        debug!("Indexed recipe {}.{}", recipe.id(), recipe.lang());
        Ok(recipe)
    }

    fn validate_related(&self) -> Vec<CorpusWarning> {
        let mut warnings = Vec::new();

        for (lang, recipes) in &self.by_language {
            for recipe in recipes {
                for related in &recipe.metadata.related {
                    match self.by_id.get(related) {
                        None => warnings.push(CorpusWarning::UnknownRelated {
                            recipe: recipe.id().to_string(),
                            related: related.clone(),
                            candidates: close_matches(
                                related,
                                self.by_id.keys().map(String::as_str),
                            ),
                        }),
                        Some(other) if !other.translations.contains_key(lang) => {
                            warnings.push(CorpusWarning::MissingTranslation {
                                recipe: recipe.id().to_string(),
                                related: related.clone(),
                                lang: lang.clone(),
                            })
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        warnings
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RecipeTranslations> {
        self.by_id.get(&normalize_id(id))
    }

    pub fn languages(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_language
            .iter()
            .map(|(lang, recipes)| (lang.as_str(), recipes.len()))
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.by_language.contains_key(lang)
    }

    /// The language with the most recipes, or `en` for an empty cookbook
    pub fn default_language(&self) -> &str {
        self.by_language
            .iter()
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| b.0.cmp(a.0)))
            .map(|(lang, _)| lang.as_str())
            .unwrap_or(FALLBACK_LANG)
    }

    pub fn recipes(&self, lang: &str) -> &[Arc<Recipe>] {
        self.by_language
            .get(lang)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn recipes_with_tag(&self, lang: &str, tag: &str) -> &[Arc<Recipe>] {
        self.by_lang_and_tag
            .get(lang)
            .and_then(|tags| tags.get(&tag.to_lowercase()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Visible recipes of a language sorted by name
    pub fn listing(&self, lang: &str) -> Vec<Arc<Recipe>> {
        let mut listing: Vec<_> = self
            .recipes(lang)
            .iter()
            .filter(|r| !r.metadata.hide_from_all)
            .cloned()
            .collect();
        listing.sort_by(|a, b| a.name().cmp(b.name()));
        listing
    }

    /// Recipes of a language matching `query`, sorted by name
    pub fn search(&self, lang: &str, query: &Query) -> Vec<Arc<Recipe>> {
        let mut results: Vec<_> = self
            .recipes(lang)
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        results.sort_by(|a, b| a.name().cmp(b.name()));
        results
    }

    /// Up to `limit` tags of a language, most used first
    pub fn most_common_tags(&self, lang: &str, limit: usize) -> Vec<(String, usize)> {
        let Some(counts) = self.tag_counts.get(lang) else {
            return Vec::new();
        };

        let mut tags: Vec<(String, usize)> = counts
            .iter()
            .map(|(tag, count)| (tag.clone(), *count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tags.truncate(limit);
        tags
    }

    /// Image for a recipe, relative to the cookbook folder.
    ///
    /// Looks for `images/<file name>.png|jpg` first, then the slug form of
    /// the id.
    pub fn image_path(&self, recipe: &Recipe) -> String {
        let raw_id = RecipeFileName::split(&recipe.metadata.filename)
            .and_then(|split| split.ok())
            .map(|split| split.raw_id)
            .unwrap_or(recipe.id());

        for stem in [raw_id, recipe.id()] {
            for extension in ["png", "jpg"] {
                let relative = format!("images/{stem}.{extension}");
                if self.folder.join(&relative).is_file() {
                    return relative;
                }
            }
        }
        NO_IMAGE.to_string()
    }

    pub fn tag_count(&self) -> usize {
        self.tag_counts.values().map(HashMap::len).sum()
    }
}

fn load_file(
    path: &Path,
    name: &RecipeFileName<'_>,
    file_name: &str,
    format: DocumentFormat,
) -> LoadResult<Recipe> {
    let file = File::open(path).map_err(|e| {
        LoadError::with_cause(format!("Failed to open {}", path.display()), e)
    })?;
    let reader = BufReader::new(file);

    match format {
        DocumentFormat::Recipe => recipe::parse(reader, name.raw_id, name.lang, file_name),
        DocumentFormat::Legacy => legacy::parse(reader, name.raw_id, name.lang, file_name),
    }
}
