use axum::{
    extract::{Path, Query, State},
    Json,
};
use tower_cookies::{Cookie, Cookies};
use tracing::debug;

use crate::{
    api::models::*,
    config::Settings,
    cookbook::{Cookbook, CookbookStore, NO_IMAGE},
    recipe::Recipe,
    search, Error, Result,
};

pub const LANG_COOKIE: &str = "lang";

/// Origin used to percent-encode image paths when no `BASE_URL` is set
const LOCAL_ORIGIN: &str = "http://localhost/";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: CookbookStore,
    pub settings: Settings,
}

impl AppState {
    /// Language for a request: explicit parameter, then cookie, then default.
    ///
    /// An explicit language is remembered in the `lang` cookie and must exist
    /// in the cookbook; a stale cookie is ignored.
    fn resolve_lang(&self, book: &Cookbook, requested: Option<String>, cookies: &Cookies) -> Result<String> {
        if let Some(lang) = requested {
            if !book.has_language(&lang) {
                return Err(Error::NotFound(format!("No recipes in language {lang}")));
            }
            let mut cookie = Cookie::new(LANG_COOKIE, lang.clone());
            cookie.set_path("/");
            cookies.add(cookie);
            return Ok(lang);
        }

        if let Some(cookie) = cookies.get(LANG_COOKIE) {
            if book.has_language(cookie.value()) {
                return Ok(cookie.value().to_string());
            }
        }

        Ok(self.default_lang(book))
    }

    fn default_lang(&self, book: &Cookbook) -> String {
        match &self.settings.cookbook.default_lang {
            Some(lang) if book.has_language(lang) => lang.clone(),
            _ => book.default_language().to_string(),
        }
    }

    /// Public URL of a recipe image, `None` when the recipe has none
    fn image_url(&self, book: &Cookbook, recipe: &Recipe) -> Option<String> {
        let path = book.image_path(recipe);
        if path == NO_IMAGE {
            return None;
        }

        let join = |base: &str| url::Url::parse(base).and_then(|base| base.join(&path));
        let relative = join(LOCAL_ORIGIN).ok().map(|url| url.path().to_string());
        match &self.settings.server.base_url {
            Some(base) => join(base.as_str()).map(String::from).ok().or(relative),
            None => relative,
        }
    }

    fn card(&self, book: &Cookbook, recipe: &Recipe) -> RecipeCard {
        RecipeCard {
            id: recipe.id().to_string(),
            lang: recipe.lang().to_string(),
            name: recipe.name().to_string(),
            description: recipe.metadata.description.clone(),
            tags: recipe.metadata.tags.clone(),
            image_url: self.image_url(book, recipe),
        }
    }
}

const POPULAR_TAGS: usize = 10;
const MAX_QUERY_LENGTH: usize = 512;

/// GET /api/languages - Available languages with recipe counts
pub async fn list_languages(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<LangParams>,
) -> Result<Json<LanguagesResponse>> {
    let book = state.store.snapshot().await;
    let current = state.resolve_lang(&book, params.lang, &cookies)?;

    Ok(Json(LanguagesResponse {
        current,
        default: state.default_lang(&book),
        languages: book
            .languages()
            .map(|(lang, recipes)| LanguageInfo {
                lang: lang.to_string(),
                recipes,
            })
            .collect(),
    }))
}

/// GET /api/recipes - Visible recipes of a language, by name
pub async fn list_recipes(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<LangParams>,
) -> Result<Json<RecipeListResponse>> {
    debug!("List recipes request: {:?}", params);

    let book = state.store.snapshot().await;
    let lang = state.resolve_lang(&book, params.lang, &cookies)?;

    let recipes: Vec<RecipeCard> = book
        .listing(&lang)
        .iter()
        .map(|recipe| state.card(&book, recipe))
        .collect();

    Ok(Json(RecipeListResponse {
        total: recipes.len(),
        recipes,
        popular_tags: book
            .most_common_tags(&lang, POPULAR_TAGS)
            .into_iter()
            .map(TagCount::from)
            .collect(),
        lang,
    }))
}

/// GET /api/search - Search recipes
pub async fn search_recipes(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    if params.query.len() > MAX_QUERY_LENGTH {
        return Err(Error::Validation(format!(
            "Search query longer than {MAX_QUERY_LENGTH} bytes"
        )));
    }

    let book = state.store.snapshot().await;
    let lang = state.resolve_lang(&book, params.lang, &cookies)?;

    let query = search::Query::parse(&params.query);
    debug!("Search request ({}): {}", lang, query);

    let results: Vec<RecipeCard> = book
        .search(&lang, &query)
        .iter()
        .map(|recipe| state.card(&book, recipe))
        .collect();

    Ok(Json(SearchResponse {
        lang,
        query: query.to_string(),
        total: results.len(),
        results,
    }))
}

/// GET /api/recipes/:id - Get recipe details
pub async fn get_recipe(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
    Query(params): Query<LangParams>,
) -> Result<Json<RecipeDetail>> {
    debug!("Get recipe request: {}", id);

    let book = state.store.snapshot().await;
    let lang = state.resolve_lang(&book, params.lang, &cookies)?;
    let fallback = state.default_lang(&book);

    let translations = book
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("Recipe {id} not found")))?;
    let recipe = translations
        .get(&lang, &fallback)
        .ok_or_else(|| Error::NotFound(format!("Recipe {id} not found")))?;

    let related = recipe
        .metadata
        .related
        .iter()
        .filter_map(|related| {
            let name = book.get(related)?.name(&lang, &fallback)?;
            Some(RelatedRecipe {
                id: related.clone(),
                name: name.to_string(),
            })
        })
        .collect();

    Ok(Json(RecipeDetail {
        id: recipe.id().to_string(),
        lang: recipe.lang().to_string(),
        name: recipe.name().to_string(),
        serves: recipe.metadata.serves,
        servings_unit: recipe.metadata.servings_unit.clone(),
        servings_increment: recipe.metadata.servings_increment,
        description: recipe.metadata.description.clone(),
        note: recipe.metadata.note.clone(),
        tags: recipe.metadata.tags.clone(),
        attribution: recipe.metadata.attribution.clone(),
        image_url: state.image_url(&book, recipe),
        translations: translations
            .translations
            .keys()
            .filter(|other| *other != recipe.lang())
            .cloned()
            .collect(),
        related,
        ingredients: recipe
            .total_ingredients
            .iter()
            .map(IngredientDetail::from)
            .collect(),
        sections: SectionDetail::from_recipe(recipe),
        roots: recipe.roots.clone(),
    }))
}

/// GET /api/tags - Tags of a language, most used first
pub async fn list_tags(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<LangParams>,
) -> Result<Json<TagsResponse>> {
    let book = state.store.snapshot().await;
    let lang = state.resolve_lang(&book, params.lang, &cookies)?;

    let tags = book
        .most_common_tags(&lang, usize::MAX)
        .into_iter()
        .map(TagCount::from)
        .collect();

    Ok(Json(TagsResponse { lang, tags }))
}

/// GET /api/stats - Get cookbook statistics
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>> {
    debug!("Get stats request");

    let book = state.store.snapshot().await;
    Ok(Json(stats(&book)))
}

fn stats(book: &Cookbook) -> Stats {
    Stats {
        total_recipes: book.len(),
        total_translations: book.languages().map(|(_, count)| count).sum(),
        total_languages: book.languages().count(),
        total_tags: book.tag_count(),
        loaded_at: book.loaded_at().to_rfc3339(),
    }
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// GET /ready - Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<ReadinessResponse>> {
    let book = state.store.snapshot().await;

    Ok(Json(ReadinessResponse {
        ready: !book.is_empty(),
        recipes: book.len(),
        loaded_at: book.loaded_at().to_rfc3339(),
    }))
}
