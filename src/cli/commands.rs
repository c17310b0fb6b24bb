use crate::cookbook::{Cookbook, LoadReport};
use crate::recipe::Recipe;
use crate::search::Query;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Outcome of `cookbook check`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub recipes: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl CheckSummary {
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Load a folder and print every error and warning
pub fn check(folder: &Path) -> Result<CheckSummary> {
    info!("Checking recipes in {}", folder.display());

    let (book, report) = Cookbook::load_folder(folder)?;
    print_report(&report);

    let summary = CheckSummary {
        recipes: book.len(),
        errors: report.errors.len(),
        warnings: report.warnings.len(),
    };

    println!(
        "\n{} recipes loaded, {} errors, {} warnings",
        summary.recipes, summary.errors, summary.warnings
    );
    Ok(summary)
}

fn print_report(report: &LoadReport) {
    for error in &report.errors {
        println!("\x1b[31m\u{2717}\x1b[0m {}", error.report());
    }
    for warning in &report.warnings {
        println!("\x1b[33m!\x1b[0m {warning}");
    }
}

/// Run a query against a folder; `lang` defaults to the cookbook's main language
pub fn search(folder: &Path, query: &str, lang: Option<&str>) -> Result<Vec<Arc<Recipe>>> {
    let (book, report) = Cookbook::load_folder(folder)?;
    report.log();

    let lang = lang.unwrap_or_else(|| book.default_language());
    if !book.has_language(lang) {
        return Err(Error::NotFound(format!("No recipes in language {lang}")));
    }

    let query = Query::parse(query);
    info!("Searching {} recipes for {}", lang, query);
    Ok(book.search(lang, &query))
}

pub fn print_search_results(results: &[Arc<Recipe>]) {
    if results.is_empty() {
        println!("No recipes found");
        return;
    }

    println!("\nFound {} recipes:\n", results.len());
    println!("{:<30} {:<40} {:<20}", "ID", "Name", "Tags");
    println!("{}", "-".repeat(90));

    for recipe in results {
        let tags = recipe.metadata.tags.join(", ");

        println!(
            "{:<30} {:<40} {:<20}",
            truncate(recipe.id(), 28),
            truncate(recipe.name(), 38),
            truncate(&tags, 18)
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
