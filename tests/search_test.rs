// Search queries evaluated against the fixture cookbook
use cookbook::cookbook::Cookbook;
use cookbook::search::Query;
use std::path::PathBuf;

fn book() -> Cookbook {
    let folder = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cookbook");
    Cookbook::load_folder(folder).unwrap().0
}

fn ids(book: &Cookbook, lang: &str, query: &str) -> Vec<String> {
    book.search(lang, &Query::parse(query))
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}

#[test]
fn test_tag_and_ingredient_clauses() {
    let book = book();
    assert_eq!(ids(&book, "en", "tag:vegan ingr:rice"), vec!["chili-sin-carne", "rice"]);
    assert_eq!(ids(&book, "en", "tag:spicy"), vec!["chili-sin-carne"]);
    assert!(ids(&book, "en", "tag:spicy ingr:cornmeal").is_empty());
}

#[test]
fn test_generic_terms_match_words() {
    let book = book();
    assert_eq!(ids(&book, "en", "smoky"), vec!["chili-sin-carne"]);
    assert_eq!(ids(&book, "en", "\"oat milk\""), vec!["corn-bread"]);
    assert_eq!(ids(&book, "de", "rauchiges"), vec!["chili-sin-carne"]);
    assert!(ids(&book, "de", "smoky").is_empty());
}

#[test]
fn test_search_includes_hidden_recipes() {
    let book = book();
    assert_eq!(ids(&book, "en", "ingr:carrots"), vec!["stock"]);
}

#[test]
fn test_empty_query_returns_everything() {
    let book = book();
    assert_eq!(ids(&book, "en", "").len(), 4);
    assert_eq!(ids(&book, "en", "tag:").len(), 4);
}
