// Line-oriented recipe document parser (`.recipe` files)
use crate::error::{LoadError, LoadResult};
use crate::recipe::metadata::{normalize_id, split_list, MetadataBuilder, RecipeMetadata};
use crate::recipe::model::{Recipe, SectionDraft, Step};
use crate::recipe::quantity::{split_instruction, Ingredient};
use std::io::Read;
use std::iter::{Enumerate, Peekable};
use std::str::Lines;
use tracing::debug;

type LineIter<'a> = Peekable<Enumerate<Lines<'a>>>;

/// Parse a recipe document from a reader
pub fn parse<R: Read>(mut reader: R, id: &str, lang: &str, filename: &str) -> LoadResult<Recipe> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| LoadError::with_cause("Failed to read recipe", e))?;
    parse_str(&text, id, lang, filename)
}

/// Parse a recipe document held in memory
pub fn parse_str(text: &str, id: &str, lang: &str, filename: &str) -> LoadResult<Recipe> {
    debug!("Parsing recipe document {}", filename);

    let mut lines: LineIter<'_> = text.lines().enumerate().peekable();
    let metadata = parse_metadata(&mut lines, id, lang, filename)?;
    let sections = parse_body(&mut lines, metadata.serves)?;

    Recipe::assemble(metadata, sections)
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn line_note(index: usize) -> String {
    format!("in line {}", index + 1)
}

fn parse_metadata(
    lines: &mut LineIter<'_>,
    id: &str,
    lang: &str,
    filename: &str,
) -> LoadResult<RecipeMetadata> {
    let mut meta = MetadataBuilder::new(id, lang, filename);

    while let Some((index, line)) = lines.next_if(|(_, l)| !is_blank(l)) {
        let line = line.trim_end();
        let (command, value) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));

        let applied = match command {
            "name" => required_value(command, value).and_then(|v| meta.name(v).map(drop)),
            "serves" => meta.serves_line(value).map(drop),
            "desc" | "note" => {
                let mut text = value.trim().to_string();
                while let Some((_, continuation)) =
                    lines.next_if(|(_, l)| l.starts_with("  ") && !is_blank(l))
                {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(continuation.trim());
                }
                if command == "desc" {
                    meta.description(text).map(drop)
                } else {
                    meta.note(text).map(drop)
                }
            }
            "tags" => meta.tags(split_list(value)).map(drop),
            "related" => {
                let related = split_list(value).iter().map(|r| normalize_id(r)).collect();
                meta.related(related).map(drop)
            }
            "attrib" => required_value(command, value).and_then(|v| meta.attribution(v).map(drop)),
            "hide" => meta.hide_from_all(true).map(drop),
            "version" => value
                .trim()
                .parse::<u32>()
                .map_err(|e| {
                    LoadError::with_cause(format!("Schema version '{}' is not a number", value.trim()), e)
                })
                .and_then(|v| meta.schema_version(v).map(drop)),
            other => Err(LoadError::new(format!(
                "Unknown recipe meta attribute '{other}'"
            ))),
        };

        applied.map_err(|e| e.with_note(line_note(index)))?;
    }

    meta.build()
}

fn required_value(command: &str, value: &str) -> LoadResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LoadError::new(format!("`{command}` needs a value")));
    }
    Ok(value.to_string())
}

fn parse_body(lines: &mut LineIter<'_>, serves: u32) -> LoadResult<Vec<SectionDraft>> {
    let mut sections = Vec::new();
    let mut current = SectionDraft::default();

    loop {
        while lines.next_if(|(_, l)| is_blank(l)).is_some() {}

        let Some(&(_, line)) = lines.peek() else {
            break;
        };

        if let Some(heading) = line.strip_prefix("# ") {
            lines.next();
            if !current.is_blank() {
                sections.push(std::mem::take(&mut current));
            }
            current.heading = Some(heading.trim().to_string());
        } else {
            let location = format!(
                "in step #{} of section #{}",
                current.steps.len() + 1,
                sections.len() + 1
            );
            let step = parse_step(lines, serves).map_err(|e| e.with_note(location))?;
            current.steps.push(step);
        }
    }

    if !current.is_blank() {
        sections.push(current);
    }

    Ok(sections)
}

/// Consume one step: a run of non-blank lines up to a blank line or heading
fn parse_step(lines: &mut LineIter<'_>, serves: u32) -> LoadResult<Step> {
    let mut step = Step::new(serves);

    while let Some((index, line)) =
        lines.next_if(|(_, l)| !is_blank(l) && !l.starts_with("# "))
    {
        let line = line.trim_end();
        parse_step_line(&mut step, line, serves).map_err(|e| e.with_note(line_note(index)))?;
    }

    Ok(step)
}

fn parse_step_line(step: &mut Step, line: &str, serves: u32) -> LoadResult<()> {
    if let Some(rest) = marked(line, "-") {
        step.ingredients.push(Ingredient::parse(rest, serves)?);
    } else if let Some(rest) = marked(line, "=") {
        step.internal_ingredients.push(non_empty(rest, "internal ingredient")?.to_string());
    } else if line.starts_with("@nodep") {
        step.no_dependency = true;
    } else if let Some(rest) = marked(line, "@") {
        step.hidden_ingredients.push(non_empty(rest, "hidden ingredient")?.to_string());
    } else if let Some(rest) = marked(line, "->") {
        step.yields.push(non_empty(rest, "yield")?.to_lowercase());
    } else {
        step.instructions.extend(split_instruction(line, serves)?);
    }
    Ok(())
}

/// Remainder of a `<marker> <rest>` line; a bare marker yields an empty remainder
fn marked<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

fn non_empty<'a>(rest: &'a str, what: &str) -> LoadResult<&'a str> {
    match rest.trim() {
        "" => Err(LoadError::new(format!("Empty {what} line"))),
        name => Ok(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::quantity::InstructionPart;

    const CHILI: &str = "name Chili sin Carne
serves 4 bowls 2
desc A smoky bean chili
  that keeps well.
tags Spicy, vegan
related Corn Bread, rice
attrib Family recipe
note Better on
  the second day

# Base
- 2 onions
- 1 tbsp 'olive oil'
fry until soft, about {8} minutes

- 2 cans beans
- 1 can tomatoes
- salt
simmer for {30} minutes
-> chili base

# Serve
@nodep
- rice
cook the rice

= chili base
- salt
- 1 pinch salt
serve over rice
";

    #[test]
    fn test_parse_full_document() {
        let recipe = parse_str(CHILI, "Chili Sin Carne", "en", "Chili Sin Carne.en.recipe").unwrap();
        let meta = &recipe.metadata;

        assert_eq!(meta.id, "chili-sin-carne");
        assert_eq!(meta.name, "Chili sin Carne");
        assert_eq!(meta.serves, 4);
        assert_eq!(meta.servings_unit.as_deref(), Some("bowls"));
        assert_eq!(meta.servings_increment, 2.0);
        assert_eq!(
            meta.description.as_deref(),
            Some("A smoky bean chili that keeps well.")
        );
        assert_eq!(meta.note.as_deref(), Some("Better on the second day"));
        assert_eq!(meta.tags, vec!["spicy", "vegan"]);
        assert_eq!(meta.related, vec!["corn-bread", "rice"]);
        assert_eq!(meta.attribution.as_deref(), Some("Family recipe"));
        assert!(!meta.hide_from_all);

        assert_eq!(recipe.sections.len(), 2);
        assert_eq!(recipe.sections[0].heading.as_deref(), Some("Base"));
        assert_eq!(recipe.section_steps(&recipe.sections[0]).len(), 2);
        assert_eq!(recipe.section_steps(&recipe.sections[1]).len(), 2);

        let fry = &recipe.steps[0];
        assert_eq!(fry.ingredients[1].name, "olive oil");
        assert_eq!(fry.ingredients[1].unit.as_deref(), Some("tbsp"));
        assert!(matches!(
            fry.instructions[4],
            InstructionPart::Scalar(s) if s.amount == 8.0 && s.amount_per_serving == 2.0
        ));

        assert_eq!(recipe.steps[1].yields, vec!["chili base"]);
        assert!(recipe.steps[2].no_dependency);
        assert_eq!(recipe.steps[3].internal_ingredients, vec!["chili base"]);
    }

    #[test]
    fn test_merged_totals() {
        let recipe = parse_str(CHILI, "chili", "en", "chili.en.recipe").unwrap();
        let totals: Vec<(&str, Option<f64>, Option<&str>)> = recipe
            .total_ingredients
            .iter()
            .map(|i| (i.name.as_str(), i.amount, i.unit.as_deref()))
            .collect();

        assert_eq!(
            totals,
            vec![
                ("onions", Some(2.0), None),
                ("olive oil", Some(1.0), Some("tbsp")),
                ("beans", Some(2.0), Some("cans")),
                ("tomatoes", Some(1.0), Some("can")),
                ("salt", Some(1.0), Some("pinch")),
                ("salt", None, None),
                ("rice", None, None),
            ]
        );
        assert!(recipe.has_ingredient("Olive Oil"));
        assert!(recipe.has_tag("SPICY"));
        assert!(recipe.has_word("smoky"));
        assert!(!recipe.has_word("rice"));
    }

    #[test]
    fn test_steps_without_heading() {
        let recipe = parse_str("name Toast\nserves 1\n\ntoast bread\n\nbutter it\n", "toast", "en", "toast.en.recipe").unwrap();
        assert_eq!(recipe.sections.len(), 1);
        assert_eq!(recipe.sections[0].heading, None);
        assert_eq!(recipe.steps.len(), 2);
    }

    #[test]
    fn test_heading_ends_step_without_blank_line() {
        let recipe = parse_str(
            "name Toast\nserves 1\n\n# One\ntoast bread\n# Two\nbutter it\n",
            "toast",
            "en",
            "toast.en.recipe",
        )
        .unwrap();
        assert_eq!(recipe.sections.len(), 2);
        assert_eq!(recipe.sections[1].steps, 1..2);
    }

    #[test]
    fn test_metadata_only_document() {
        let recipe = parse_str("name Water\nserves 1\nhide\n", "water", "en", "water.en.recipe").unwrap();
        assert!(recipe.metadata.hide_from_all);
        assert!(recipe.steps.is_empty());
        assert!(recipe.roots.is_empty());
    }

    #[test]
    fn test_duplicate_field_is_reported_with_line() {
        let err = parse_str("name A\nname B\nserves 1\n", "a", "en", "a.en.recipe").unwrap_err();
        assert!(err.message.contains("name already set"));
        assert_eq!(err.context, vec!["in line 2"]);

        let err = parse_str("name A\ntags a\ntags b\nserves 1\n", "a", "en", "a.en.recipe").unwrap_err();
        assert!(err.message.contains("tags already set"));
    }

    #[test]
    fn test_unknown_meta_attribute() {
        let err = parse_str("name A\nserves 1\ncolour red\n", "a", "en", "a.en.recipe").unwrap_err();
        assert!(err.message.contains("'colour'"));
    }

    #[test]
    fn test_wrong_version() {
        let err = parse_str("name A\nserves 1\nversion 3\n", "a", "en", "a.en.recipe").unwrap_err();
        assert!(err.message.contains("expected to be 2"));
        assert!(parse_str("name A\nserves 1\nversion 2\n", "a", "en", "a.en.recipe").is_ok());
    }

    #[test]
    fn test_bad_ingredient_reports_step_and_line() {
        let err = parse_str(
            "name A\nserves 1\n\n# Prep\nchop\n\n- lots of flour\nmix\n",
            "a",
            "en",
            "a.en.recipe",
        )
        .unwrap_err();
        assert!(err.message.contains("'lots'"));
        assert_eq!(err.context, vec!["in line 7", "in step #2 of section #1"]);
    }

    #[test]
    fn test_empty_ingredient_line_is_an_error() {
        let err = parse_str("name A\nserves 1\n\n- \nmix\n", "a", "en", "a.en.recipe")
            .unwrap_err();
        assert!(err.message.contains("Empty ingredient line"));
        assert_eq!(err.context, vec!["in line 4", "in step #1 of section #1"]);

        assert!(parse_str("name A\nserves 1\n\n-\nmix\n", "a", "en", "a.en.recipe").is_err());
    }

    #[test]
    fn test_empty_reference_and_yield_lines_are_errors() {
        for (line, what) in [
            ("= ", "internal ingredient"),
            ("@ ", "hidden ingredient"),
            ("-> ", "yield"),
            ("->", "yield"),
        ] {
            let text = format!("name A\nserves 1\n\nboil\n-> stock\n\n= stock\n{line}\nmix\n");
            let err = parse_str(&text, "a", "en", "a.en.recipe").unwrap_err();
            assert_eq!(err.message, format!("Empty {what} line"), "line {line:?}");
            assert_eq!(err.context, vec!["in line 8", "in step #2 of section #1"]);
        }
    }

    #[test]
    fn test_dash_words_stay_instructions() {
        let recipe = parse_str("name A\nserves 1\n\n-5 degrees outside\n", "a", "en", "a.en.recipe")
            .unwrap();
        assert!(recipe.steps[0].ingredients.is_empty());
        assert_eq!(recipe.steps[0].instructions.len(), 3);
    }

    #[test]
    fn test_parse_from_reader() {
        let reader = std::io::Cursor::new("name A\nserves 2\n\nmix {1.5} cups\n");
        let recipe = parse(reader, "a", "en", "a.en.recipe").unwrap();
        assert_eq!(recipe.steps[0].instructions.len(), 3);
    }
}
