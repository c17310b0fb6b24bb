// Step dependency graph: named yields and implicit sequencing
use crate::error::{LoadError, LoadResult};
use crate::recipe::model::{Recipe, StepId};
use crate::recipe::similarity::close_matches;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Link every step of `recipe` to the steps it depends on.
///
/// A step that consumes yields (`=`/`@` lines) depends on the steps that
/// declared them. Any other step depends on the step right before it, unless
/// it is the first step or carries `@nodep`; those become roots. Existing
/// edges are discarded first, so building twice gives the same graph.
pub fn build(recipe: &mut Recipe) -> LoadResult<()> {
    for step in &mut recipe.steps {
        step.upstream.clear();
        step.downstream.clear();
    }
    recipe.roots.clear();

    let mut producers: HashMap<String, StepId> = HashMap::new();
    // yield name -> step that declared it, in declaration order for reporting
    let mut declared: Vec<(String, StepId)> = Vec::new();
    let mut consumed: HashSet<String> = HashSet::new();
    let mut edges: Vec<(StepId, StepId)> = Vec::new();

    for index in 0..recipe.steps.len() {
        let id = StepId(index);
        let step = &recipe.steps[index];
        let has_references = step.references().next().is_some();

        if index == 0 || step.no_dependency {
            if has_references {
                let reason = if index == 0 {
                    "The first step cannot use yields of other steps"
                } else {
                    "A step marked @nodep cannot use yields of other steps"
                };
                return Err(LoadError::new(format!(
                    "{reason}: {}",
                    step.references().cloned().collect::<Vec<_>>().join(", ")
                ))
                .with_note(step.location()));
            }
            recipe.roots.push(id);
        } else if !has_references {
            edges.push((StepId(index - 1), id));
        } else {
            for reference in step.references() {
                let key = reference.trim().to_lowercase();
                match producers.get(&key) {
                    Some(&producer) => {
                        consumed.insert(key);
                        if !edges.contains(&(producer, id)) {
                            edges.push((producer, id));
                        }
                    }
                    None => {
                        let mut message =
                            format!("Step uses '{reference}' but no earlier step yields it");
                        let candidates =
                            close_matches(&key, producers.keys().map(String::as_str));
                        if !candidates.is_empty() {
                            message.push_str(&format!(
                                "\n  Possibly misspelled, candidates: {}",
                                candidates.join(", ")
                            ));
                        }
                        return Err(LoadError::new(message).with_note(step.location()));
                    }
                }
            }
        }

        for name in &step.yields {
            let key = name.trim().to_lowercase();
            if let Some(previous) = producers.get(&key) {
                let previous = &recipe.steps[previous.0];
                return Err(LoadError::new(format!(
                    "Yield '{key}' is already declared {}",
                    previous.location()
                ))
                .with_note(step.location()));
            }
            producers.insert(key.clone(), id);
            declared.push((key, id));
        }
    }

    if let Some((name, producer)) = declared.iter().find(|(name, _)| !consumed.contains(name)) {
        return Err(
            LoadError::new(format!("Yield '{name}' declared but never used"))
                .with_note(recipe.steps[producer.0].location()),
        );
    }

    for &(from, to) in &edges {
        recipe.steps[from.0].downstream.push(to);
        recipe.steps[to.0].upstream.push(from);
    }

    debug!(
        "Built dependency graph for {}: {} steps, {} edges, {} roots",
        recipe.metadata.id,
        recipe.steps.len(),
        edges.len(),
        recipe.roots.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::recipe::parser::parse_str;
    use crate::recipe::model::StepId;

    const HEADER: &str = "name Test\nserves 4\n\n";

    fn parse(body: &str) -> crate::error::LoadResult<crate::recipe::Recipe> {
        parse_str(&format!("{HEADER}{body}"), "test", "en", "test.en.recipe")
    }

    #[test]
    fn test_yield_links_producer_and_consumer() {
        let recipe = parse(
            "# Sauce\n- 1 can tomatoes\nsimmer\n-> sauce\n\n# Pasta\n@nodep\n- 200 g pasta\nboil\n\n= Sauce\ncombine\n",
        )
        .unwrap();

        assert_eq!(recipe.steps.len(), 3);
        assert_eq!(recipe.roots, vec![StepId(0), StepId(1)]);
        assert_eq!(recipe.edges(), vec![(StepId(0), StepId(2))]);
        assert_eq!(recipe.steps[2].upstream, vec![StepId(0)]);
        assert_eq!(recipe.steps[0].downstream, vec![StepId(2)]);
    }

    #[test]
    fn test_implicit_sequence() {
        let recipe = parse("chop\n\nfry\n\nserve\n").unwrap();
        assert_eq!(recipe.roots, vec![StepId(0)]);
        assert_eq!(
            recipe.edges(),
            vec![(StepId(0), StepId(1)), (StepId(1), StepId(2))]
        );
    }

    #[test]
    fn test_unused_yield() {
        let err = parse("- 1 can tomatoes\nsimmer\n-> sauce\n\nserve\n").unwrap_err();
        assert!(err.message.contains("'sauce' declared but never used"));
        assert_eq!(err.context, vec!["in step #1 of section #1"]);
    }

    #[test]
    fn test_unknown_reference_suggests_candidates() {
        let err = parse("simmer\n-> tomato sauce\n\n= tomato sause\nserve\n").unwrap_err();
        assert!(err.message.contains("no earlier step yields it"));
        assert!(err.message.contains("candidates: tomato sauce"));
        assert_eq!(err.context, vec!["in step #2 of section #1"]);

        let err = parse("simmer\n-> sauce\n\n= gravy\nserve\n").unwrap_err();
        assert!(!err.message.contains("candidates"));
    }

    #[test]
    fn test_reference_before_declaration_fails() {
        let err = parse("chop\n\n@ stock\nstir\n\nboil\n-> stock\n").unwrap_err();
        assert!(err.message.contains("'stock'"));
    }

    #[test]
    fn test_redeclared_yield() {
        let err =
            parse("boil\n-> stock\n\n= stock\nreduce\n-> stock\n\n= stock\nserve\n").unwrap_err();
        assert!(err.message.contains("'stock' is already declared in step #1"));
        assert_eq!(err.context, vec!["in step #2 of section #1"]);
    }

    #[test]
    fn test_first_step_cannot_reference() {
        let err = parse("= sauce\nserve\n").unwrap_err();
        assert!(err.message.contains("first step"));
    }

    #[test]
    fn test_nodep_step_cannot_reference() {
        let err = parse("boil\n-> stock\n\n@nodep\n= stock\nserve\n").unwrap_err();
        assert!(err.message.contains("@nodep"));
    }

    #[test]
    fn test_hidden_reference_is_case_insensitive() {
        let recipe = parse("boil\n-> Stock\n\n@ STOCK\nserve\n").unwrap();
        assert_eq!(recipe.edges(), vec![(StepId(0), StepId(1))]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut recipe = parse(
            "boil\n-> stock\n\n@nodep\nchop\n-> veg\n\n= stock\n= veg\nsimmer\n\nserve\n",
        )
        .unwrap();
        let first = recipe.edges();
        let roots = recipe.roots.clone();

        super::build(&mut recipe).unwrap();
        assert_eq!(recipe.edges(), first);
        assert_eq!(recipe.roots, roots);
        assert_eq!(
            first,
            vec![
                (StepId(0), StepId(2)),
                (StepId(1), StepId(2)),
                (StepId(2), StepId(3))
            ]
        );
    }

    #[test]
    fn test_graph_is_acyclic() {
        let recipe = parse(
            "boil\n-> stock\n\nchop\n-> veg\n\n= stock\n@ veg\nsimmer\n\nserve\n",
        )
        .unwrap();
        // every edge points forward in document order
        assert!(recipe.edges().iter().all(|(from, to)| from < to));
    }
}
