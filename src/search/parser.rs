// Tokenizer and clause builder for search strings like `tag:spicy ingr:"red onion" soup`
use crate::recipe::lexer::Scanner;
use crate::search::Query;

const SEPARATORS: [char; 2] = [':', ' '];
const WORD_END: [char; 4] = [' ', ':', '"', '\''];

struct QueryScanner<'a> {
    scanner: Scanner<'a>,
}

impl<'a> QueryScanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            scanner: Scanner::new(input),
        }
    }

    /// Next token, or `None` at end of input.
    ///
    /// Quoted tokens may be empty; the closing quote is consumed if present.
    fn token(&mut self) -> Option<String> {
        self.scanner.skip_while_in(&SEPARATORS);

        match self.scanner.peek()? {
            quote @ ('"' | '\'') => {
                self.scanner.next_char();
                let token = self.scanner.scan_until(&[quote]);
                self.scanner.next_char();
                Some(token)
            }
            _ => Some(self.scanner.scan_until(&WORD_END)),
        }
    }

    fn colon_follows(&mut self) -> bool {
        self.scanner.peek() == Some(':')
    }
}

/// Parse a search string into a conjunction of clauses
pub fn parse(input: &str) -> Query {
    let mut tokens = QueryScanner::new(input);
    let mut clauses = Vec::new();

    while let Some(token) = tokens.token() {
        if token.is_empty() {
            continue;
        }

        let keyword = token.to_lowercase();
        let typed = match keyword.as_str() {
            "tag" | "ingr" if tokens.colon_follows() => Some(keyword),
            _ => None,
        };

        let Some(keyword) = typed else {
            clauses.push(Query::Generic(token));
            continue;
        };

        // `tag:` with nothing usable after it contributes no clause
        match tokens.token() {
            Some(term) if !term.is_empty() => clauses.push(if keyword == "tag" {
                Query::Tag(term)
            } else {
                Query::Ingredient(term)
            }),
            _ => {}
        }
    }

    Query::All(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clauses(input: &str) -> Vec<Query> {
        match parse(input) {
            Query::All(clauses) => clauses,
            other => panic!("expected a conjunction, got {other}"),
        }
    }

    #[test]
    fn test_typed_and_generic_clauses() {
        assert_eq!(
            clauses("tag:spicy ingr:garlic chili"),
            vec![
                Query::Tag("spicy".to_string()),
                Query::Ingredient("garlic".to_string()),
                Query::Generic("chili".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            clauses("TAG:vegan Ingr:tofu"),
            vec![
                Query::Tag("vegan".to_string()),
                Query::Ingredient("tofu".to_string()),
            ]
        );
    }

    #[test]
    fn test_keyword_without_colon_is_generic() {
        assert_eq!(
            clauses("tag spicy"),
            vec![
                Query::Generic("tag".to_string()),
                Query::Generic("spicy".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_terms() {
        assert_eq!(
            clauses(r#"ingr:"red onion" 'sweet and sour' "say \"cheese\"""#),
            vec![
                Query::Ingredient("red onion".to_string()),
                Query::Generic("sweet and sour".to_string()),
                Query::Generic("say \"cheese\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_reads_to_end() {
        assert_eq!(
            clauses("soup \"tomato bas"),
            vec![
                Query::Generic("soup".to_string()),
                Query::Generic("tomato bas".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        assert_eq!(
            clauses(r#""" soup '' tag:"""#),
            vec![Query::Generic("soup".to_string())]
        );
    }

    #[test]
    fn test_separators_only() {
        assert!(clauses("").is_empty());
        assert!(clauses(" : :: ").is_empty());
    }

    #[test]
    fn test_term_may_follow_spaces() {
        assert_eq!(clauses("tag: quick"), vec![Query::Tag("quick".to_string())]);
    }
}
