// Ingredient amounts, serving scaling and merging
use crate::error::{LoadError, LoadResult};
use crate::recipe::lexer::split_words;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub amount_per_serving: Option<f64>,
}

impl Ingredient {
    pub fn new(serves: u32, name: impl Into<String>, amount: Option<f64>, unit: Option<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit,
            amount_per_serving: amount.map(|a| a / f64::from(serves)),
        }
    }

    /// Parse the remainder of a `- ` line: `[amount] [unit] name...`
    pub fn parse(line: &str, serves: u32) -> LoadResult<Self> {
        let parts = split_words(line)?;

        match parts.as_slice() {
            [] => Err(LoadError::new(format!(
                "Empty ingredient line '{}'",
                line.trim_end()
            ))),
            [name] => Ok(Self::new(serves, name.as_str(), None, None)),
            [amount, name] => {
                let amount = parse_amount(amount, line, &parts)?;
                Ok(Self::new(serves, name.as_str(), Some(amount), None))
            }
            [amount, unit, name @ ..] => {
                let amount = parse_amount(amount, line, &parts)?;
                Ok(Self::new(
                    serves,
                    name.join(" "),
                    Some(amount),
                    Some(unit.clone()),
                ))
            }
        }
    }
}

fn parse_amount(field: &str, line: &str, parts: &[String]) -> LoadResult<f64> {
    field.parse::<f64>().map_err(|e| {
        LoadError::with_cause(
            format!(
                "Ingredient amount '{}' is not a number in line '{}' (parsed as {:?})",
                field,
                line.trim_end(),
                parts
            ),
            e,
        )
    })
}

/// A number inside instruction text that scales with the serving count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scalar {
    pub amount: f64,
    pub amount_per_serving: f64,
}

impl Scalar {
    pub fn new(amount: f64, serves: u32) -> Self {
        Self {
            amount,
            amount_per_serving: amount / f64::from(serves),
        }
    }

    /// Amount for an arbitrary number of servings
    pub fn scaled(&self, servings: f64) -> f64 {
        self.amount_per_serving * servings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InstructionPart {
    Text { value: String },
    Scalar(Scalar),
}

impl InstructionPart {
    /// Turn one whitespace-delimited instruction token into a part.
    ///
    /// Tokens of the exact form `{number}` become scalars.
    pub fn from_token(token: &str, serves: u32) -> LoadResult<Self> {
        match token
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(body) => {
                let amount = body.trim().parse::<f64>().map_err(|e| {
                    LoadError::with_cause(format!("Scalar '{token}' is not a number"), e)
                })?;
                Ok(InstructionPart::Scalar(Scalar::new(amount, serves)))
            }
            None => Ok(InstructionPart::Text {
                value: token.to_string(),
            }),
        }
    }
}

/// Split an instruction line into text and scalar parts
pub fn split_instruction(line: &str, serves: u32) -> LoadResult<Vec<InstructionPart>> {
    line.split_whitespace()
        .map(|token| InstructionPart::from_token(token, serves))
        .collect()
}

/// Recipe-level ingredient list built by merging every step's ingredients.
///
/// Entries are keyed by exact (name, unit). Different units of the same
/// ingredient stay separate entries; there is no unit conversion.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct IngredientTotals {
    entries: Vec<Ingredient>,
}

impl IngredientTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one ingredient occurrence into the totals.
    ///
    /// New entries are rebuilt against `serves`. Quantified entries go before
    /// the first unquantified one; unquantified entries go last.
    pub fn merge(&mut self, new: &Ingredient, serves: u32) {
        let found = self
            .entries
            .iter()
            .position(|e| e.name == new.name && e.unit == new.unit);

        match found {
            Some(index) => {
                let existing = &mut self.entries[index];
                match (existing.amount, new.amount) {
                    (None, Some(_)) => {
                        let mut adopted = self.entries.remove(index);
                        adopted.amount = new.amount;
                        adopted.amount_per_serving = new.amount_per_serving;
                        self.insert_quantified(adopted);
                    }
                    (Some(old), Some(added)) => {
                        existing.amount = Some(old + added);
                        // summed independently so mixed serving bases do not drift
                        existing.amount_per_serving =
                            match (existing.amount_per_serving, new.amount_per_serving) {
                                (Some(a), Some(b)) => Some(a + b),
                                (a, b) => a.or(b),
                            };
                    }
                    _ => {}
                }
            }
            None => {
                let entry =
                    Ingredient::new(serves, new.name.clone(), new.amount, new.unit.clone());
                if entry.amount.is_some() {
                    self.insert_quantified(entry);
                } else {
                    self.entries.push(entry);
                }
            }
        }
    }

    fn insert_quantified(&mut self, entry: Ingredient) {
        let position = self
            .entries
            .iter()
            .position(|e| e.amount.is_none())
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ingredient> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Ingredient] {
        &self.entries
    }
}
