// Recipe documents: parsing, quantities and the step dependency graph

pub mod graph;
pub mod legacy;
pub mod lexer;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod quantity;
pub mod similarity;

// Re-exports
pub use metadata::{normalize_id, RecipeMetadata, SCHEMA_VERSION};
pub use model::{Recipe, Section, Step, StepId};
pub use parser::{parse, parse_str};
pub use quantity::{Ingredient, IngredientTotals, InstructionPart, Scalar};
pub use similarity::close_matches;
