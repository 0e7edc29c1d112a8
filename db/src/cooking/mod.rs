pub mod areas;
pub mod attachments;
pub mod categories;
pub mod ingredients;
pub mod recipe;
pub mod recipe_ingredients;
pub mod search;
pub mod steps;
pub mod votes;


pub use areas::Area;
pub use attachments::{Attachment, AttachmentMeta, NewAttachment};
pub use categories::Category;
pub use ingredients::Ingredient;
pub use recipe::{NamedRef, NewRecipe, Recipe, RecipeChanges, RecipeDetails, RecipeSummary};
pub use recipe_ingredients::{IngredientRef, NewRecipeIngredient, RecipeIngredient};
pub use search::{like_pattern, RecipeFilter, RecipePage};
pub use steps::{NewStep, RecipeStep};
pub use votes::Vote;
