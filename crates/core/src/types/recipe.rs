//! Recipe generator request and response types.

use serde::{Deserialize, Serialize};

/// Dietary constraint offered on the recipe form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dietary {
    #[default]
    None,
    Vegetarian,
    Vegan,
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    Keto,
    Paleo,
}

impl Dietary {
    /// Every option, in form order.
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::Vegetarian,
        Self::Vegan,
        Self::GlutenFree,
        Self::Keto,
        Self::Paleo,
    ];

    /// Label shown on the form and sent to the model.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Vegetarian => "Vegetarian",
            Self::Vegan => "Vegan",
            Self::GlutenFree => "Gluten-Free",
            Self::Keto => "Keto",
            Self::Paleo => "Paleo",
        }
    }

    /// Parse a form value. Blank or unknown values mean no constraint.
    #[must_use]
    pub fn from_form(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }
}

/// Inputs for a single recipe generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRequest {
    /// Free-text list of ingredients the cook has on hand.
    pub ingredients: String,
    /// Dietary constraint.
    pub dietary: Dietary,
}

impl RecipeRequest {
    /// Build a request from raw form input.
    ///
    /// Returns `None` when no ingredients were given; the generator is never
    /// called in that case.
    #[must_use]
    pub fn from_form(ingredients: &str, dietary: &str) -> Option<Self> {
        let ingredients = ingredients.trim();
        if ingredients.is_empty() {
            return None;
        }
        Some(Self {
            ingredients: ingredients.to_string(),
            dietary: Dietary::from_form(dietary),
        })
    }

    /// Prompt text sent to the model.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "You are a world-class chef specializing in spice blends. Create a creative and \
             delicious recipe that specifically features \"Zinga Ginger Powder\" as a key \
             ingredient.\n\n\
             The user has these available ingredients: \"{}\".\n\
             Dietary preferences/restrictions: \"{}\".\n\n\
             The recipe should be easy to follow but impressive.",
            self.ingredients,
            self.dietary.label()
        )
    }
}

/// A generated recipe, as validated by the model's response schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    #[serde(default)]
    pub servings: String,
    #[serde(default)]
    pub difficulty: String,
}
