//! Species categories and the configurable category set.

use serde::{Deserialize, Serialize};

/// Species category assigned to an observation.
///
/// Categories form a closed set; the classifier never produces a value
/// outside it. `Other` is the fallback for failed or ambiguous
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Birds,
    Mammals,
    Plants,
    Amphibians,
    Reptiles,
    Insects,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Birds => "birds",
            Self::Mammals => "mammals",
            Self::Plants => "plants",
            Self::Amphibians => "amphibians",
            Self::Reptiles => "reptiles",
            Self::Insects => "insects",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "birds" => Some(Self::Birds),
            "mammals" => Some(Self::Mammals),
            "plants" => Some(Self::Plants),
            "amphibians" => Some(Self::Amphibians),
            "reptiles" => Some(Self::Reptiles),
            "insects" => Some(Self::Insects),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which category set is active.
///
/// Deployments have used two variants of the closed set; the mode makes
/// both reproducible. The classifier only accepts labels belonging to the
/// active mode and falls back to `other` for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMode {
    /// Four-way set: birds, mammals, plants, other.
    Basic,
    /// Seven-way set: adds amphibians, reptiles and insects.
    #[default]
    Extended,
}

const BASIC_CATEGORIES: &[Category] = &[
    Category::Birds,
    Category::Mammals,
    Category::Plants,
    Category::Other,
];

const EXTENDED_CATEGORIES: &[Category] = &[
    Category::Birds,
    Category::Mammals,
    Category::Plants,
    Category::Amphibians,
    Category::Reptiles,
    Category::Insects,
    Category::Other,
];

impl CategoryMode {
    /// All categories belonging to this mode, in display order.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Self::Basic => BASIC_CATEGORIES,
            Self::Extended => EXTENDED_CATEGORIES,
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories().contains(&category)
    }

    /// Comma-separated label list for prompts and error messages.
    pub fn labels(&self) -> String {
        self.categories()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parse a label, accepting only categories in this mode.
    pub fn parse(&self, label: &str) -> Option<Category> {
        Category::from_str(label).filter(|c| self.contains(*c))
    }
}
