//! The fixed set of expense categories.

use std::fmt::Display;

use serde::{Serialize, Serializer};

use crate::Error;

/// What an expense was spent on.
///
/// Category codes read back from the database that are not one of the known
/// categories are kept as [Category::Unmapped] so that aggregation never
/// fails on unexpected data. Such codes are their own label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Category {
    /// Groceries, restaurants and takeaways.
    Food,
    /// Rent, mortgage and other housing costs.
    Rent,
    /// Power, water, internet, etc.
    Utilities,
    /// Public transport, fuel, flights.
    Travel,
    /// Movies, games, concerts.
    Entertainment,
    /// Doctors, medicine, the gym.
    Health,
    /// Clothes, gadgets and other purchases.
    Shopping,
    /// Courses, books and tuition.
    Education,
    /// Money moved into savings.
    Savings,
    /// Anything else.
    #[default]
    Other,
    /// A category code that is not part of the known set.
    Unmapped(String),
}

impl Category {
    /// All the categories that can be chosen for a new expense.
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Rent,
        Category::Utilities,
        Category::Travel,
        Category::Entertainment,
        Category::Health,
        Category::Shopping,
        Category::Education,
        Category::Savings,
        Category::Other,
    ];

    /// The short code used for storage and in requests, e.g. "food".
    pub fn code(&self) -> &str {
        match self {
            Category::Food => "food",
            Category::Rent => "rent",
            Category::Utilities => "utilities",
            Category::Travel => "travel",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Shopping => "shopping",
            Category::Education => "education",
            Category::Savings => "savings",
            Category::Other => "other",
            Category::Unmapped(code) => code,
        }
    }

    /// The human-readable name of the category, e.g. "Food & Dining".
    pub fn label(&self) -> &str {
        match self {
            Category::Food => "Food & Dining",
            Category::Rent => "Rent & Housing",
            Category::Utilities => "Utilities",
            Category::Travel => "Travel & Transport",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health & Fitness",
            Category::Shopping => "Shopping",
            Category::Education => "Education",
            Category::Savings => "Savings Transfer",
            Category::Other => "Other",
            Category::Unmapped(code) => code,
        }
    }

    /// Map a stored category code to a category, keeping unknown codes as
    /// [Category::Unmapped].
    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.code() == code)
            .unwrap_or_else(|| Category::Unmapped(code.to_owned()))
    }

    /// Parse a category code from a request.
    ///
    /// # Errors
    /// Returns an [Error::InvalidField] if `code` is not one of the known categories.
    pub fn parse(code: &str) -> Result<Self, Error> {
        match Self::from_code(code) {
            Category::Unmapped(code) => Err(Error::InvalidField {
                field: "category",
                message: format!("\"{code}\" is not a valid choice."),
            }),
            category => Ok(category),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}
