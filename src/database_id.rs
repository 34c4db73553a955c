//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The database ID of an income record.
pub type IncomeId = DatabaseId;
/// The database ID of an expense record.
pub type ExpenseId = DatabaseId;
/// The database ID of a savings goal.
pub type GoalId = DatabaseId;
