//! Progress indicators for savings goals.
//!
//! None of these values are stored. They are recomputed from the goal and a
//! reference date every time a goal is shown.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use time::Date;

use crate::goal::SavingsGoal;

const ONE_HUNDRED: Decimal = dec!(100);

/// How much of the target has been saved, as a percentage from 0 to 100.
///
/// Saving more than the target still gives 100. A goal with a target of zero
/// or less has made no progress.
pub fn progress_percentage(current_amount: Decimal, target_amount: Decimal) -> Decimal {
    if target_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    current_amount
        .checked_div(target_amount)
        .and_then(|fraction| fraction.checked_mul(ONE_HUNDRED))
        .map_or(ONE_HUNDRED, |percentage| percentage.min(ONE_HUNDRED))
}

/// Whether the amount saved keeps pace with a straight line from nothing on
/// `created_on` to the full target on `deadline`.
///
/// The expected fraction stops growing at the deadline. If the deadline is
/// not after the creation date, only a fully funded goal is on track. A
/// `today` before `created_on` gives a negative expected amount, so the goal
/// is on track.
pub fn is_on_track(
    current_amount: Decimal,
    target_amount: Decimal,
    created_on: Date,
    deadline: Date,
    today: Date,
) -> bool {
    let total_days = (deadline - created_on).whole_days();
    let elapsed_days = (today - created_on).whole_days();

    if total_days <= 0 || elapsed_days >= total_days {
        return current_amount >= target_amount;
    }

    // current / target >= elapsed / total, without dividing.
    current_amount * Decimal::from(total_days) >= target_amount * Decimal::from(elapsed_days)
}

/// The number of days from `today` until `deadline`, negative once the deadline has passed.
pub fn days_remaining(deadline: Date, today: Date) -> i64 {
    (deadline - today).whole_days()
}

/// A savings goal together with its progress indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalView {
    /// The stored goal.
    #[serde(flatten)]
    pub goal: SavingsGoal,
    /// See [progress_percentage].
    #[serde(with = "rust_decimal::serde::float")]
    pub progress_percentage: Decimal,
    /// See [is_on_track].
    pub is_on_track: bool,
    /// See [days_remaining].
    pub days_remaining: i64,
}

impl GoalView {
    /// Compute the progress of `goal` as of `today`.
    pub fn new(goal: SavingsGoal, today: Date) -> Self {
        let progress_percentage = progress_percentage(goal.current_amount, goal.target_amount);
        let is_on_track = is_on_track(
            goal.current_amount,
            goal.target_amount,
            goal.created_on(),
            goal.deadline,
            today,
        );
        let days_remaining = days_remaining(goal.deadline, today);

        Self {
            goal,
            progress_percentage,
            is_on_track,
            days_remaining,
        }
    }
}
