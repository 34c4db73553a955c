//! Savings goals and their progress indicators.

mod core;
mod endpoints;
mod progress;

#[cfg(test)]
pub(crate) use core::create_goal_at;
pub use core::{
    GoalRequest, NewSavingsGoal, SavingsGoal, add_funds, create_goal, create_goal_table,
    delete_goal, get_goal, list_goals, update_goal,
};
pub use endpoints::{
    add_funds_endpoint, create_goal_endpoint, delete_goal_endpoint, get_goal_endpoint,
    list_goals_endpoint, update_goal_endpoint,
};
pub use progress::{GoalView, days_remaining, is_on_track, progress_percentage};
