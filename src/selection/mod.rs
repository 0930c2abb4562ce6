pub mod budgeting;
pub mod density;
pub mod ranking;
pub mod reuse;

pub use budgeting::{apply_savings_budget, BudgetResult};
pub use density::{select_density_threshold, Density, DensityThreshold};
pub use ranking::{InstanceSavings, SavingsRanker};
pub use reuse::{ReuseObject, ReuseSet};

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Density histogram has no entries")]
    EmptyHistogram,
}
