// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Module names, stage names, and the bounded deploy concurrency.

mod concurrency;
mod module_name;
mod stage_name;

pub use concurrency::{Concurrency, ConcurrencyError};
pub use module_name::{ModuleName, ModuleNameError};
pub use stage_name::{StageName, StageNameError};
