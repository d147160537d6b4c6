//! Training module - gradient accumulation, a gradient-descent driver and
//! periodic validation.

mod accumulator;
mod descent;
mod validation;

pub use accumulator::{AccumulationMode, GradientAccumulator};
pub use descent::{GradientDescent, TrainingHistory};
pub use validation::{Validation, VALIDATION_PREFIX};
