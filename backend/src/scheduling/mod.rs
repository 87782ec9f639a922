//! Lesson date scheduling.
//!
//! Three pure, synchronous building blocks used by the generation and
//! holiday flows:
//!
//! - [`working_days`]: which calendar days of a window carry lessons
//! - [`redistribution`]: cascading lessons forward past a holiday
//! - [`load_balancer`]: spreading N generated lessons over M working days
//!
//! None of these touch storage. Callers fetch rows, compute here, and apply
//! the result through the repository in one atomic step.

pub mod load_balancer;
pub mod redistribution;
pub mod working_days;

pub use load_balancer::{distribute, Distribution};
pub use redistribution::{next_working_day, push_to_next_working_day, redistribute_for_holiday};
pub use working_days::{compute_working_days, SchedulingWindow};
