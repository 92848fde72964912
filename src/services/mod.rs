pub mod payments;
pub mod scheduling;
