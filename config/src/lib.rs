pub mod constants;
pub mod env;
pub mod node;

#[cfg(test)]
mod test_helpers;

pub use env::ScheduleProfile;
pub use node::{install, ScheduleOverride};
