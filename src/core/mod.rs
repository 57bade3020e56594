//! Core functionality for cluster operations
//!
//! Contains the kubectl interface, the load generator, and the
//! bring-up/teardown driver.

pub mod bringup;
pub mod kubectl;
pub mod load;

pub use bringup::BringUp;
pub use kubectl::Kubectl;
pub use load::LoadGenerator;
