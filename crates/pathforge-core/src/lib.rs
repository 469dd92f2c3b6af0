//! Validation of test suites against symbolic path analysis, and the
//! hybrid generator that merges searched and externally written tests.

pub mod error;
pub mod extract;
pub mod hybrid;
pub mod validator;

pub use error::CoreError;
pub use hybrid::HybridTestGenerator;
pub use validator::{HybridValidator, TestValidator, ValidationReport};
