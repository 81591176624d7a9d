//! Custom Axum extractors.

pub mod operator;

#[allow(unused_imports)] // Re-exports for downstream use
pub use operator::{OperatorIdentity, OPERATOR_ID_HEADER, OPERATOR_NAME_HEADER};
