//! Domain Services
//!
//! Stateless evaluation over field definitions and answers.

pub mod condition;
pub mod scope_resolver;
pub mod section_organizer;
pub mod validator;

pub use condition::{evaluate, ConditionEvaluator};
pub use scope_resolver::{ResolvedFields, ScopeResolver, SubProcessFields, SubProcessGroup};
pub use section_organizer::{OrganizedSection, SectionKind, SectionOrganizer};
pub use validator::{validate_all, FieldValidator, FormValidation, ValidationIssue, ValidationResult};
