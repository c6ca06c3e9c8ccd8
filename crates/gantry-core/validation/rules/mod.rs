//! Built-in rules for GitHub Actions workflows.

pub mod action_version;
pub mod deprecated;
pub mod expression;
pub mod permissions;
pub mod runner_label;
pub mod schema;

pub use action_version::ActionVersionRule;
pub use deprecated::DeprecatedRule;
pub use expression::ExpressionRule;
pub use permissions::PermissionsRule;
pub use runner_label::RunnerLabelRule;
pub use schema::SchemaRule;
