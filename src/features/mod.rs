//! Feature catalog: validation rules, parameter templates and instances, and the
//! feature/component tree built from the catalog.

pub mod catalog;
pub mod component;
pub mod expr;
pub mod factory;
pub mod feature;
pub mod parameter;
pub mod validation;

pub use catalog::{legacy_features, parse_catalog, JsonComponent, JsonFeature, JsonParameter};
pub use component::{Component, ComponentTemplate};
pub use feature::{Feature, FeatureTemplate};
pub use parameter::{Parameter, ParameterTemplate, Scalar, TemplateKind};
pub use validation::Validation;
