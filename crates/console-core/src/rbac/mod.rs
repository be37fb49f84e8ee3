//! RBAC policy codec.
//!
//! Converts between structured project RBAC policies and the compact text
//! form operators edit:
//!
//! ```text
//! resources=application{env:prod},deployment;actions=get,list
//!
//! resources=*;actions=*
//! ```

pub mod codec;
pub mod model;

pub use codec::{formalize_policies, parse_policies, validate_policies};
pub use model::{
    action_names, resource_type_names, Action, Policy, PolicyError, PolicyResource, ResourceType,
};
