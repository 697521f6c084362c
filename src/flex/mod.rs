pub mod context;
pub mod descriptor;
pub mod error;
pub mod paths;
pub mod planner;
pub mod serializer;
pub mod validate;
pub mod wildcard;

pub use context::{NestedSettings, PlanningContext};
pub use descriptor::{DescriptorRef, DescriptorRegistry, NestedRelation, ResourceDescriptor};
pub use error::FlexError;
pub use paths::{directive_list_from_value, split_levels, tokenize};
pub use serializer::FlexSerializer;
pub use validate::validate_include_paths;
pub use wildcard::{contains_wildcard, expand_wildcard};
