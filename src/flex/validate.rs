use std::sync::Arc;

use super::descriptor::{DescriptorRegistry, ResourceDescriptor};
use super::error::FlexError;

/// Opt-in, user-facing validation of `include` paths against the descriptor
/// graph, run before any planning work so a bad request never produces a
/// partial document.
///
/// The planner itself silently skips undeclared candidates; endpoints that
/// want a hard client error call this first. The first offending segment is
/// reported together with the full dotted path.
pub fn validate_include_paths(
    registry: &DescriptorRegistry,
    descriptor: &Arc<ResourceDescriptor>,
    paths: &[String],
) -> Result<(), FlexError> {
    for path in paths {
        validate_path(registry, descriptor, path.split('.'), path)?;
    }
    Ok(())
}

fn validate_path<'a>(
    registry: &DescriptorRegistry,
    descriptor: &Arc<ResourceDescriptor>,
    mut segments: impl Iterator<Item = &'a str>,
    full_path: &str,
) -> Result<(), FlexError> {
    let Some(segment) = segments.next() else {
        return Ok(());
    };

    if !descriptor.has_relations() {
        return Err(FlexError::IncludesNotSupported);
    }

    let relation = descriptor.relation_for(segment).ok_or_else(|| {
        FlexError::UnsupportedInclude {
            segment: segment.to_string(),
            path: full_path.to_string(),
        }
    })?;

    let child = registry.resolve(&relation.target)?;
    validate_path(registry, &child, segments, full_path)
}
