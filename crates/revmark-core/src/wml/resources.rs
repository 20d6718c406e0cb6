//! Copying relationship targets along with content moved between documents.
//!
//! Content cloned out of a revised document still refers to that document's
//! relationship ids. Each such id is rewritten to a fresh id in the
//! destination table, and the referenced part (plus everything it refers to)
//! is copied under a part name that does not collide.

use super::context::{CompareContext, PartScope};
use super::document::{Resource, ResourceTable};
use crate::error::{CompareError, Result};
use crate::xml::namespaces::{O, R};
use crate::xml::xname::XAttribute;
use tracing::trace;

/// Where relocated content comes from.
#[derive(Debug, Clone, Copy)]
pub struct RelocationSource<'a> {
    pub source: usize,
    pub scope: PartScope,
    pub resources: &'a ResourceTable,
}

/// True for attributes whose value is a relationship id.
pub fn is_relationship_attribute(attr: &XAttribute) -> bool {
    attr.name.namespace.as_deref() == Some(R::NS) || attr.name == O::relid()
}

/// Rewrites every relationship attribute in `attrs` to point into `dest`.
pub fn relocate_attributes(
    attrs: &mut [XAttribute],
    from: &RelocationSource<'_>,
    dest: &mut ResourceTable,
    ctx: &mut CompareContext<'_>,
) -> Result<()> {
    for attr in attrs.iter_mut() {
        if !is_relationship_attribute(attr) || attr.value.is_empty() {
            continue;
        }
        attr.value = relocate_resource(&attr.value, from, dest, ctx)?;
    }
    Ok(())
}

/// Copies the resource `id` of `from` into `dest` and returns its new id.
/// Repeated requests for the same source id return the first result.
pub fn relocate_resource(
    id: &str,
    from: &RelocationSource<'_>,
    dest: &mut ResourceTable,
    ctx: &mut CompareContext<'_>,
) -> Result<String> {
    if let Some(cached) = ctx.cached_relocation(from.source, from.scope, id) {
        return Ok(cached.to_string());
    }

    let resource = from
        .resources
        .get(id)
        .ok_or_else(|| CompareError::resource(id, "not present in source relationships"))?;

    let new_id = ctx.fresh_rel_id(dest);
    let copy = copy_resource(resource, &new_id, ctx);
    trace!(
        source = from.source,
        old_id = id,
        new_id = new_id.as_str(),
        target = copy.target.as_str(),
        "relocated resource"
    );
    dest.insert(copy);
    ctx.remember_relocation(from.source, from.scope, id, &new_id);
    Ok(new_id)
}

fn copy_resource(resource: &Resource, new_id: &str, ctx: &mut CompareContext<'_>) -> Resource {
    let mut copy = resource.clone();
    copy.id = new_id.to_string();
    if copy.external {
        return copy;
    }

    if let (Some(part_name), Some(data)) = (&resource.part_name, &resource.data) {
        let (claimed, _) = ctx.claim_part_name(part_name, data);
        copy.target = claimed.clone();
        copy.part_name = Some(claimed);
    }

    let mut children = ResourceTable::new();
    for child in resource.children.iter() {
        children.insert(copy_resource(child, &child.id, ctx));
    }
    copy.children = children;
    copy
}
