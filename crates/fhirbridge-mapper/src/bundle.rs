//! Generic searchset bundle assembly.
//!
//! Both resource types wrap their collections the same way; the mapper
//! plugs in via [`BundleEntryMapper`] and everything else is shared.

use fhirbridge_core::{EhrRecord, RequestContext, generate_id};
use fhirbridge_model::{Bundle, BundleEntry, BundleLink, BundleResponse, Meta, Resource, SEARCHSET};

/// Maps one collection element into a bundle entry, or rejects it.
pub trait BundleEntryMapper {
    /// The resource and its entry location for a conforming record,
    /// `None` for records of another variant.
    fn entry_for(record: &EhrRecord, ctx: &RequestContext) -> Option<(Resource, String)>;
}

/// Assemble a searchset bundle from a record collection.
///
/// Non-conforming elements are skipped, not rejected, and do not count
/// toward `total`.
pub fn build_bundle<M: BundleEntryMapper>(records: &[EhrRecord], ctx: &RequestContext) -> Bundle {
    let bundle_id = generate_id();
    let mut entries = Vec::new();
    for record in records {
        let Some((resource, location)) = M::entry_for(record, ctx) else {
            tracing::debug!(id = record.id(), "skipping non-conforming record in bundle");
            continue;
        };
        entries.push(BundleEntry {
            full_url: format!("{}/{}", ctx.host, bundle_id),
            resource,
            response: BundleResponse {
                location,
                last_modified: ctx.now,
            },
        });
    }

    Bundle {
        id: bundle_id,
        meta: Meta {
            last_updated: ctx.now,
        },
        bundle_type: SEARCHSET.into(),
        total: entries.len() as u32,
        link: vec![BundleLink::self_link(&ctx.host)],
        entry: entries,
    }
}
