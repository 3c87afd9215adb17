//! Static HDF5/NeXus attributes per path category.

use crate::grammar::{try_classify, PathKind};
use std::collections::BTreeMap;

/// Attribute mapping of a group or dataset.
pub type Attrs = BTreeMap<String, String>;

const ATTRIBUTES: &[(PathKind, &[(&str, &str)])] = &[
    (PathKind::Root, &[("NX_class", "NXroot")]),
    (PathKind::Scan, &[("NX_class", "NXentry")]),
    (PathKind::Instrument, &[("NX_class", "NXinstrument")]),
    (PathKind::Positioners, &[("NX_class", "NXcollection")]),
    (PathKind::Measurement, &[("NX_class", "NXcollection")]),
    (PathKind::InstrumentMca, &[("NX_class", "NXdetector")]),
    (PathKind::McaInfo, &[("NX_class", "NXdetector")]),
    (PathKind::McaData, &[("interpretation", "spectrum")]),
    (PathKind::McaDataLink, &[("interpretation", "spectrum")]),
];

/// Returns the attributes attached to a path category.
#[must_use]
pub fn attributes_of(kind: PathKind) -> Attrs {
    ATTRIBUTES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, pairs)| {
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the attributes of the object at `path`.
///
/// Links carry the attributes of their target. Unrecognized paths have
/// no attributes.
#[must_use]
pub fn attributes_for(path: &str) -> Attrs {
    let Some(found) = try_classify(path) else {
        return Attrs::new();
    };
    if let Some(target) = found.link_target() {
        if let Some(target) = try_classify(&target) {
            return attributes_of(target.kind);
        }
    }
    attributes_of(found.kind)
}
