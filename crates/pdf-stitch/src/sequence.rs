//! Ordering of loaded images

use crate::record::ImageRecord;
use crate::types::SortKey;

/// Sort records ascending by `key`.
///
/// The sort is stable: records with equal keys keep their relative order,
/// so sorting an already sorted collection is a no-op.
pub fn sort_records(records: &mut [ImageRecord], key: SortKey) {
    match key {
        SortKey::Name => records.sort_by(|a, b| a.name().cmp(b.name())),
        SortKey::CreationTime => records.sort_by_key(|r| r.created_at()),
        SortKey::ModificationTime => records.sort_by_key(|r| r.modified_at()),
    }
}

/// Return a sorted copy of `records`
pub fn sorted(records: &[ImageRecord], key: SortKey) -> Vec<ImageRecord> {
    let mut out = records.to_vec();
    sort_records(&mut out, key);
    out
}
