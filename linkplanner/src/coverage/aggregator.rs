//! Union of per-transmitter coverage sets.

use super::set::CoverageSet;

/// Merges coverage sets into one view, folding in the order given.
///
/// A building new to the union is copied verbatim. A building already present
/// has its status merged with [`CoverageStatus::combine`] and takes the
/// footprint of the later set. Because the footprint follows the later set,
/// the input order is observable; callers pass sets in the order their
/// transmitters were supplied.
///
/// [`CoverageStatus::combine`]: super::CoverageStatus::combine
pub fn union<'a, I>(sets: I) -> CoverageSet
where
    I: IntoIterator<Item = &'a CoverageSet>,
{
    let mut merged = CoverageSet::new();
    for set in sets {
        for (key, record) in set.iter() {
            match merged.record_mut(key) {
                None => merged.insert_record(key.clone(), record.clone()),
                Some(existing) => {
                    existing.status = existing.status.combine(record.status);
                    existing.footprint = record.footprint.clone();
                }
            }
        }
    }
    merged
}
