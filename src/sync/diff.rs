//! One-directional diff between two fingerprint indices.

use crate::sync::index::FingerprintIndex;

/// Paths in `source` whose fingerprint differs from `target`'s.
///
/// Paths missing from `target` count as different. Paths that exist only in
/// `target` are never reported. The result is sorted so dispatch and logs
/// are stable between runs.
pub fn diff(source: &FingerprintIndex, target: &FingerprintIndex) -> Vec<String> {
    let mut changed: Vec<String> = source
        .iter()
        .filter(|(path, fingerprint)| target.get(path) != Some(*fingerprint))
        .map(|(path, _)| path.to_string())
        .collect();
    changed.sort();
    changed
}
