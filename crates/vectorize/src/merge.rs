use std::collections::HashSet;

use tracing::info;

use crate::types::{DetectedLot, LotCollection};

/// Combine per-tile results into one collection, dropping duplicate
/// detections from overlapping tile borders and assigning final ids.
///
/// Deduplication is an exact match on the centroid coordinate pair: cheap,
/// and sufficient for a lot detected redundantly by two tiles covering the
/// same ground. A lot straddling a tile boundary and traced as two slightly
/// different polygons has two distinct centroids and is NOT merged; that is
/// a known limitation of this heuristic.
///
/// `lot_id` is sequential position in the surviving sequence and carries no
/// meaning beyond uniqueness within one run. Empty input yields an empty
/// collection.
pub fn merge_tiles(per_tile_results: Vec<Vec<DetectedLot>>) -> LotCollection {
    let input_count: usize = per_tile_results.iter().map(Vec::len).sum();

    let mut seen: HashSet<(u64, u64)> = HashSet::new();
    let mut lots: Vec<DetectedLot> = Vec::with_capacity(input_count);

    for lot in per_tile_results.into_iter().flatten() {
        let key = (lot.center_lon.to_bits(), lot.center_lat.to_bits());
        if seen.insert(key) {
            lots.push(lot);
        }
    }

    for (index, lot) in lots.iter_mut().enumerate() {
        lot.lot_id = index as u64;
    }

    info!(
        merged = lots.len(),
        duplicates = input_count - lots.len(),
        "merged per-tile results"
    );
    LotCollection { lots }
}
