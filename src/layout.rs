use crate::models::{OverlapGroup, SlotPlacement, TimeInterval};

/// Partition the loaded appointments into clusters that share time and
/// assign each member a side-by-side column.
///
/// Clustering is a single pass: each not-yet-assigned appointment seeds a
/// group, and every remaining unassigned appointment that overlaps the seed
/// joins it. Later members are not re-tested against each other, so a chain
/// where only the middle appointment touches both ends stays split exactly
/// the way the week view has always drawn it. Groups of one need no columns
/// and are omitted from the result.
///
/// Within a group, members sort by ascending start (ties keep collection
/// order); `slot_index` is the sorted position and `slot_count` the group
/// size.
pub fn group_overlaps(intervals: &[TimeInterval]) -> Vec<OverlapGroup> {
    let mut assigned = vec![false; intervals.len()];
    let mut groups = Vec::new();

    for i in 0..intervals.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        let seed = &intervals[i];
        let mut members = vec![seed.clone()];
        for j in (i + 1)..intervals.len() {
            if assigned[j] || !seed.overlaps(&intervals[j]) {
                continue;
            }
            assigned[j] = true;
            members.push(intervals[j].clone());
        }

        if members.len() < 2 {
            continue;
        }

        // stable sort keeps collection order for equal starts
        members.sort_by_key(|iv| iv.start);
        let slot_count = members.len();
        let members = members
            .into_iter()
            .enumerate()
            .map(|(slot_index, interval)| SlotPlacement {
                interval,
                slot_index,
                slot_count,
            })
            .collect();

        groups.push(OverlapGroup { members });
    }

    groups
}
