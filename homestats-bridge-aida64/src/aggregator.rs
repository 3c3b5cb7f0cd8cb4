//! Folding of classified readings into published sensors.

use homestats_common::Sensor;

use crate::classifier::PatternGroup;

/// Build the derived sensors of one cycle.
///
/// Emits `{prefix}max` and `{prefix}min` for each group in declaration order,
/// then `{disk_prefix}1`, `{disk_prefix}2`, ... for the disk temperatures in
/// encounter order.
///
/// A group that collected nothing this cycle is left out with a warning. Its
/// pair is missing from this payload only; the other groups and the disks are
/// still published. No placeholder value is emitted for it.
pub fn aggregate(disk_temps: &[f64], disk_prefix: &str, groups: &[PatternGroup]) -> Vec<Sensor> {
    let mut sensors = Vec::with_capacity(groups.len() * 2 + disk_temps.len());

    for group in groups {
        let values = group.collected();
        if values.is_empty() {
            tracing::warn!(
                pattern = %group.pattern(),
                "Pattern group collected no readings, skipping its max/min"
            );
            continue;
        }

        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        sensors.push(Sensor::new(group.max_id(), max));
        sensors.push(Sensor::new(group.min_id(), min));
    }

    sensors.extend(
        disk_temps
            .iter()
            .enumerate()
            .map(|(i, &temp)| Sensor::new(format!("{}{}", disk_prefix, i + 1), temp)),
    );

    sensors
}
