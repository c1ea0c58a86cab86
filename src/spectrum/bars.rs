/// Reduce the raw frequency-bin magnitudes into one intensity per visual bar.
///
/// The bins split into `bar_count` contiguous groups of `floor(F / B)`; the
/// `F mod B` leftover high-frequency bins are dropped outright, never merged
/// into the last group. Each bar is `max(sound_min, mean(group) *
/// multiplier)`. Pure function; index i is the i-th bar left to right.
pub fn aggregate(values: &[u8], bar_count: usize, sound_min: f32, multiplier: f32) -> Vec<f32> {
    let per_bar = if bar_count > 0 {
        values.len() / bar_count
    } else {
        return Vec::new();
    };

    (0..bar_count)
        .map(|bar| {
            if per_bar == 0 {
                // fewer bins than bars: nothing to average, floor applies
                return sound_min;
            }
            let start = bar * per_bar;
            let sum: u32 = values[start..start + per_bar].iter().map(|&v| v as u32).sum();
            (sum as f32 / per_bar as f32 * multiplier).max(sound_min)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_group_means() {
        // groups of 5: means 30 and 80
        let bins = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        let result = aggregate(&bins, 2, 2.0, 1.0);
        assert_eq!(result, vec![30.0, 80.0]);
    }

    #[test]
    fn output_length_always_matches_bar_count() {
        for bar_count in [1usize, 2, 3, 7, 64, 200] {
            let bins: Vec<u8> = (0..128).map(|i| i as u8).collect();
            assert_eq!(aggregate(&bins, bar_count, 2.0, 1.0).len(), bar_count);
        }
    }

    #[test]
    fn remainder_bins_are_dropped() {
        // 10 bins over 3 bars: per_bar = 3, the last bin (255) never counts
        let bins = [30, 30, 30, 60, 60, 60, 90, 90, 90, 255];
        let result = aggregate(&bins, 3, 2.0, 1.0);
        assert_eq!(result, vec![30.0, 60.0, 90.0]);
    }

    #[test]
    fn sound_min_floors_quiet_bars() {
        let bins = [0u8; 10];
        let result = aggregate(&bins, 2, 2.0, 1.0);
        assert_eq!(result, vec![2.0, 2.0]);
    }

    #[test]
    fn multiplier_scales_before_the_floor() {
        let bins = [10u8; 4];
        let result = aggregate(&bins, 2, 2.0, 3.0);
        assert_eq!(result, vec![30.0, 30.0]);
    }

    #[test]
    fn fewer_bins_than_bars_floors_every_bar() {
        let bins = [200u8, 200];
        let result = aggregate(&bins, 5, 2.0, 1.0);
        assert_eq!(result, vec![2.0; 5]);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let bins: Vec<u8> = (0..256).map(|i| (i * 7 % 251) as u8).collect();
        let a = aggregate(&bins, 31, 2.0, 1.5);
        let b = aggregate(&bins, 31, 2.0, 1.5);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_bar_count_yields_empty() {
        assert!(aggregate(&[1, 2, 3], 0, 2.0, 1.0).is_empty());
    }
}
