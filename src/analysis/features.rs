//! Peak and zero-crossing detection on an averaged impulse waveform.
//!
//! Peaks follow the usual local-maximum-with-minimum-distance selection: every
//! strict local maximum (flat tops collapse to their middle sample) at or above
//! the height threshold is a candidate, then candidates are visited tallest
//! first and each kept peak suppresses its neighbours closer than the distance.
//!
//! Zero crossings use a simpler first-come rule: scanning left to right, a
//! candidate is accepted only if it is far enough from the last accepted one.
//! Accepted crossings that sit close together are then merged into one
//! representative index and converted to display units.
use log::debug;
use serde::Serialize;
use crate::analysis::error::AnalysisError;
use crate::analysis::loader::Waveform;
/// Detector constants. Defaults match the production impulse tester.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureParams {
    pub peak_height: f64,
    pub peak_distance: usize,
    pub max_peaks: usize,
    /// Leading samples skipped by both detectors (trigger transients).
    pub warm_up: usize,
    pub crossing_spacing: usize,
    pub crossing_group_window: usize,
    /// Sample index to display time unit; the recorder stores every other sample.
    pub display_scale: usize,
    pub max_crossings: usize,
}
impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            peak_height: 100.0,
            peak_distance: 20,
            max_peaks: 4,
            warm_up: 100,
            crossing_spacing: 10,
            crossing_group_window: 5,
            display_scale: 2,
            max_crossings: 6,
        }
    }
}
impl FeatureParams {
    /// Shortest waveform that can yield any feature.
    pub fn min_samples(&self) -> usize {
        self.warm_up + 1
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Peak {
    pub index: usize,
    pub amplitude: f64,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ZeroCrossing {
    /// Representative sample index (group average).
    pub index: usize,
    /// `index` in display units.
    pub position: usize,
}
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeatureSet {
    pub peaks: Vec<Peak>,
    pub zero_crossings: Vec<ZeroCrossing>,
}
impl FeatureSet {
    /// `(index, amplitude)` pairs for drawing peak markers over the waveform.
    pub fn peak_markers(&self) -> Vec<(usize, f64)> {
        self.peaks.iter().map(|p| (p.index, p.amplitude)).collect()
    }
    /// `(position, 0.0)` pairs for drawing crossing markers on the time axis.
    pub fn crossing_markers(&self) -> Vec<(usize, f64)> {
        self.zero_crossings.iter().map(|z| (z.position, 0.0)).collect()
    }
}
pub struct FeatureExtractor {
    params: FeatureParams,
}
impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureParams::default())
    }
}
impl FeatureExtractor {
    pub fn new(params: FeatureParams) -> Self {
        Self { params }
    }
    pub fn params(&self) -> &FeatureParams {
        &self.params
    }
    /// Like [`FeatureExtractor::extract`] but reports a too-short waveform.
    pub fn try_extract(&self, waveform: &Waveform) -> Result<FeatureSet, AnalysisError> {
        let required = self.params.min_samples();
        if waveform.len() < required {
            return Err(AnalysisError::InsufficientData {
                len: waveform.len(),
                required,
            });
        }
        let data = waveform.samples();
        let peaks = self
            .detect_peaks(data)
            .into_iter()
            .map(|index| Peak {
                index,
                amplitude: data[index],
            })
            .collect();
        let zero_crossings = self.detect_zero_crossings(data);
        Ok(FeatureSet {
            peaks,
            zero_crossings,
        })
    }
    /// Too-short waveforms yield an empty feature set.
    pub fn extract(&self, waveform: &Waveform) -> FeatureSet {
        match self.try_extract(waveform) {
            Ok(features) => features,
            Err(err) => {
                debug!("{err}; reporting no features");
                FeatureSet::default()
            }
        }
    }
    pub fn detect_peaks(&self, data: &[f64]) -> Vec<usize> {
        let candidates: Vec<usize> = local_maxima(data)
            .into_iter()
            .filter(|&i| i >= self.params.warm_up && data[i] >= self.params.peak_height)
            .collect();
        let mut peaks = select_by_distance(&candidates, data, self.params.peak_distance);
        peaks.truncate(self.params.max_peaks);
        peaks
    }
    pub fn detect_zero_crossings(&self, data: &[f64]) -> Vec<ZeroCrossing> {
        let accepted = crossing_candidates(data, self.params.warm_up, self.params.crossing_spacing);
        group_crossings(&accepted, self.params.crossing_group_window)
            .into_iter()
            .take(self.params.max_crossings)
            .map(|index| ZeroCrossing {
                index,
                position: index * self.params.display_scale,
            })
            .collect()
    }
}
/// Indices of strict local maxima; a flat top reports its middle sample
/// (rounded down).
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if data.len() < 3 {
        return maxima;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}
/// Keeps the tallest candidates so that no two survivors are closer than
/// `distance`. Equal heights favour the later index. Output stays ascending.
fn select_by_distance(candidates: &[usize], data: &[f64], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; candidates.len()];
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| data[candidates[a]].total_cmp(&data[candidates[b]]));
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let here = candidates[j];
        for k in (0..j).rev() {
            if here - candidates[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..candidates.len() {
            if candidates[k] - here >= distance {
                break;
            }
            keep[k] = false;
        }
    }
    candidates
        .iter()
        .zip(keep)
        .filter_map(|(&idx, kept)| kept.then_some(idx))
        .collect()
}
/// Left-to-right scan from `warm_up` for samples that are zero or whose sign
/// flips before the next sample, at least `spacing` after the last accepted one.
fn crossing_candidates(data: &[f64], warm_up: usize, spacing: usize) -> Vec<usize> {
    let mut accepted = Vec::new();
    let mut last: Option<usize> = None;
    for i in warm_up..data.len().saturating_sub(1) {
        let crosses = data[i] == 0.0 || data[i] * data[i + 1] < 0.0;
        if crosses && last.map_or(true, |prev| i - prev >= spacing) {
            accepted.push(i);
            last = Some(i);
        }
    }
    accepted
}
/// Merges runs of indices whose neighbours are at most `window` apart into
/// the truncated mean of the run. Input is expected ascending; out-of-order
/// neighbours are compared by distance.
pub fn group_crossings(indices: &[usize], window: usize) -> Vec<usize> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for &idx in indices {
        match groups.last_mut() {
            Some(group) if group.last().map_or(false, |&prev| idx.abs_diff(prev) <= window) => {
                group.push(idx)
            }
            _ => groups.push(vec![idx]),
        }
    }
    groups
        .iter()
        .map(|g| g.iter().sum::<usize>() / g.len())
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    /// 100 quiet samples, a pulse topping out at 150 on index 120, an undershoot
    /// to -150 on index 140 and a return to zero by index 160.
    fn single_pulse() -> Vec<f64> {
        let mut data = vec![0.0; 100];
        for i in 100..=120 {
            data.push(150.0 * (i - 99) as f64 / 21.0);
        }
        for i in 121..=140 {
            data.push(150.0 - 15.0 * (i - 120) as f64);
        }
        for i in 141..=160 {
            data.push(-150.0 + 7.5 * (i - 140) as f64);
        }
        data.resize(260, 0.0);
        data
    }
    fn random_waveform(rng: &mut StdRng) -> Waveform {
        let len = rng.gen_range(0..600);
        let mut level = 0i64;
        let samples = (0..len)
            .map(|_| {
                level = (level + rng.gen_range(-40..=40)).clamp(-300, 300);
                if rng.gen_bool(0.05) {
                    0.0
                } else {
                    level as f64
                }
            })
            .collect();
        Waveform::from_samples(samples)
    }
    #[test]
    fn single_pulse_has_expected_features() {
        let waveform = Waveform::from_samples(single_pulse());
        let features = FeatureExtractor::default().extract(&waveform);
        assert_eq!(features.peaks, vec![Peak { index: 120, amplitude: 150.0 }]);
        let first = features.zero_crossings[0];
        assert_eq!(first.index, 130);
        assert_eq!(first.position, 260);
        assert_eq!(features.crossing_markers()[0], (260, 0.0));
        assert_eq!(features.peak_markers(), vec![(120, 150.0)]);
    }
    #[test]
    fn short_waveform_has_no_features() {
        let extractor = FeatureExtractor::default();
        let mut data = single_pulse();
        data.truncate(100);
        data[50] = 500.0;
        let waveform = Waveform::from_samples(data);
        assert_eq!(extractor.extract(&waveform), FeatureSet::default());
        assert!(matches!(
            extractor.try_extract(&waveform),
            Err(AnalysisError::InsufficientData { len: 100, required: 101 })
        ));
    }
    #[test]
    fn closer_peaks_yield_to_the_taller_one() {
        let mut data = vec![0.0; 200];
        data[130] = 120.0;
        data[140] = 180.0;
        data[155] = 110.0;
        data[175] = 130.0;
        let peaks = FeatureExtractor::default().detect_peaks(&data);
        assert_eq!(peaks, vec![140, 175]);
    }
    #[test]
    fn flat_top_reports_middle_sample() {
        let mut data = vec![0.0; 150];
        for v in &mut data[110..114] {
            *v = 200.0;
        }
        assert_eq!(FeatureExtractor::default().detect_peaks(&data), vec![111]);
    }
    #[test]
    fn peaks_below_height_or_before_warm_up_are_ignored() {
        let mut data = vec![0.0; 200];
        data[50] = 400.0;
        data[150] = 99.0;
        assert!(FeatureExtractor::default().detect_peaks(&data).is_empty());
    }
    #[test]
    fn only_first_four_peaks_kept() {
        let mut data = vec![0.0; 400];
        for k in 0..6 {
            data[110 + k * 30] = 150.0 + k as f64;
        }
        let peaks = FeatureExtractor::default().detect_peaks(&data);
        assert_eq!(peaks, vec![110, 140, 170, 200]);
    }
    #[test]
    fn crossing_spacing_is_first_come() {
        let mut data = vec![1.0; 200];
        data[105] = -1.0;
        data[110] = -1.0; // flips at 109 and 110 land too close to 104
        data[120] = 0.0; // 119 only touches zero, 120 is zero itself
        let crossings = FeatureExtractor::default().detect_zero_crossings(&data);
        let indices: Vec<usize> = crossings.iter().map(|z| z.index).collect();
        assert_eq!(indices, vec![104, 120]);
    }
    #[test]
    fn crossings_capped_at_six() {
        let data: Vec<f64> = (0..400).map(|i| if (i / 15) % 2 == 0 { 5.0 } else { -5.0 }).collect();
        let crossings = FeatureExtractor::default().detect_zero_crossings(&data);
        assert_eq!(crossings.len(), 6);
        assert_eq!(crossings[0].position, 104 * 2);
    }
    #[test]
    fn close_crossings_merge_when_spacing_allows() {
        let params = FeatureParams {
            crossing_spacing: 1,
            ..FeatureParams::default()
        };
        let mut data = vec![3.0; 160];
        data[101] = -3.0;
        data[103] = 0.0;
        data[150] = -3.0;
        let crossings = FeatureExtractor::new(params).detect_zero_crossings(&data);
        // 100, 101, 103 merge to 101; 149 and 150 merge to 149.
        let positions: Vec<usize> = crossings.iter().map(|z| z.position).collect();
        assert_eq!(positions, vec![202, 298]);
    }
    #[test]
    fn grouping_truncates_and_is_idempotent_on_singletons() {
        assert_eq!(group_crossings(&[10, 13, 15, 40], 5), vec![12, 40]);
        assert_eq!(group_crossings(&[130], 5), vec![130]);
        assert_eq!(group_crossings(&group_crossings(&[130], 5), 5), vec![130]);
        assert!(group_crossings(&[], 5).is_empty());
        assert_eq!(group_crossings(&[10, 5], 5), vec![7]);
        assert_eq!(group_crossings(&[40, 10], 5), vec![40, 10]);
    }
    #[test]
    fn random_waveforms_respect_feature_invariants() {
        let mut rng = StdRng::seed_from_u64(0x1a2b);
        let extractor = FeatureExtractor::default();
        for _ in 0..300 {
            let waveform = random_waveform(&mut rng);
            let features = extractor.extract(&waveform);
            if waveform.len() < 101 {
                assert_eq!(features, FeatureSet::default());
                continue;
            }
            assert!(features.peaks.len() <= 4);
            for pair in features.peaks.windows(2) {
                assert!(pair[1].index >= pair[0].index + 20);
            }
            for peak in &features.peaks {
                assert!(peak.amplitude >= 100.0);
                assert_eq!(waveform.get(peak.index), Some(peak.amplitude));
            }
            assert!(features.zero_crossings.len() <= 6);
            for pair in features.zero_crossings.windows(2) {
                assert!(pair[1].position > pair[0].position);
            }
            assert!(features.zero_crossings.iter().all(|z| z.position % 2 == 0));
        }
    }
}
