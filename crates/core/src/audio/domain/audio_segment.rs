use std::ops::Range;

/// Decoded mono PCM audio normalized to [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Sample index for a millisecond offset, rounded to the nearest sample.
    pub fn sample_index_at_ms(&self, time_ms: u64) -> usize {
        (time_ms as f64 / 1000.0 * self.sample_rate as f64).round() as usize
    }

    /// Half-open sample range covering `[start_ms, end_ms)`, clamped to the buffer.
    ///
    /// Inverted bounds collapse to an empty range at the clamped start.
    pub fn sample_range_ms(&self, start_ms: u64, end_ms: u64) -> Range<usize> {
        let len = self.samples.len();
        let start = self.sample_index_at_ms(start_ms).min(len);
        let end = self.sample_index_at_ms(end_ms).min(len).max(start);
        start..end
    }

    /// Copies the samples between two millisecond offsets into a new segment.
    pub fn clip_ms(&self, start_ms: u64, end_ms: u64) -> AudioSegment {
        let range = self.sample_range_ms(start_ms, end_ms);
        AudioSegment::new(self.samples[range].to_vec(), self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn ramp(len: usize, sample_rate: u32) -> AudioSegment {
        AudioSegment::new((0..len).map(|i| i as f32).collect(), sample_rate)
    }

    #[test]
    fn test_new_creates_segment_with_correct_fields() {
        let samples = vec![0.0f32; 16000];
        let seg = AudioSegment::new(samples.clone(), 16000);
        assert_eq!(seg.samples(), &samples[..]);
        assert_eq!(seg.sample_rate(), 16000);
        assert_eq!(seg.len(), 16000);
        assert!(!seg.is_empty());
    }

    #[test]
    fn test_duration() {
        let seg = AudioSegment::new(vec![0.0; 24000], 16000);
        assert_relative_eq!(seg.duration(), 1.5, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(500, 8000)]
    #[case(1500, 24000)]
    #[case(1, 16)]
    fn test_sample_index_at_ms(#[case] ms: u64, #[case] expected: usize) {
        let seg = AudioSegment::new(Vec::new(), 16000);
        assert_eq!(seg.sample_index_at_ms(ms), expected);
    }

    #[test]
    fn test_sample_index_rounds_to_nearest() {
        // 1 ms at 22050 Hz is 22.05 samples, 3 ms is 66.15, 7 ms at 44100 Hz is 308.7
        let seg = AudioSegment::new(Vec::new(), 22050);
        assert_eq!(seg.sample_index_at_ms(1), 22);
        assert_eq!(seg.sample_index_at_ms(3), 66);
        let seg = AudioSegment::new(Vec::new(), 44100);
        assert_eq!(seg.sample_index_at_ms(7), 309);
    }

    #[test]
    fn test_clip_half_open_range() {
        let seg = ramp(32000, 16000);
        let clip = seg.clip_ms(500, 1500);
        assert_eq!(clip.len(), 16000);
        assert_eq!(clip.samples()[0], 8000.0);
        assert_eq!(clip.samples()[clip.len() - 1], 23999.0);
        assert_eq!(clip.sample_rate(), 16000);
    }

    #[test]
    fn test_clip_past_end_is_clamped() {
        let seg = ramp(16000, 16000);
        let clip = seg.clip_ms(500, 5000);
        assert_eq!(clip.len(), 8000);

        let clip = seg.clip_ms(2000, 3000);
        assert!(clip.is_empty());
    }

    #[rstest]
    #[case(1000, 1000)]
    #[case(1500, 1000)]
    fn test_clip_zero_length_or_inverted_is_empty(#[case] start: u64, #[case] end: u64) {
        let seg = ramp(32000, 16000);
        assert!(seg.clip_ms(start, end).is_empty());
        assert!(seg.sample_range_ms(start, end).is_empty());
    }
}
