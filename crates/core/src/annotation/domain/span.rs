/// One annotated time interval on a tier.
///
/// Bounds are milliseconds from the start of the recording. Ordering of
/// `start_ms` and `end_ms` is not enforced here; consumers decide how to
/// treat inverted or empty spans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub start_ms: u64,
    pub end_ms: u64,
    pub label: String,
}

impl Span {
    pub fn new(start_ms: u64, end_ms: u64, label: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            label: label.into(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn is_empty(&self) -> bool {
        self.end_ms <= self.start_ms
    }

    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_secs(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }

    /// Same bounds, different text.
    pub fn relabel(&self, label: impl Into<String>) -> Self {
        Self::new(self.start_ms, self.end_ms, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_and_seconds() {
        let span = Span::new(1500, 2750, "spk1");
        assert_eq!(span.duration_ms(), 1250);
        assert_eq!(span.start_secs(), 1.5);
        assert_eq!(span.end_secs(), 2.75);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_inverted_span_is_empty() {
        let span = Span::new(2000, 1000, "");
        assert_eq!(span.duration_ms(), 0);
        assert!(span.is_empty());
        assert!(Span::new(1000, 1000, "").is_empty());
    }

    #[test]
    fn test_relabel_keeps_bounds() {
        let span = Span::new(1000, 2000, "speaker turn").relabel("hello");
        assert_eq!(span, Span::new(1000, 2000, "hello"));
    }
}
