/// One text segment recognized by the speech model.
///
/// Times are the model's own, relative to the start of the clip it was given.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }

    /// Segment carrying only text, for recognizers without timing output.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(text, 0.0, 0.0)
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}
