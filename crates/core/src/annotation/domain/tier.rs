use super::span::Span;

/// A named channel of spans, usually one speaker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
    name: String,
    spans: Vec<Span>,
}

impl Tier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spans: Vec::new(),
        }
    }

    pub fn with_spans(name: impl Into<String>, spans: Vec<Span>) -> Self {
        Self {
            name: name.into(),
            spans,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spans in document order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn push(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
