use std::collections::HashMap;
use std::time::Instant;

use log::Level;

/// Logging context handed explicitly to every operation.
///
/// Decouples use cases from output mechanisms (console, log files, tests)
/// so each caller decides where messages go without global logger state.
pub trait PipelineLogger: Send {
    /// Log a human-readable message at `level`.
    fn log(&mut self, level: Level, message: &str);

    /// Report item-level progress for a named unit of work.
    fn progress(&mut self, label: &str, current: usize, total: usize);

    /// Record how long a named stage took for one item.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}

    fn error(&mut self, message: &str) {
        self.log(Level::Error, message);
    }

    fn warn(&mut self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn info(&mut self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&mut self, message: &str) {
        self.log(Level::Debug, message);
    }
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn log(&mut self, _level: Level, _message: &str) {}
    fn progress(&mut self, _label: &str, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Logger that keeps every message in memory, in order.
#[derive(Default)]
pub struct MemoryPipelineLogger {
    pub messages: Vec<(Level, String)>,
}

impl MemoryPipelineLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

impl PipelineLogger for MemoryPipelineLogger {
    fn log(&mut self, level: Level, message: &str) {
        self.messages.push((level, message.to_string()));
    }
    fn progress(&mut self, _label: &str, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// CLI logger that forwards messages to the `log` facade, throttles
/// progress lines and reports per-stage timing at the end of the run.
pub struct ConsolePipelineLogger {
    throttle_items: usize,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
}

impl ConsolePipelineLogger {
    pub fn new(throttle_items: usize) -> Self {
        Self {
            throttle_items: throttle_items.max(1),
            timings: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary string, or `None` if no timing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Run summary ({elapsed_s:.1}s total):")];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            lines.push(format!(
                "  {stage:12}: {count} calls, avg {avg_ms:7.1}ms  total {total_s:7.1}s",
                count = durations.len(),
                total_s = total_ms / 1000.0,
            ));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    fn should_report(&self, current: usize, total: usize) -> bool {
        total > 0 && (current == 1 || current % self.throttle_items == 0 || current == total)
    }
}

impl Default for ConsolePipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for ConsolePipelineLogger {
    fn log(&mut self, level: Level, message: &str) {
        log::log!(level, "{message}");
    }

    fn progress(&mut self, label: &str, current: usize, total: usize) {
        if self.should_report(current, total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("{label}: {current}/{total} clips ({pct:3.0}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
