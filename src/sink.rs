use crate::timeline::TimelineEvent;

/// Receives every emitted event. Calls are fire-and-forget: a sink cannot
/// fail the session, and it must not call back into the controller.
pub trait LogSink: Send + Sync {
    fn emit(&self, label: &str, event: &TimelineEvent);
}

/// `"[<label>] <category> at <timestamp>"`
pub fn format_header(label: &str, event: &TimelineEvent) -> String {
    format!("[{label}] {} at {}", event.category, event.logged_at)
}

/// Header followed by one `"- <message>"` line per message.
pub fn format_lines(label: &str, event: &TimelineEvent) -> Vec<String> {
    std::iter::once(format_header(label, event))
        .chain(event.messages.iter().map(|message| format!("- {message}")))
        .collect()
}

/// Writes each event as one grouped record through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn emit(&self, label: &str, event: &TimelineEvent) {
        log::info!("{}", format_lines(label, event).join("\n"));
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _label: &str, _event: &TimelineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_header_and_messages() {
        let event = TimelineEvent {
            category: "Long Task".into(),
            messages: vec!["Duration: 350ms".into(), "Severity: Severe".into()],
            captured_at_ms: 12.0,
            logged_at: "2026-01-02T03:04:05.678Z".into(),
        };
        assert_eq!(
            format_lines("Vitalscope", &event),
            vec![
                "[Vitalscope] Long Task at 2026-01-02T03:04:05.678Z",
                "- Duration: 350ms",
                "- Severity: Severe",
            ]
        );
    }
}
