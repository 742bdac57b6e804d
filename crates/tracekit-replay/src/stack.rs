//! Stack-trace capture for replay fingerprints (§4.4: "captured at call
//! sites... with the outermost frames filtered").
//!
//! Captured stacks are noisy without trimming: the runtime's own task
//! scheduler and this crate's instrumentation wrappers show up as leading
//! frames on every capture and add nothing to a match fingerprint.

/// Prefixes of symbol names dropped from the head of every captured stack.
/// Frames are dropped only while they match one of these prefixes, starting
/// from the outermost (most recent) frame — once a non-matching frame is
/// seen, the rest of the stack is kept as-is.
pub const DEFAULT_FILTERED_PREFIXES: &[&str] = &[
    "backtrace::",
    "tracekit_replay::",
    "tracekit_core::",
    "tokio::runtime::",
    "core::ops::function::",
    "std::panicking::",
];

/// Capture the current call stack as demangled symbol names, dropping
/// leading frames whose symbol starts with one of `filtered_prefixes`.
pub fn capture(filtered_prefixes: &[&str]) -> Vec<String> {
    let mut frames = Vec::new();
    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            if let Some(name) = symbol.name() {
                frames.push(name.to_string());
            }
        });
        true
    });

    let first_kept = frames
        .iter()
        .position(|f| !filtered_prefixes.iter().any(|p| f.starts_with(p)))
        .unwrap_or(frames.len());

    frames.split_off(first_kept)
}

/// Capture with [`DEFAULT_FILTERED_PREFIXES`].
pub fn capture_default() -> Vec<String> {
    capture(DEFAULT_FILTERED_PREFIXES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_returns_at_least_one_frame() {
        let frames = capture(&[]);
        assert!(!frames.is_empty());
    }

    #[test]
    fn filtering_drops_only_the_matching_leading_run() {
        let frames = vec![
            "tracekit_replay::stack::capture".to_string(),
            "tracekit_replay::stack::capture_default".to_string(),
            "my_app::handler::do_thing".to_string(),
            "tracekit_replay::stack::capture".to_string(),
        ];
        let filtered_prefixes = &["tracekit_replay::"];
        let first_kept = frames
            .iter()
            .position(|f| !filtered_prefixes.iter().any(|p| f.starts_with(p)))
            .unwrap();
        let kept = &frames[first_kept..];
        assert_eq!(kept[0], "my_app::handler::do_thing");
        assert_eq!(kept.len(), 2, "non-leading matches are not stripped");
    }

    #[test]
    fn empty_prefix_list_keeps_everything() {
        let frames = capture(&[]);
        let all = capture(&[]);
        assert_eq!(frames.len(), all.len());
    }
}
