use crate::dispatcher::Dispatcher;
use crate::error::LsiError;
use crate::segmenter::segment;
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub groups: usize,
    pub lines: usize,
    /// Statement-level failures, in the order they happened.
    pub failures: Vec<LsiError>,
}

/// Segments `source` and executes every group through `dispatcher`.
///
/// A structural error is reported as a diagnostic and returned before any
/// statement runs. Statement failures never stop the run; they are collected
/// into the summary.
pub fn run<R: BufRead, W: Write>(
    source: &str,
    filename: Option<&str>,
    dispatcher: &mut Dispatcher<R, W>,
) -> Result<RunSummary, LsiError> {
    let groups = match segment(source) {
        Ok(groups) => groups,
        Err(error) => {
            error.report(source, filename);
            return Err(error);
        }
    };

    let mut summary = RunSummary {
        groups: groups.len(),
        ..RunSummary::default()
    };

    for group in &groups {
        debug!(first_line = ?group.lines.first().map(|l| l.number), "executing group");
        let report = dispatcher.execute_group(group);
        summary.lines += report.outcomes.len();
        summary
            .failures
            .extend(report.outcomes.into_iter().filter_map(|o| o.result.err()));
    }

    info!(
        groups = summary.groups,
        lines = summary.lines,
        failures = summary.failures.len(),
        "run finished"
    );
    Ok(summary)
}
