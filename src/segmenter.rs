use crate::error::{LsiError, Span};
use tracing::{debug, trace};

/// One source line as the dispatcher sees it: stripped text plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    /// 1-based physical line number.
    pub number: usize,
    pub span: Span,
}

/// A flat run of lines that execute together.
///
/// The first line sits at the reference indentation; every following line was
/// indented deeper. Deeper lines are never nested further.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementGroup {
    pub lines: Vec<SourceLine>,
}

impl StatementGroup {
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.text.as_str()).collect()
    }
}

fn indentation_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Splits source text into statement groups.
///
/// The indentation of the first non-blank line becomes the reference for the
/// whole document. A line at the reference starts a new group, a deeper line
/// joins the current one, and a shallower line is a structural error.
pub fn segment(source: &str) -> Result<Vec<StatementGroup>, LsiError> {
    let mut groups = Vec::new();
    let mut current: Option<StatementGroup> = None;
    let mut reference: Option<usize> = None;
    let mut offset = 0;
    // Structural errors cite the position among non-blank lines.
    let mut content_lines = 0;

    for (index, raw) in source.split('\n').enumerate() {
        let start = offset;
        offset += raw.len() + 1;

        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        content_lines += 1;

        let width = indentation_width(raw);
        let reference_width = *reference.get_or_insert_with(|| {
            debug!(width, "detected reference indentation");
            width
        });

        let line = SourceLine {
            text: text.to_string(),
            number: index + 1,
            span: Span::new(start, start + raw.trim_end().len()),
        };

        if width == reference_width {
            if let Some(group) = current.take() {
                groups.push(group);
            }
            trace!(line = line.number, "starting group");
            current = Some(StatementGroup { lines: vec![line] });
        } else if width > reference_width {
            // Only reachable once a group is open: the first content line
            // always sets the reference.
            current.get_or_insert_with(StatementGroup::default).lines.push(line);
        } else {
            return Err(LsiError::structural_error(
                line.span,
                format!("Incorrect indentation detected at line {}.", content_lines),
            ));
        }
    }

    if let Some(group) = current {
        groups.push(group);
    }

    debug!(groups = groups.len(), "segmentation finished");
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn texts(groups: &[StatementGroup]) -> Vec<Vec<&str>> {
        groups.iter().map(StatementGroup::texts).collect()
    }

    #[test]
    fn flat_lines_are_separate_groups() {
        let groups = segment("assign a 5\nassign b 3\nmult a b c").unwrap();
        assert_eq!(
            texts(&groups),
            vec![vec!["assign a 5"], vec!["assign b 3"], vec!["mult a b c"]]
        );
    }

    #[test]
    fn deeper_lines_join_without_nesting() {
        let source = "def f x\n    write a\n        write b\n  write c\nwrite d\n";
        let groups = segment(source).unwrap();
        assert_eq!(
            texts(&groups),
            vec![vec!["def f x", "write a", "write b", "write c"], vec!["write d"]]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let groups = segment("\n\n  write a\n   \n\n    write b\n  write c").unwrap();
        assert_eq!(texts(&groups), vec![vec!["write a", "write b"], vec!["write c"]]);
        assert_eq!(groups[0].lines[1].number, 6);
    }

    #[test]
    fn empty_source_has_no_groups() {
        assert!(segment("").unwrap().is_empty());
        assert!(segment("  \n\t\n").unwrap().is_empty());
    }

    #[test]
    fn shallower_line_is_structural() {
        let err = segment("    write a\n    write b\n  write c").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.message, "Incorrect indentation detected at line 3.");
        assert_eq!(err.span, Some(Span::new(24, 33)));
    }

    #[test]
    fn structural_line_skips_blank_lines() {
        let source = "  write a\n\n\n write b";
        let err = segment(source).unwrap_err();
        assert_eq!(err.message, "Incorrect indentation detected at line 2.");
        let span = err.span.unwrap();
        assert_eq!(&source[span.start..span.end], " write b");
    }

    #[test]
    fn spans_cover_trimmed_text() {
        let source = "write a\n  write bc  \r\n";
        let groups = segment(source).unwrap();
        let line = &groups[0].lines[1];
        assert_eq!(&source[line.span.start..line.span.end], "  write bc");
    }
}
