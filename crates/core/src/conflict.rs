// Conflict policy: decide whether a command may proceed given the pre-flight report.

use serde::Serialize;

use crate::preflight::ChangeReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Content reads. Never consult the conflict flag.
    Read,
    /// Targeted, non-destructive edits. Proceed but surface a warning.
    WarnOnConflict,
    /// Full-document overwrites. Require an established, current read baseline.
    BlockOnConflict,
    NoCheck,
}

/// The two revision counters a conflict is judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictDetail {
    pub read_version: Option<i64>,
    pub current_version: i64,
}

impl ConflictDetail {
    /// No read baseline counts as a conflict.
    pub fn has_conflict(&self) -> bool {
        self.read_version != Some(self.current_version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NoReadBaseline,
    ChangedSinceRead { read_version: i64, current_version: i64 },
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReadBaseline => f.write_str(
                "no read baseline. Run 'gdoc cat' first, or use --force to overwrite.",
            ),
            Self::ChangedSinceRead { read_version, current_version } => write!(
                f,
                "doc changed since last read (v{read_version} -> v{current_version}). \
                 Run 'gdoc cat' first, or use --force to overwrite."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    ProceedWithWarning(ConflictDetail),
    Blocked(BlockReason),
}

/// Decide from a full pre-flight report (`None` when pre-flight was skipped).
pub fn evaluate(report: Option<&ChangeReport>, class: CommandClass, force: bool) -> Decision {
    evaluate_detail(report.map(ChangeReport::conflict_detail), class, force)
}

/// Decide from bare revision facts, e.g. the result of a quiet-mode probe.
pub fn evaluate_detail(
    detail: Option<ConflictDetail>,
    class: CommandClass,
    force: bool,
) -> Decision {
    if force {
        return Decision::Proceed;
    }
    match class {
        CommandClass::Read | CommandClass::NoCheck => Decision::Proceed,
        CommandClass::WarnOnConflict => match detail {
            Some(detail) if detail.has_conflict() => Decision::ProceedWithWarning(detail),
            _ => Decision::Proceed,
        },
        CommandClass::BlockOnConflict => match detail {
            None => Decision::Blocked(BlockReason::NoReadBaseline),
            Some(ConflictDetail { read_version: None, .. }) => {
                Decision::Blocked(BlockReason::NoReadBaseline)
            }
            Some(ConflictDetail { read_version: Some(read_version), current_version })
                if read_version != current_version =>
            {
                Decision::Blocked(BlockReason::ChangedSinceRead { read_version, current_version })
            }
            Some(_) => Decision::Proceed,
        },
    }
}
