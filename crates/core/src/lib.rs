// gdoc-core: per-document awareness state, pre-flight change detection,
// conflict policy, and comment annotation.

pub mod annotate;
pub mod conflict;
pub mod fetcher;
pub mod preflight;
pub mod reconcile;
pub mod state;

pub use annotate::{annotate, locate_anchor, AnchorOutcome, UnanchoredReason};
pub use conflict::{evaluate, evaluate_detail, BlockReason, CommandClass, ConflictDetail, Decision};
pub use fetcher::{CommentQuery, Fetcher};
pub use preflight::{pre_flight, pre_flight_with_clock, probe_conflict, ActivityItem, ChangeReport};
pub use reconcile::{reconcile, CommentPatch, InteractionKind, StateUpdate};
pub use state::{DocumentState, StateStore};
