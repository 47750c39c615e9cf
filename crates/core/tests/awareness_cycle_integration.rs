// End-to-end awareness cycles: pre-flight -> command -> apply_and_save -> next pre-flight,
// against a scripted in-memory remote.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gdoc_common::error::RemoteError;
use gdoc_common::types::{Author, Comment, CommentPage, Reply, ReplyAction, RevisionInfo};
use gdoc_core::{
    evaluate, pre_flight, pre_flight_with_clock, CommandClass, CommentPatch, CommentQuery,
    Decision, DocumentState, Fetcher, InteractionKind, StateStore, StateUpdate,
};
use tempfile::TempDir;

const DOC: &str = "doc123";

type CallLog = Rc<RefCell<Vec<String>>>;

struct ScriptedRemote {
    version: RefCell<i64>,
    editor: Author,
    comments: RefCell<Vec<Comment>>,
    page_size: usize,
    fail_comments: bool,
    log: CallLog,
    queries: RefCell<Vec<CommentQuery>>,
}

impl ScriptedRemote {
    fn new(log: CallLog) -> Self {
        Self {
            version: RefCell::new(100),
            editor: Author { display_name: Some("Carol".into()), email_address: None },
            comments: RefCell::new(Vec::new()),
            page_size: 2,
            fail_comments: false,
            log,
            queries: RefCell::new(Vec::new()),
        }
    }

    fn set_comments(&self, comments: Vec<Comment>) {
        *self.comments.borrow_mut() = comments;
    }

    fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Fetcher for ScriptedRemote {
    async fn fetch_revision(&self, _doc_id: &str) -> Result<RevisionInfo, RemoteError> {
        self.log.borrow_mut().push("revision".into());
        Ok(RevisionInfo {
            version: *self.version.borrow(),
            modified_time: Some(t(0)),
            last_modifying_user: Some(self.editor.clone()),
            name: Some("Design Notes".into()),
            owners: vec![Author { display_name: None, email_address: Some("owner@co.com".into()) }],
        })
    }

    async fn fetch_comment_page(
        &self,
        _doc_id: &str,
        query: &CommentQuery,
        page_token: Option<&str>,
    ) -> Result<CommentPage, RemoteError> {
        self.log.borrow_mut().push(format!("comments:{}", page_token.unwrap_or("-")));
        self.queries.borrow_mut().push(*query);
        if self.fail_comments {
            return Err(RemoteError::Api { status: 500, message: "backend".into() });
        }

        let matching: Vec<Comment> = self
            .comments
            .borrow()
            .iter()
            .filter(|c| match (query.since, c.modified_time) {
                (Some(since), Some(modified)) => modified >= since,
                _ => true,
            })
            .cloned()
            .collect();
        let offset: usize = page_token.map_or(0, |token| token.parse().unwrap());
        let end = (offset + self.page_size).min(matching.len());
        Ok(CommentPage {
            comments: matching[offset..end].to_vec(),
            next_page_token: (end < matching.len()).then(|| end.to_string()),
        })
    }
}

fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap() + Duration::minutes(minute)
}

fn comment(id: &str, resolved: bool, modified: i64) -> Comment {
    Comment {
        id: id.into(),
        author: Some(Author { display_name: Some("Alice".into()), email_address: Some("alice@co.com".into()) }),
        content: format!("comment {id}"),
        resolved,
        created_time: Some(t(modified)),
        modified_time: Some(t(modified)),
        ..Comment::default()
    }
}

fn ids(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn setup() -> (TempDir, StateStore, ScriptedRemote) {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path().join("state"));
    let remote = ScriptedRemote::new(Rc::new(RefCell::new(Vec::new())));
    (dir, store, remote)
}

#[tokio::test]
async fn quiet_preflight_makes_zero_remote_calls() {
    let (_dir, _store, remote) = setup();
    let report = pre_flight(&remote, DOC, &DocumentState::default(), true).await.unwrap();
    assert!(report.is_none());
    assert!(remote.calls().is_empty(), "quiet mode must not touch the remote");
}

#[tokio::test]
async fn first_interaction_omits_lower_bound_and_paginates_to_completion() {
    let (_dir, _store, remote) = setup();
    remote.set_comments(vec![
        comment("A", false, 1),
        comment("B", true, 2),
        comment("C", false, 3),
        comment("D", false, 4),
        comment("E", true, 5),
    ]);

    let report = pre_flight(&remote, DOC, &DocumentState::default(), false)
        .await
        .unwrap()
        .expect("non-quiet pre-flight should produce a report");

    assert!(report.is_first_interaction);
    assert_eq!(report.doc_title.as_deref(), Some("Design Notes"));
    assert_eq!(report.doc_owner.as_deref(), Some("owner@co.com"));
    assert_eq!(report.open_comment_count, 3);
    assert_eq!(report.resolved_comment_count, 2);
    assert_eq!(report.all_comment_ids, ids(&["A", "B", "C", "D", "E"]));
    assert_eq!(report.all_resolved_ids, ids(&["B", "E"]));
    assert!(report.new_comments.is_empty(), "first interaction computes no diff");
    assert!(report.has_conflict, "no read baseline yet");

    assert_eq!(remote.calls(), vec!["revision", "comments:-", "comments:2", "comments:4"]);
    assert!(remote.queries.borrow().iter().all(|q| q.since.is_none()));
}

#[tokio::test]
async fn timestamp_is_captured_before_any_remote_call() {
    let (_dir, _store, remote) = setup();
    let log = remote.log.clone();
    let clock = move || {
        log.borrow_mut().push("clock".into());
        t(30)
    };

    let report = pre_flight_with_clock(&remote, DOC, &DocumentState::default(), false, clock)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.preflight_timestamp, t(30));
    assert_eq!(remote.calls().first().map(String::as_str), Some("clock"));
    assert_eq!(remote.calls()[1], "revision");
}

#[tokio::test]
async fn resolved_and_new_comments_are_classified_and_merged() {
    let (_dir, _store, remote) = setup();
    let state = DocumentState {
        last_seen: Some(t(0)),
        last_version: Some(100),
        last_read_version: Some(100),
        last_comment_check: Some(t(0)),
        known_comment_ids: ids(&["A"]),
        known_resolved_ids: ids(&[]),
    };
    let mut resolved_a = comment("A", true, 5);
    resolved_a.replies.push(Reply {
        author: Some(Author { display_name: None, email_address: Some("bob@co.com".into()) }),
        action: Some(ReplyAction::Resolve),
        created_time: Some(t(5)),
        ..Reply::default()
    });
    remote.set_comments(vec![resolved_a, comment("B", false, 6)]);

    let report = pre_flight(&remote, DOC, &state, false).await.unwrap().unwrap();

    assert_eq!(report.all_comment_ids, ids(&["A", "B"]));
    assert_eq!(report.all_resolved_ids, ids(&["A"]));
    let resolved: Vec<&str> = report.resolved_comments.iter().map(|c| c.comment_id.as_str()).collect();
    let new: Vec<&str> = report.new_comments.iter().map(|c| c.comment_id.as_str()).collect();
    assert_eq!(resolved, vec!["A"]);
    assert_eq!(report.resolved_comments[0].author, "bob@co.com");
    assert_eq!(new, vec!["B"]);
    assert!(report.reopened_comments.is_empty());
    assert_eq!(remote.queries.borrow()[0].since, Some(t(0)));
}

#[tokio::test]
async fn repeated_preflight_does_not_duplicate_new_comments() {
    let (_dir, store, remote) = setup();
    store
        .save(
            DOC,
            &DocumentState {
                last_comment_check: Some(t(0)),
                last_version: Some(100),
                known_comment_ids: ids(&["A"]),
                ..DocumentState::default()
            },
        )
        .unwrap();
    remote.set_comments(vec![comment("A", false, 1), comment("B", false, 2)]);

    let first = pre_flight(&remote, DOC, &store.load(DOC), false).await.unwrap().unwrap();
    assert_eq!(first.new_comments.len(), 1);
    store
        .apply_and_save(DOC, Some(&first), &StateUpdate::new(InteractionKind::Inspect))
        .unwrap();

    let second = pre_flight(&remote, DOC, &store.load(DOC), false).await.unwrap().unwrap();
    assert!(second.new_comments.is_empty());
    assert!(!second.has_changes());
}

#[tokio::test]
async fn repeated_preflight_over_identical_state_is_stable() {
    let (_dir, _store, remote) = setup();
    let state = DocumentState {
        last_comment_check: Some(t(0)),
        last_version: Some(100),
        known_comment_ids: ids(&["A", "B"]),
        ..DocumentState::default()
    };
    remote.set_comments(vec![comment("A", false, 1), comment("B", false, 2)]);

    let once = pre_flight_with_clock(&remote, DOC, &state, false, || t(9)).await.unwrap();
    let twice = pre_flight_with_clock(&remote, DOC, &state, false, || t(9)).await.unwrap();
    assert_eq!(once, twice);
    assert!(once.unwrap().new_comments.is_empty());
}

#[tokio::test]
async fn new_reply_on_known_comment_is_not_a_new_comment() {
    let (_dir, _store, remote) = setup();
    let state = DocumentState {
        last_comment_check: Some(t(10)),
        last_version: Some(100),
        known_comment_ids: ids(&["A"]),
        ..DocumentState::default()
    };
    let mut a = comment("A", false, 12);
    a.created_time = Some(t(1));
    a.replies = vec![
        Reply { content: "old reply".into(), created_time: Some(t(2)), ..Reply::default() },
        Reply {
            author: Some(Author { display_name: Some("Dana".into()), email_address: None }),
            content: "new reply".into(),
            created_time: Some(t(12)),
            ..Reply::default()
        },
    ];
    remote.set_comments(vec![a]);

    let report = pre_flight(&remote, DOC, &state, false).await.unwrap().unwrap();
    assert!(report.new_comments.is_empty());
    assert_eq!(report.new_replies.len(), 1);
    assert_eq!(report.new_replies[0].author, "Dana");
    assert_eq!(report.new_replies[0].snippet, "new reply");
}

#[tokio::test]
async fn reopened_comment_leaves_resolved_set() {
    let (_dir, _store, remote) = setup();
    let state = DocumentState {
        last_comment_check: Some(t(0)),
        last_version: Some(100),
        known_comment_ids: ids(&["A"]),
        known_resolved_ids: ids(&["A"]),
        ..DocumentState::default()
    };
    remote.set_comments(vec![comment("A", false, 3)]);

    let report = pre_flight(&remote, DOC, &state, false).await.unwrap().unwrap();
    assert_eq!(report.reopened_comments.len(), 1);
    assert!(report.all_resolved_ids.is_empty());
}

#[tokio::test]
async fn doc_edit_is_reported_against_last_version() {
    let (_dir, _store, remote) = setup();
    *remote.version.borrow_mut() = 105;
    let state = DocumentState {
        last_comment_check: Some(t(0)),
        last_version: Some(103),
        last_read_version: Some(101),
        ..DocumentState::default()
    };

    let report = pre_flight(&remote, DOC, &state, false).await.unwrap().unwrap();
    assert!(report.doc_edited);
    assert_eq!(report.version_from, Some(103));
    assert_eq!(report.version_to, Some(105));
    assert_eq!(report.editor.as_deref(), Some("Carol"));
    assert!(report.has_conflict, "conflict is judged against the read baseline");
}

#[tokio::test]
async fn inspection_cannot_move_the_read_baseline() {
    let (_dir, store, remote) = setup();

    // Read at v100 establishes the baseline.
    let report = pre_flight(&remote, DOC, &store.load(DOC), false).await.unwrap();
    store.apply_and_save(DOC, report.as_ref(), &StateUpdate::new(InteractionKind::Read)).unwrap();

    // Someone else edits, then the agent only inspects.
    *remote.version.borrow_mut() = 101;
    let report = pre_flight(&remote, DOC, &store.load(DOC), false).await.unwrap();
    store
        .apply_and_save(DOC, report.as_ref(), &StateUpdate::new(InteractionKind::Inspect))
        .unwrap();

    let state = store.load(DOC);
    assert_eq!(state.last_version, Some(101));
    assert_eq!(state.last_read_version, Some(100));

    let report = pre_flight(&remote, DOC, &state, false).await.unwrap();
    assert!(!report.as_ref().unwrap().doc_edited, "the edit was already reported once");
    assert!(matches!(
        evaluate(report.as_ref(), CommandClass::BlockOnConflict, false),
        Decision::Blocked(_)
    ));
}

#[tokio::test]
async fn own_mutation_is_not_reported_back() {
    let (_dir, store, remote) = setup();
    remote.set_comments(vec![comment("A", false, 1)]);
    let report = pre_flight_with_clock(&remote, DOC, &store.load(DOC), false, || t(2)).await.unwrap();
    store.apply_and_save(DOC, report.as_ref(), &StateUpdate::new(InteractionKind::Read)).unwrap();

    // The agent resolves A and creates C in a quiet run.
    remote.set_comments(vec![comment("A", true, 5), comment("C", false, 5)]);
    store
        .apply_and_save(
            DOC,
            None,
            &StateUpdate::new(InteractionKind::Write).with_patch(CommentPatch::resolved("A")),
        )
        .unwrap();
    store
        .apply_and_save(
            DOC,
            None,
            &StateUpdate::new(InteractionKind::Write).with_patch(CommentPatch::created("C")),
        )
        .unwrap();

    let state = store.load(DOC);
    assert_eq!(state.last_comment_check, Some(t(2)), "quiet runs never advance the lower bound");

    let report = pre_flight(&remote, DOC, &state, false).await.unwrap().unwrap();
    assert!(report.new_comments.is_empty());
    assert!(report.resolved_comments.is_empty());
}

#[tokio::test]
async fn remote_failure_leaves_state_untouched() {
    let (_dir, store, mut remote) = setup();
    remote.fail_comments = true;

    let before = store.load(DOC);
    let outcome = async {
        let report = pre_flight(&remote, DOC, &before, false).await?;
        store
            .apply_and_save(DOC, report.as_ref(), &StateUpdate::new(InteractionKind::Read))
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok::<_, RemoteError>(())
    }
    .await;

    assert!(matches!(outcome, Err(RemoteError::Api { status: 500, .. })));
    assert!(!store.state_path(DOC).exists());
}

#[tokio::test]
async fn corrupt_record_behaves_like_no_record() {
    let (_dir, store, remote) = setup();
    std::fs::create_dir_all(store.root()).unwrap();
    std::fs::write(store.state_path(DOC), b"not json").unwrap();
    remote.set_comments(vec![comment("A", false, 1)]);

    let from_corrupt = pre_flight_with_clock(&remote, DOC, &store.load(DOC), false, || t(3)).await.unwrap();
    let from_empty =
        pre_flight_with_clock(&remote, DOC, &DocumentState::default(), false, || t(3)).await.unwrap();
    assert_eq!(from_corrupt, from_empty);
}
