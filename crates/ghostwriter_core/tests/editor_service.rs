use async_trait::async_trait;
use ghostwriter_core::{
    EditorDraft, EditorError, EditorService, EnhanceOutcome, NoteStore, OutputLanguage,
    RewriteOutcome, RewriteRequest, RewriteService, RewriteStyle, SaveOutcome, SqliteBlobStorage,
    StoreError, UnavailableReason, VersionLabel,
};
use std::path::PathBuf;
use std::sync::Mutex;

/// Returns a fixed outcome and records every request it sees.
struct ScriptedRewriter {
    outcome: RewriteOutcome,
    requests: Mutex<Vec<RewriteRequest>>,
}

impl ScriptedRewriter {
    fn returning(outcome: RewriteOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RewriteService for ScriptedRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> RewriteOutcome {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }
}

fn editor(outcome: RewriteOutcome) -> EditorService<SqliteBlobStorage, ScriptedRewriter> {
    let store = NoteStore::new(SqliteBlobStorage::open_in_memory().unwrap());
    EditorService::new(store, ScriptedRewriter::returning(outcome))
}

#[test]
fn open_unknown_note_gives_empty_draft() {
    let editor = editor(RewriteOutcome::Rewritten("unused".to_string()));

    let draft = editor.open("1700000000000");

    assert_eq!(draft.id, "1700000000000");
    assert!(draft.title.is_empty());
    assert!(draft.text.is_empty());
    assert!(draft.history.is_empty());
    assert_eq!(draft.loaded_updated_at, None);
}

/// Opens `id`, replaces its title and text, and saves manually.
fn save_text<R: RewriteService>(
    editor: &mut EditorService<SqliteBlobStorage, R>,
    id: &str,
    title: &str,
    text: &str,
) -> EditorDraft {
    let mut draft = editor.open(id);
    draft.title = title.to_string();
    draft.text = text.to_string();
    editor.manual_save(&mut draft).unwrap();
    draft
}

/// Saves other content through a second connection while "thinking".
struct InterruptedRewriter {
    database: PathBuf,
}

#[async_trait]
impl RewriteService for InterruptedRewriter {
    async fn rewrite(&self, _request: &RewriteRequest) -> RewriteOutcome {
        let mut other = NoteStore::new(SqliteBlobStorage::open(&self.database).unwrap());
        other
            .save("n", "typed in another window", "Title", Some(VersionLabel::Manual))
            .unwrap();
        RewriteOutcome::Rewritten("Polished words.".to_string())
    }
}

#[test]
fn manual_save_uses_manual_label_and_editor_title_fallback() {
    let mut editor = editor(RewriteOutcome::Rewritten("unused".to_string()));
    let mut draft = editor.open("n");
    draft.text = "first draft".to_string();

    let result = editor.manual_save(&mut draft).unwrap();

    assert_eq!(result.outcome, SaveOutcome::Created);
    assert_eq!(result.note.title, "Untitled");
    assert_eq!(result.note.last_label, Some(VersionLabel::Manual));
    assert_eq!(draft, editor.open("n"));
    assert_eq!(draft.text, "first draft");
    assert_eq!(draft.loaded_updated_at, Some(result.note.updated_at));
}

#[test]
fn saving_a_stale_draft_is_a_conflict() {
    let mut editor = editor(RewriteOutcome::Rewritten("unused".to_string()));
    save_text(&mut editor, "n", "T", "v1");
    let mut stale = editor.open("n");
    save_text(&mut editor, "n", "T", "v2 from elsewhere");

    stale.text = "v2 from here".to_string();
    let err = editor.manual_save(&mut stale).unwrap_err();

    assert!(matches!(
        err,
        EditorError::Store(StoreError::Conflict { ref id, .. }) if id == "n"
    ));
    assert_eq!(
        editor.store().get_by_id("n").unwrap().current_content,
        "v2 from elsewhere"
    );

    let mut fresh = editor.open("n");
    fresh.text = "v2 from here".to_string();
    assert_eq!(
        editor.manual_save(&mut fresh).unwrap().outcome,
        SaveOutcome::Versioned
    );
}

#[tokio::test]
async fn store_change_during_rewrite_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("ghostwriter.sqlite3");
    let store = NoteStore::new(SqliteBlobStorage::open(&database).unwrap());
    let mut editor = EditorService::new(
        store,
        InterruptedRewriter {
            database: database.clone(),
        },
    );
    let mut draft = save_text(&mut editor, "n", "Title", "rough words");

    let err = editor
        .enhance(&mut draft, RewriteStyle::Professional, OutputLanguage::English)
        .await
        .unwrap_err();

    assert!(matches!(err, EditorError::Store(StoreError::Conflict { .. })));
    assert_eq!(draft.text, "rough words");
    let note = editor.store().get_by_id("n").unwrap();
    assert_eq!(note.current_content, "typed in another window");
    assert_eq!(note.last_label, Some(VersionLabel::Manual));
    assert_eq!(note.history.len(), 1);
    assert_eq!(note.history[0].content(), "rough words");
}

#[tokio::test]
async fn successful_enhance_saves_with_ai_label() {
    let mut editor = editor(RewriteOutcome::Rewritten("Polished words.".to_string()));
    let mut draft = save_text(&mut editor, "n", "Title", "rough words");

    let outcome = editor
        .enhance(&mut draft, RewriteStyle::Poetic, OutputLanguage::Hinglish)
        .await
        .unwrap();

    let result = match outcome {
        EnhanceOutcome::Saved(result) => result,
        other => panic!("expected a saved rewrite, got {other:?}"),
    };
    assert_eq!(result.outcome, SaveOutcome::Versioned);
    assert_eq!(result.note.current_content, "Polished words.");
    assert_eq!(
        result.note.last_label.as_ref().unwrap().to_string(),
        "✨ Poetic (Hinglish)"
    );
    assert!(result.note.last_label.as_ref().unwrap().is_ai_generated());
    assert_eq!(result.note.history[0].content(), "rough words");
    assert_eq!(result.note.history[0].label(), &VersionLabel::Manual);
    assert_eq!(draft.text, "Polished words.");
    assert_eq!(draft.loaded_updated_at, Some(result.note.updated_at));

    let requests = editor.rewriter().requests.lock().unwrap();
    assert_eq!(
        requests.as_slice(),
        &[RewriteRequest::new(
            "rough words",
            RewriteStyle::Poetic,
            OutputLanguage::Hinglish
        )]
    );
}

#[tokio::test]
async fn unavailable_rewrite_leaves_note_untouched() {
    for reason in [
        UnavailableReason::MissingCredentials,
        UnavailableReason::Timeout,
        UnavailableReason::Remote { status: 503 },
        UnavailableReason::Transport("connection reset".to_string()),
        UnavailableReason::EmptyResponse,
    ] {
        let mut editor = editor(RewriteOutcome::Unavailable(reason.clone()));
        let mut draft = save_text(&mut editor, "n", "Title", "keep me");
        let before = editor.store().get_by_id("n").unwrap();
        draft.title = "Other title".to_string();
        let draft_before = draft.clone();

        let outcome = editor
            .enhance(&mut draft, RewriteStyle::Witty, OutputLanguage::English)
            .await
            .unwrap();

        assert_eq!(outcome, EnhanceOutcome::Unavailable(reason));
        assert_eq!(editor.store().get_by_id("n").unwrap(), before);
        assert_eq!(draft, draft_before);
    }
}

#[tokio::test]
async fn unavailable_rewrite_of_unsaved_note_creates_nothing() {
    let mut editor = editor(RewriteOutcome::Unavailable(UnavailableReason::Timeout));
    let mut draft = editor.open("fresh");
    draft.text = "some text".to_string();

    editor
        .enhance(&mut draft, RewriteStyle::Professional, OutputLanguage::English)
        .await
        .unwrap();

    assert!(editor.store().list_all().is_empty());
}

#[tokio::test]
async fn empty_text_skips_the_rewrite_backend() {
    let mut editor = editor(RewriteOutcome::Rewritten("should not appear".to_string()));
    let mut draft = editor.open("n");
    draft.title = "Title".to_string();

    let outcome = editor
        .enhance(&mut draft, RewriteStyle::Eli5, OutputLanguage::German)
        .await
        .unwrap();

    assert_eq!(outcome, EnhanceOutcome::NothingToRewrite);
    assert_eq!(editor.rewriter().calls(), 0);
    assert!(editor.store().list_all().is_empty());
}

#[test]
fn restore_returns_archived_content_without_saving() {
    let mut editor = editor(RewriteOutcome::Rewritten("unused".to_string()));
    save_text(&mut editor, "n", "T", "v1");
    save_text(&mut editor, "n", "T", "v2");
    let mut draft = save_text(&mut editor, "n", "T", "v3");
    let before = editor.store().get_by_id("n").unwrap();

    assert_eq!(editor.restore("n", 1).unwrap(), "v1");
    assert_eq!(editor.store().get_by_id("n").unwrap(), before);

    draft.text = editor.restore("n", 1).unwrap();
    let result = editor.manual_save(&mut draft).unwrap();
    assert_eq!(result.note.current_content, "v1");
    let history: Vec<&str> = result
        .note
        .history
        .iter()
        .map(|record| record.content())
        .collect();
    assert_eq!(history, vec!["v3", "v2", "v1"]);
}

#[test]
fn restore_reports_missing_note_and_bad_index() {
    let mut editor = editor(RewriteOutcome::Rewritten("unused".to_string()));
    save_text(&mut editor, "n", "T", "v1");
    save_text(&mut editor, "n", "T", "v2");

    assert!(matches!(
        editor.restore("missing", 0),
        Err(EditorError::NoteNotFound(id)) if id == "missing"
    ));
    match editor.restore("n", 3) {
        Err(EditorError::HistoryIndexOutOfRange { id, index, len }) => {
            assert_eq!(id, "n");
            assert_eq!(index, 3);
            assert_eq!(len, 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
