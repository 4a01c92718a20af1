use std::collections::HashMap;

use tracing::debug;

use crate::session::buffer::Edit;
use crate::session::navigation::{Mode, Navigator};
use crate::session::typing::{Completed, TypingSession};
use crate::snippet::store::SnippetStore;
use crate::snippet::{Snippet, SnippetId};

/// Completion of a specific snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionEvent {
    pub snippet_id: SnippetId,
    pub index: usize,
}

/// Practice state: the store, navigation indices, the typed-code map and the
/// session bound to whichever snippet the editor currently targets.
pub struct Practice {
    store: SnippetStore,
    nav: Navigator,
    typed: HashMap<SnippetId, String>,
    session: TypingSession,
}

impl Practice {
    pub fn new(store: SnippetStore) -> Self {
        let nav = Navigator::default();
        let typed = HashMap::new();
        let session = open_session(&store, &nav, &typed);
        Self {
            store,
            nav,
            typed,
            session,
        }
    }

    pub fn store(&self) -> &SnippetStore {
        &self.store
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn mode(&self) -> Mode {
        self.nav.mode()
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn current_snippet(&self) -> &Snippet {
        self.snippet_at(self.nav.current())
    }

    /// Snippet shown in the editor: the reviewed one, or the current one.
    pub fn active_snippet(&self) -> &Snippet {
        self.snippet_at(self.nav.active())
    }

    /// Snippets reachable from history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = (usize, &Snippet)> {
        self.store.iter().enumerate().take(self.nav.current() + 1)
    }

    /// Saved progress for a snippet; no entry reads as empty.
    pub fn typed_text(&self, id: &SnippetId) -> &str {
        self.typed.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn is_at_start(&self) -> bool {
        self.nav.is_at_start()
    }

    pub fn is_at_end(&self) -> bool {
        self.nav.is_at_end(self.store.len())
    }

    /// Apply an editor edit. Text edits are dropped while reviewing; in
    /// practice mode every text edit is saved to the typed-code map.
    pub fn edit(&mut self, edit: &Edit) -> Option<CompletionEvent> {
        let completed = self.session.apply(edit);
        if self.nav.mode() == Mode::Practicing && edit.changes_text() {
            let id = self.current_snippet().id().clone();
            self.typed.insert(id, self.session.text().to_string());
        }
        completed.map(|Completed { .. }| {
            let index = self.nav.current();
            let snippet_id = self.current_snippet().id().clone();
            debug!(%snippet_id, index, "snippet completed");
            CompletionEvent { snippet_id, index }
        })
    }

    pub fn select_history(&mut self, index: usize) -> bool {
        self.transition(|nav, _| nav.select_history(index))
    }

    pub fn return_to_practice(&mut self) -> bool {
        self.transition(|nav, _| nav.return_to_practice())
    }

    pub fn advance(&mut self) -> bool {
        self.commit_progress();
        self.transition(|nav, len| nav.advance(len))
    }

    pub fn retreat(&mut self) -> bool {
        self.commit_progress();
        self.transition(|nav, _| nav.retreat())
    }

    /// Append a generated snippet and make it the current practice target,
    /// leaving review mode. Returns the new index.
    pub fn append_generated(&mut self, snippet: Snippet) -> usize {
        self.commit_progress();
        let index = self.store.push(snippet);
        self.nav.jump_to_last(self.store.len());
        self.reopen();
        index
    }

    fn snippet_at(&self, index: usize) -> &Snippet {
        // The store is never empty and the navigator keeps indices in range.
        &self.store[index]
    }

    fn transition(&mut self, step: impl FnOnce(&mut Navigator, usize) -> bool) -> bool {
        let applied = step(&mut self.nav, self.store.len());
        if applied {
            self.reopen();
        }
        applied
    }

    /// Make sure the outgoing practice text is in the typed-code map.
    fn commit_progress(&mut self) {
        if self.nav.mode() == Mode::Practicing && !self.session.text().is_empty() {
            let id = self.current_snippet().id().clone();
            self.typed.insert(id, self.session.text().to_string());
        }
    }

    fn reopen(&mut self) {
        self.session = open_session(&self.store, &self.nav, &self.typed);
    }
}

fn open_session(
    store: &SnippetStore,
    nav: &Navigator,
    typed: &HashMap<SnippetId, String>,
) -> TypingSession {
    let index = nav.active();
    let (target, initial) = match store.get(index) {
        Some(snippet) => (
            snippet.code(),
            typed.get(snippet.id()).map(String::as_str).unwrap_or(""),
        ),
        None => ("", ""),
    };
    TypingSession::new(target, initial, nav.mode() != Mode::Practicing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{Difficulty, Language};

    fn snippet(id: &str, code: &str) -> Snippet {
        Snippet::new(
            SnippetId::new(id),
            id.to_uppercase(),
            Language::JavaScript,
            Difficulty::Easy,
            code,
        )
    }

    fn practice(codes: &[(&str, &str)]) -> Practice {
        let snippets = codes.iter().map(|(id, code)| snippet(id, code)).collect();
        Practice::new(SnippetStore::from_snippets(snippets).unwrap())
    }

    fn type_str(p: &mut Practice, text: &str) -> Vec<CompletionEvent> {
        text.chars()
            .filter_map(|ch| p.edit(&Edit::Insert(ch)))
            .collect()
    }

    #[test]
    fn test_two_snippet_walkthrough() {
        let mut p = practice(&[("a", "ab"), ("b", "cd")]);
        assert!(type_str(&mut p, "a").is_empty());
        let events = type_str(&mut p, "b");
        assert_eq!(
            events,
            vec![CompletionEvent {
                snippet_id: SnippetId::new("a"),
                index: 0
            }]
        );

        assert!(p.advance());
        assert_eq!(p.navigator().current(), 1);
        assert_eq!(p.session().target(), "cd");
        assert_eq!(p.session().text(), "");

        assert!(p.retreat());
        assert_eq!(p.navigator().current(), 0);
        assert_eq!(p.session().text(), "ab");
        assert_eq!(p.typed_text(&SnippetId::new("a")), "ab");
    }

    #[test]
    fn test_reviewing_is_read_only_and_silent() {
        let mut p = practice(&[("a", "ab"), ("b", "cd")]);
        type_str(&mut p, "a");
        p.advance();
        assert!(p.select_history(0));
        assert_eq!(p.mode(), Mode::Reviewing(0));
        assert!(p.session().is_read_only());
        assert_eq!(p.active_snippet().id().as_str(), "a");

        assert!(type_str(&mut p, "b").is_empty());
        assert_eq!(p.typed_text(&SnippetId::new("a")), "a");
        assert!(!p.advance());
        assert!(!p.retreat());

        assert!(p.return_to_practice());
        assert_eq!(p.active_snippet().id().as_str(), "b");
        assert!(!p.session().is_read_only());
    }

    #[test]
    fn test_reviewing_completed_snippet_never_fires() {
        let mut p = practice(&[("a", "ab"), ("b", "cd")]);
        type_str(&mut p, "ab");
        p.advance();
        p.select_history(0);
        assert!(p.session().is_complete());
        assert!(p.edit(&Edit::Backspace).is_none());
        assert!(p.edit(&Edit::Insert('b')).is_none());
    }

    #[test]
    fn test_select_future_history_rejected() {
        let mut p = practice(&[("a", "ab"), ("b", "cd"), ("c", "ef")]);
        assert!(!p.select_history(1));
        assert_eq!(p.mode(), Mode::Practicing);
        assert_eq!(p.history().count(), 1);
        p.advance();
        assert_eq!(p.history().count(), 2);
    }

    #[test]
    fn test_append_generated_exits_review_and_jumps() {
        let mut p = practice(&[("a", "ab"), ("b", "cd")]);
        type_str(&mut p, "x");
        p.select_history(0);
        let index = p.append_generated(snippet("g", "gen"));
        assert_eq!(index, 2);
        assert_eq!(p.navigator().current(), 2);
        assert_eq!(p.mode(), Mode::Practicing);
        assert_eq!(p.session().target(), "gen");
        assert_eq!(p.session().text(), "");
        assert_eq!(p.typed_text(&SnippetId::new("a")), "x");
    }

    #[test]
    fn test_cleared_text_is_remembered_as_empty() {
        let mut p = practice(&[("a", "ab"), ("b", "cd")]);
        type_str(&mut p, "a");
        p.edit(&Edit::Backspace);
        p.advance();
        p.retreat();
        assert_eq!(p.session().text(), "");
    }
}
