//! Per-user state between runs.

use ahash::AHashMap;

use crate::{pipeline::RunOutcome, table::FeatureTable};

/// The survey a user is working on and the result of their last run.
#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    source: Option<FeatureTable>,
    last: Option<RunOutcome>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), source: None, last: None }
    }

    #[inline] pub fn id(&self) -> &str { &self.id }

    /// The table as fetched from the survey host.
    #[inline] pub fn source(&self) -> Option<&FeatureTable> { self.source.as_ref() }

    /// Result of the last successful run.
    #[inline] pub fn last(&self) -> Option<&RunOutcome> { self.last.as_ref() }

    /// The table to publish, if a run has completed.
    pub fn augmented(&self) -> Option<&FeatureTable> {
        self.last.as_ref().map(|outcome| &outcome.augmented)
    }

    /// Start over with a new source table.
    pub fn load(&mut self, table: FeatureTable) {
        self.reset();
        self.source = Some(table);
    }

    /// Forget the last run; the source table is kept.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Replace the last run wholesale.
    pub(crate) fn replace(&mut self, outcome: RunOutcome) -> &RunOutcome {
        self.reset();
        self.last.insert(outcome)
    }
}

/// Sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: AHashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    /// The session for `id`, created empty on first use.
    pub fn open(&mut self, id: &str) -> &mut Session {
        self.sessions.entry(id.to_string()).or_insert_with(|| Session::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&Session> { self.sessions.get(id) }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> { self.sessions.get_mut(id) }

    pub fn close(&mut self, id: &str) -> Option<Session> { self.sessions.remove(id) }

    #[inline] pub fn len(&self) -> usize { self.sessions.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_opens_each_id_once() {
        let mut store = SessionStore::new();
        store.open("a").load(FeatureTable::from_csv_bytes(b"x\n1\n").unwrap());
        store.open("b");
        assert_eq!(store.len(), 2);
        assert!(store.open("a").source().is_some());
        assert!(store.get("b").unwrap().source().is_none());
        assert!(store.close("a").is_some());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn new_session_has_nothing_to_publish() {
        let session = Session::new("s");
        assert_eq!(session.id(), "s");
        assert!(session.augmented().is_none());
    }
}
