use super::arrows::ArrowManager;
use super::blocks::BlockManager;
use super::controller::Selection;
use super::coords::Converter;
use super::words::WordStore;

const LIMIT: usize = 200;

/// Editable content as it was before a change, together with the converter
/// it was recorded under.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub blocks: BlockManager,
    pub words: WordStore,
    pub arrows: ArrowManager,
    pub selection: Option<Selection>,
    pub converter: Option<Converter>,
}

#[derive(Clone, Debug, Default)]
pub struct History {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
}

impl History {
    pub fn record(&mut self, snapshot: Snapshot) {
        self.past.push(snapshot);
        if self.past.len() > LIMIT {
            let overflow = self.past.len() - LIMIT;
            self.past.drain(0..overflow);
        }
        self.future.clear();
    }

    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let prev = self.past.pop()?;
        self.future.push(current);
        Some(prev)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(words: &[(u32, &str)]) -> Snapshot {
        let mut store = WordStore::default();
        for (id, text) in words {
            store.register(*id);
            store.set(*id, *text);
        }
        Snapshot {
            blocks: BlockManager::new(20.0),
            words: store,
            arrows: ArrowManager::default(),
            selection: None,
            converter: None,
        }
    }

    #[test]
    fn undo_then_redo_walks_both_stacks() {
        let mut h = History::default();
        h.record(snapshot(&[(1, "a")]));
        let prev = h.undo(snapshot(&[(1, "b")])).unwrap();
        assert_eq!(prev.words.get(1), Some("a"));
        assert!(h.can_redo());
        let next = h.redo(prev).unwrap();
        assert_eq!(next.words.get(1), Some("b"));
        assert!(!h.can_redo());
    }

    #[test]
    fn recording_clears_redo_and_caps_length() {
        let mut h = History::default();
        for _ in 0..(LIMIT + 10) {
            h.record(snapshot(&[]));
        }
        assert_eq!(h.past.len(), LIMIT);
        let _ = h.undo(snapshot(&[]));
        h.record(snapshot(&[]));
        assert!(!h.can_redo());
    }
}
