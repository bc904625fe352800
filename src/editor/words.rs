use std::collections::BTreeMap;

/// One label per block id. Entries are created and dropped together with
/// their block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordStore {
    words: BTreeMap<u32, String>,
}

impl WordStore {
    pub fn register(&mut self, block_id: u32) {
        self.words.entry(block_id).or_default();
    }

    pub fn set(&mut self, block_id: u32, text: impl Into<String>) -> bool {
        match self.words.get_mut(&block_id) {
            Some(word) => {
                *word = text.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, block_id: u32) -> Option<&str> {
        self.words.get(&block_id).map(String::as_str)
    }

    pub fn remove(&mut self, block_id: u32) -> Option<String> {
        self.words.remove(&block_id)
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Blocks whose word is blank, in id order.
    pub fn missing(&self) -> Vec<u32> {
        self.words
            .iter()
            .filter(|(_, text)| text.trim().is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.words.iter().map(|(id, text)| (*id, text.as_str()))
    }
}
