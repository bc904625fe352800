use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("no block with id {0}")]
    UnknownBlock(u32),

    #[error("no arrow with id {0}")]
    UnknownArrow(u32),
}

/// Why an arrow could not be placed. Never fatal; surfaced as a notice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("start the arrow within {radius:.0}px of a block center")]
    NoBlockInRange { radius: f32 },

    #[error("arrow is too short")]
    TooShort,

    #[error("load a background image first")]
    NoImage,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("no background image loaded")]
    NoImage,

    #[error("the exercise has no blocks")]
    NoBlocks,

    #[error("missing word for block(s) {}", join_ids(.0))]
    MissingWords(Vec<u32>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("exercise has no image dimensions")]
    MissingImageSize,

    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// Failures of the upload and persistence collaborators.
#[derive(Error, Debug)]
pub enum CollabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("test {0} not found")]
    NotFound(u64),
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_words_lists_every_block() {
        let err = ExportError::MissingWords(vec![2, 5]);
        assert_eq!(err.to_string(), "missing word for block(s) 2, 5");
    }

    #[test]
    fn placement_message_mentions_radius() {
        let err = PlacementError::NoBlockInRange { radius: 60.0 };
        assert_eq!(err.to_string(), "start the arrow within 60px of a block center");
    }
}
