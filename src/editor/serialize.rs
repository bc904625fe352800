use eframe::egui;
use tracing::{debug, info, warn};

use super::arrows::ArrowManager;
use super::blocks::BlockManager;
use super::coords::Converter;
use super::scaler::Transform;
use super::words::WordStore;
use super::{EditorState, Interaction};
use crate::error::{ExportError, ImportError};
use crate::model::{
    self, Arrow, ArrowCoordinates, Block, BlockCoordinates, ImageInfo, Question, TestPayload,
};

/// Display-space content rebuilt from saved questions.
#[derive(Clone, Debug)]
pub struct Imported {
    pub blocks: BlockManager,
    pub words: WordStore,
    pub arrows: ArrowManager,
    pub stats: ImportStats,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Question ids dropped for unusable geometry or a repeated id.
    pub skipped: Vec<u32>,
    /// Arrows dropped because their block did not survive.
    pub pruned: usize,
}

/// One question per block, ordered by block id. `original` is the natural
/// image size; a zero dimension means no image is loaded.
pub fn export_questions(
    blocks: &BlockManager,
    words: &WordStore,
    arrows: &ArrowManager,
    transform: &Transform,
    original: egui::Vec2,
) -> Result<Vec<Question>, ExportError> {
    if !(original.x > 0.0 && original.y > 0.0) {
        return Err(ExportError::NoImage);
    }
    if blocks.is_empty() {
        return Err(ExportError::NoBlocks);
    }
    let mut ordered: Vec<&Block> = blocks.blocks().iter().collect();
    ordered.sort_by_key(|b| b.id);

    let missing: Vec<u32> = ordered
        .iter()
        .filter(|b| words.get(b.id).is_none_or(|w| w.trim().is_empty()))
        .map(|b| b.id)
        .collect();
    if !missing.is_empty() {
        return Err(ExportError::MissingWords(missing));
    }

    let conv = Converter::new(*transform, original);
    let (image_width, image_height) = (original.x as u32, original.y as u32);
    let questions = ordered
        .into_iter()
        .map(|block| {
            let min = conv.to_original(block.rect().min);
            let size = conv.len_to_original(block.rect().size());
            let rel = conv.to_relative(min);
            let rel_size = conv.size_to_relative(size);
            let arrow = arrows.for_block(block.id).map(|arrow| {
                let start = conv.to_original(arrow.start.to_pos2());
                let end = conv.to_original(arrow.end.to_pos2());
                let rel_start = conv.to_relative(start);
                let rel_end = conv.to_relative(end);
                ArrowCoordinates {
                    start_x: start.x,
                    start_y: start.y,
                    end_x: end.x,
                    end_y: end.y,
                    rel_start_x: Some(rel_start.x),
                    rel_start_y: Some(rel_start.y),
                    rel_end_x: Some(rel_end.x),
                    rel_end_y: Some(rel_end.y),
                    image_width,
                    image_height,
                    association_type: arrow.association,
                    style: arrow.style,
                }
            });
            Question {
                question_id: block.id,
                word: words.get(block.id).unwrap_or_default().trim().to_string(),
                block_coordinates: BlockCoordinates {
                    x: min.x,
                    y: min.y,
                    width: size.x,
                    height: size.y,
                    rel_x: Some(rel.x),
                    rel_y: Some(rel.y),
                    rel_width: Some(rel_size.x),
                    rel_height: Some(rel_size.y),
                    image_width,
                    image_height,
                },
                has_arrow: arrow.is_some(),
                arrow,
            }
        })
        .collect();
    Ok(questions)
}

/// Factor taking absolute coordinates saved against `image_width` x
/// `image_height` onto the current image.
fn legacy_scale(image_width: u32, image_height: u32, original: egui::Vec2) -> egui::Vec2 {
    if image_width == 0 || image_height == 0 {
        return egui::Vec2::splat(1.0);
    }
    egui::vec2(original.x / image_width as f32, original.y / image_height as f32)
}

fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn block_rect(c: &BlockCoordinates, conv: &Converter) -> egui::Rect {
    let (min, size) = match (c.rel_x, c.rel_y, c.rel_width, c.rel_height) {
        (Some(x), Some(y), Some(w), Some(h)) if all_finite(&[x, y, w, h]) => (
            conv.from_relative(egui::pos2(x, y)),
            conv.size_from_relative(egui::vec2(w, h)),
        ),
        _ => {
            let k = legacy_scale(c.image_width, c.image_height, conv.original);
            (
                egui::pos2(c.x * k.x, c.y * k.y),
                egui::vec2(c.width * k.x, c.height * k.y),
            )
        }
    };
    egui::Rect::from_min_size(conv.to_display(min), conv.len_to_display(size))
}

fn arrow_points(c: &ArrowCoordinates, conv: &Converter) -> Option<(egui::Pos2, egui::Pos2)> {
    let (start, end) = match (c.rel_start_x, c.rel_start_y, c.rel_end_x, c.rel_end_y) {
        (Some(sx), Some(sy), Some(ex), Some(ey)) if all_finite(&[sx, sy, ex, ey]) => (
            conv.from_relative(egui::pos2(sx, sy)),
            conv.from_relative(egui::pos2(ex, ey)),
        ),
        _ => {
            let k = legacy_scale(c.image_width, c.image_height, conv.original);
            (
                egui::pos2(c.start_x * k.x, c.start_y * k.y),
                egui::pos2(c.end_x * k.x, c.end_y * k.y),
            )
        }
    };
    let (start, end) = (conv.to_display(start), conv.to_display(end));
    all_finite(&[start.x, start.y, end.x, end.y]).then_some((start, end))
}

/// Rebuilds display-space content for the image of size `original` shown
/// through `transform`.
///
/// Relative coordinates win over absolute ones. Questions with unusable
/// geometry or an id already taken are skipped; a `question_id` of zero gets
/// the smallest free id once every explicit id is placed.
pub fn import_questions(
    questions: &[Question],
    transform: &Transform,
    original: egui::Vec2,
    min_size: f32,
) -> Imported {
    let conv = Converter::new(*transform, original);
    let mut blocks = BlockManager::new(min_size);
    let mut words = WordStore::default();
    let mut arrows = ArrowManager::default();
    let mut stats = ImportStats::default();

    // Block id each question ended up with, by question index.
    let mut placed: Vec<Option<u32>> = vec![None; questions.len()];
    let mut deferred = Vec::new();

    for (idx, q) in questions.iter().enumerate() {
        let rect = block_rect(&q.block_coordinates, &conv);
        if q.question_id == 0 {
            deferred.push((idx, rect));
            continue;
        }
        if blocks.restore(Block::from_rect(q.question_id, rect)) {
            placed[idx] = Some(q.question_id);
        } else {
            debug!(question_id = q.question_id, "question skipped");
            stats.skipped.push(q.question_id);
        }
    }
    for (idx, rect) in deferred {
        let id = blocks.next_free_id();
        if blocks.restore(Block::from_rect(id, rect)) {
            placed[idx] = Some(id);
        } else {
            stats.skipped.push(0);
        }
    }

    for (q, id) in questions.iter().zip(&placed) {
        let Some(id) = *id else {
            if q.arrow.is_some() {
                stats.pruned += 1;
            }
            continue;
        };
        words.register(id);
        words.set(id, q.word.clone());

        let Some(coords) = &q.arrow else {
            continue;
        };
        let Some((start, end)) = arrow_points(coords, &conv) else {
            stats.pruned += 1;
            continue;
        };
        arrows.insert(Arrow {
            id: 0,
            start: model::Point::from_pos2(start),
            end: model::Point::from_pos2(end),
            associated_block_id: id,
            association: coords.association_type,
            style: coords.style,
        });
    }
    arrows.follow_blocks(blocks.blocks());

    Imported {
        blocks,
        words,
        arrows,
        stats,
    }
}

impl EditorState {
    pub fn export(&self) -> Result<Vec<Question>, ExportError> {
        let Some(image) = &self.image else {
            return Err(ExportError::NoImage);
        };
        let questions = export_questions(
            &self.blocks,
            &self.words,
            &self.arrows,
            &self.transform,
            image.size(),
        )?;
        info!(questions = questions.len(), "exported questions");
        Ok(questions)
    }

    pub fn payload(&self) -> Result<TestPayload, ExportError> {
        let questions = self.export()?;
        let url = self.image.as_ref().map(|i| i.url.clone()).unwrap_or_default();
        Ok(TestPayload::new(url, questions))
    }

    /// Replaces everything with `questions` laid over `image`.
    pub fn load_questions(
        &mut self,
        image: ImageInfo,
        questions: &[Question],
    ) -> Result<ImportStats, ImportError> {
        self.clear();
        self.set_image(image)?;
        let Some(conv) = self.converter() else {
            return Err(ImportError::MissingImageSize);
        };
        let imported = import_questions(
            questions,
            &conv.transform,
            conv.original,
            self.config.min_block_size,
        );
        self.blocks = imported.blocks;
        self.words = imported.words;
        self.arrows = imported.arrows;
        self.selection = None;
        self.interaction = Interaction::Idle;
        if !imported.stats.skipped.is_empty() || imported.stats.pruned > 0 {
            warn!(skipped = ?imported.stats.skipped, pruned = imported.stats.pruned, "import dropped content");
        }
        info!(blocks = self.blocks.len(), arrows = self.arrows.len(), "questions imported");
        Ok(imported.stats)
    }

    pub fn load_payload(&mut self, payload: &TestPayload) -> Result<ImportStats, ImportError> {
        let image = payload.image_info().ok_or(ImportError::MissingImageSize)?;
        self.load_questions(image, &payload.questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::worked_state;
    use crate::editor::{EditorConfig, Mode, PointerEvent};
    use crate::model::ArrowStyle;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-2
    }

    fn authored() -> EditorState {
        let mut state = worked_state();
        let a = state.create_block(egui::pos2(200.0, 200.0), egui::vec2(120.0, 48.0));
        let b = state.create_block(egui::pos2(500.0, 350.0), egui::vec2(80.0, 40.0));
        state.set_word(a, "cat").unwrap();
        state.set_word(b, " dog ").unwrap();
        state.set_mode(Mode::Arrow);
        state.handle_pointer(PointerEvent::Down(egui::pos2(500.0, 390.0)));
        state.handle_pointer(PointerEvent::Up(Some(egui::pos2(650.0, 500.0))));
        state
    }

    fn plain_question(id: u32, word: &str, x: f32, y: f32) -> Question {
        Question {
            question_id: id,
            word: word.to_string(),
            block_coordinates: BlockCoordinates {
                x,
                y,
                width: 100.0,
                height: 50.0,
                rel_x: None,
                rel_y: None,
                rel_width: None,
                rel_height: None,
                image_width: 1600,
                image_height: 1200,
            },
            has_arrow: false,
            arrow: None,
        }
    }

    #[test]
    fn export_orders_by_id_and_fills_both_coordinate_sets() {
        let state = authored();
        let questions = state.export().unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question_id, 1);
        assert_eq!(questions[1].word, "dog");
        let c = &questions[0].block_coordinates;
        let scale = state.transform().scale;
        assert!(close(c.width, 120.0 / scale));
        assert!(close(c.rel_x.unwrap(), c.x / 1600.0 * 100.0));
        assert_eq!((c.image_width, c.image_height), (1600, 1200));
        assert!(!questions[0].has_arrow);
        let arrow = questions[1].arrow.as_ref().unwrap();
        assert!(questions[1].has_arrow);
        let b = &questions[1].block_coordinates;
        assert!(close(arrow.start_x, b.x + b.width / 2.0));
        assert!(close(arrow.start_y, b.y + b.height / 2.0));
    }

    #[test]
    fn export_reports_every_blank_word() {
        let mut state = worked_state();
        assert_eq!(state.export(), Err(ExportError::NoBlocks));
        state.create_block(egui::pos2(100.0, 100.0), egui::vec2(40.0, 40.0));
        state.create_block(egui::pos2(300.0, 100.0), egui::vec2(40.0, 40.0));
        let c = state.create_block(egui::pos2(500.0, 100.0), egui::vec2(40.0, 40.0));
        state.set_word(c, "   ").unwrap();
        state.set_word(2, "ok").unwrap();
        assert_eq!(state.export(), Err(ExportError::MissingWords(vec![1, 3])));
    }

    #[test]
    fn export_without_image_fails() {
        let state = EditorState::new(EditorConfig::default(), ArrowStyle::default());
        assert_eq!(state.export(), Err(ExportError::NoImage));
    }

    #[test]
    fn round_trip_survives_a_different_viewport() {
        let source = authored();
        let payload = source.payload().unwrap();
        assert_eq!(payload.num_blocks, 2);

        let mut target = EditorState::new(EditorConfig::default(), ArrowStyle::default());
        target.set_viewport(egui::vec2(1280.0, 720.0));
        let stats = target.load_payload(&payload).unwrap();
        assert_eq!(stats, ImportStats::default());
        assert_eq!(target.words().get(2), Some("dog"));
        assert_eq!(target.arrows().len(), 1);

        let again = target.export().unwrap();
        for (a, b) in payload.questions.iter().zip(&again) {
            let (a, b) = (&a.block_coordinates, &b.block_coordinates);
            assert!((a.x - b.x).abs() < 1e-2 && (a.y - b.y).abs() < 1e-2);
            assert!((a.width - b.width).abs() < 1e-2);
            assert!((a.rel_height.unwrap() - b.rel_height.unwrap()).abs() < 1e-3);
        }
        let arrow = target.arrows().for_block(2).unwrap();
        assert_eq!(arrow.start.to_pos2(), target.blocks().get(2).unwrap().center());
    }

    #[test]
    fn relative_coordinates_win_over_absolute() {
        let mut q = plain_question(1, "sun", 9999.0, 9999.0);
        q.block_coordinates.rel_x = Some(50.0);
        q.block_coordinates.rel_y = Some(25.0);
        q.block_coordinates.rel_width = Some(10.0);
        q.block_coordinates.rel_height = Some(10.0);
        let t = Transform::fit(egui::vec2(1600.0, 1200.0), egui::vec2(800.0, 600.0), 40.0).unwrap();
        let imported = import_questions(&[q], &t, egui::vec2(1600.0, 1200.0), 20.0);
        let conv = Converter::new(t, egui::vec2(1600.0, 1200.0));
        let block = imported.blocks.get(1).unwrap();
        let orig = conv.to_original(block.rect().min);
        assert!(close(orig.x, 800.0) && close(orig.y, 300.0));
    }

    #[test]
    fn absolute_fallback_rescales_to_current_image() {
        let mut q = plain_question(4, "moon", 100.0, 50.0);
        q.block_coordinates.image_width = 800;
        q.block_coordinates.image_height = 600;
        let original = egui::vec2(1600.0, 1200.0);
        let t = Transform::fit(original, egui::vec2(1600.0, 1200.0), 0.0).unwrap();
        let imported = import_questions(&[q], &t, original, 20.0);
        let block = imported.blocks.get(4).unwrap();
        assert!(close(block.x, 200.0) && close(block.y, 100.0));
        assert!(close(block.width, 200.0) && close(block.height, 100.0));
    }

    #[test]
    fn duplicates_and_bad_geometry_are_skipped_and_their_arrows_pruned() {
        let mut dup = plain_question(1, "two", 400.0, 400.0);
        dup.has_arrow = true;
        dup.arrow = Some(ArrowCoordinates {
            start_x: 450.0,
            start_y: 425.0,
            end_x: 900.0,
            end_y: 900.0,
            rel_start_x: None,
            rel_start_y: None,
            rel_end_x: None,
            rel_end_y: None,
            image_width: 1600,
            image_height: 1200,
            association_type: Default::default(),
            style: ArrowStyle::default(),
        });
        let mut broken = plain_question(2, "nan", f32::NAN, 0.0);
        broken.block_coordinates.width = 100.0;
        let questions = [plain_question(1, "one", 0.0, 0.0), dup, broken];
        let original = egui::vec2(1600.0, 1200.0);
        let t = Transform::fit(original, egui::vec2(800.0, 600.0), 40.0).unwrap();
        let imported = import_questions(&questions, &t, original, 20.0);
        assert_eq!(imported.blocks.len(), 1);
        assert_eq!(imported.words.get(1), Some("one"));
        assert_eq!(imported.arrows.len(), 0);
        assert_eq!(imported.stats.skipped, vec![1, 2]);
        assert_eq!(imported.stats.pruned, 1);
    }

    #[test]
    fn zero_ids_get_the_smallest_free_id() {
        let questions = [
            plain_question(0, "first", 0.0, 0.0),
            plain_question(1, "taken", 200.0, 0.0),
            plain_question(0, "second", 400.0, 0.0),
        ];
        let original = egui::vec2(1600.0, 1200.0);
        let t = Transform::fit(original, egui::vec2(800.0, 600.0), 40.0).unwrap();
        let imported = import_questions(&questions, &t, original, 20.0);
        assert_eq!(imported.words.get(1), Some("taken"));
        assert_eq!(imported.words.get(2), Some("first"));
        assert_eq!(imported.words.get(3), Some("second"));
    }
}
