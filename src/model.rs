use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

/// Background raster the exercise is drawn over. Dimensions are the natural
/// pixel size and never change after loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub url: String,
    pub original_width: u32,
    pub original_height: u32,
}

impl ImageInfo {
    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.original_width as f32, self.original_height as f32)
    }
}

/// Rectangular region in display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Block {
    pub fn from_rect(id: u32, rect: egui::Rect) -> Self {
        Self {
            id,
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(self.x, self.y), egui::vec2(self.width, self.height))
    }

    pub fn center(&self) -> egui::Pos2 {
        self.rect().center()
    }

    pub fn contains(&self, p: egui::Pos2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// The arrow's start point is seated on the block center.
    #[default]
    Start,
    /// The arrow's end point is seated on the block center.
    End,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArrowStyle {
    pub color: Rgba,
    pub stroke_width: f32,
    pub pointer_length: f32,
    pub pointer_width: f32,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            color: Rgba {
                r: 220,
                g: 50,
                b: 50,
                a: 255,
            },
            stroke_width: 3.0,
            pointer_length: 12.0,
            pointer_width: 10.0,
        }
    }
}

/// Directed segment in display space, anchored to one block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrow {
    pub id: u32,
    pub start: Point,
    pub end: Point,
    pub associated_block_id: u32,
    pub association: AssociationKind,
    pub style: ArrowStyle,
}

impl Arrow {
    pub fn anchored_point(&self) -> egui::Pos2 {
        match self.association {
            AssociationKind::Start => self.start.to_pos2(),
            AssociationKind::End => self.end.to_pos2(),
        }
    }

    pub fn seat_on(&mut self, center: egui::Pos2) {
        match self.association {
            AssociationKind::Start => self.start = Point::from_pos2(center),
            AssociationKind::End => self.end = Point::from_pos2(center),
        }
    }
}

/// Read-only view of one drawable object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape<'a> {
    Block { block: &'a Block, word: &'a str },
    Arrow(&'a Arrow),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockCoordinates {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub rel_x: Option<f32>,
    #[serde(default)]
    pub rel_y: Option<f32>,
    #[serde(default)]
    pub rel_width: Option<f32>,
    #[serde(default)]
    pub rel_height: Option<f32>,
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArrowCoordinates {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    #[serde(default)]
    pub rel_start_x: Option<f32>,
    #[serde(default)]
    pub rel_start_y: Option<f32>,
    #[serde(default)]
    pub rel_end_x: Option<f32>,
    #[serde(default)]
    pub rel_end_y: Option<f32>,
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
    #[serde(default)]
    pub association_type: AssociationKind,
    #[serde(default)]
    pub style: ArrowStyle,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub question_id: u32,
    pub word: String,
    pub block_coordinates: BlockCoordinates,
    #[serde(default)]
    pub has_arrow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow: Option<ArrowCoordinates>,
}

/// Payload handed to the persistence collaborator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TestPayload {
    pub image_url: String,
    pub num_blocks: usize,
    pub questions: Vec<Question>,
}

impl TestPayload {
    pub fn new(image_url: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            image_url: image_url.into(),
            num_blocks: questions.len(),
            questions,
        }
    }

    /// Image description recovered from the first question that carries
    /// dimensions.
    pub fn image_info(&self) -> Option<ImageInfo> {
        self.questions
            .iter()
            .map(|q| &q.block_coordinates)
            .find(|c| c.image_width > 0 && c.image_height > 0)
            .map(|c| ImageInfo {
                url: self.image_url.clone(),
                original_width: c.image_width,
                original_height: c.image_height,
            })
    }
}

pub fn distance_to_segment(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return (p - a).length();
    }
    let t = (ap.x * ab.x + ap.y * ab.y) / ab_len2;
    let t = t.clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}
