use eframe::egui;

use super::scaler::Transform;

pub fn to_relative(p: egui::Pos2, original: egui::Vec2) -> egui::Pos2 {
    egui::pos2(p.x / original.x * 100.0, p.y / original.y * 100.0)
}

pub fn from_relative(p: egui::Pos2, original: egui::Vec2) -> egui::Pos2 {
    egui::pos2(p.x / 100.0 * original.x, p.y / 100.0 * original.y)
}

/// Display <-> original <-> relative mapping for one transform and image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Converter {
    pub transform: Transform,
    pub original: egui::Vec2,
}

impl Converter {
    pub fn new(transform: Transform, original: egui::Vec2) -> Self {
        Self {
            transform,
            original,
        }
    }

    pub fn to_original(&self, p: egui::Pos2) -> egui::Pos2 {
        ((p - self.transform.offset).to_vec2() / self.transform.scale).to_pos2()
    }

    pub fn to_display(&self, p: egui::Pos2) -> egui::Pos2 {
        (p.to_vec2() * self.transform.scale + self.transform.offset).to_pos2()
    }

    pub fn len_to_original(&self, v: egui::Vec2) -> egui::Vec2 {
        v / self.transform.scale
    }

    pub fn len_to_display(&self, v: egui::Vec2) -> egui::Vec2 {
        v * self.transform.scale
    }

    pub fn to_relative(&self, p: egui::Pos2) -> egui::Pos2 {
        to_relative(p, self.original)
    }

    pub fn from_relative(&self, p: egui::Pos2) -> egui::Pos2 {
        from_relative(p, self.original)
    }

    pub fn size_to_relative(&self, v: egui::Vec2) -> egui::Vec2 {
        to_relative(v.to_pos2(), self.original).to_vec2()
    }

    pub fn size_from_relative(&self, v: egui::Vec2) -> egui::Vec2 {
        from_relative(v.to_pos2(), self.original).to_vec2()
    }

    pub fn display_to_relative(&self, p: egui::Pos2) -> egui::Pos2 {
        self.to_relative(self.to_original(p))
    }

    pub fn relative_to_display(&self, p: egui::Pos2) -> egui::Pos2 {
        self.to_display(self.from_relative(p))
    }

    /// Carries a display-space point from `self` into `target` through
    /// relative space, so a change of image or viewport keeps its placement.
    pub fn carry(&self, p: egui::Pos2, target: &Converter) -> egui::Pos2 {
        target.relative_to_display(self.display_to_relative(p))
    }

    pub fn carry_rect(&self, rect: egui::Rect, target: &Converter) -> egui::Rect {
        egui::Rect::from_min_max(self.carry(rect.min, target), self.carry(rect.max, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worked_example() -> Converter {
        let original = egui::vec2(1600.0, 1200.0);
        let t = Transform::fit(original, egui::vec2(800.0, 600.0), 40.0).unwrap();
        Converter::new(t, original)
    }

    fn close(a: egui::Pos2, b: egui::Pos2, tol: f32) -> bool {
        (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol
    }

    #[test]
    fn display_point_maps_to_original_and_relative() {
        let c = worked_example();
        let original = c.to_original(egui::pos2(100.0, 100.0));
        assert!(close(original, egui::pos2(157.14, 171.43), 0.05));
        let rel = c.to_relative(original);
        assert!(close(rel, egui::pos2(9.82, 14.29), 0.01));
    }

    #[test]
    fn round_trip_is_exact_within_tolerance() {
        let c = worked_example();
        for &(x, y) in &[(0.0, 0.0), (26.67, 20.0), (100.0, 100.0), (799.0, 599.0), (-50.0, 1000.0)] {
            let p = egui::pos2(x, y);
            assert!(close(c.to_display(c.to_original(p)), p, 1e-3));
        }
        for &(x, y) in &[(0.0, 0.0), (1600.0, 1200.0), (157.1, 171.4)] {
            let p = egui::pos2(x, y);
            assert!(close(c.to_original(c.to_display(p)), p, 1e-3));
            assert!(close(c.from_relative(c.to_relative(p)), p, 1e-3));
        }
    }

    #[test]
    fn lengths_ignore_offset() {
        let c = worked_example();
        let v = c.len_to_display(egui::vec2(300.0, 150.0));
        assert!((v.x - 140.0).abs() < 1e-3);
        assert!((v.y - 70.0).abs() < 1e-3);
    }

    #[test]
    fn carry_keeps_relative_placement_across_viewports() {
        let small = worked_example();
        let big = Converter::new(
            Transform::fit(small.original, egui::vec2(1600.0, 1200.0), 40.0).unwrap(),
            small.original,
        );
        let p = egui::pos2(200.0, 150.0);
        let moved = small.carry(p, &big);
        assert!(close(small.display_to_relative(p), big.display_to_relative(moved), 1e-3));
        assert!(close(big.carry(moved, &small), p, 1e-3));
    }
}
