//! `DataCoords`: a panel's data-space bounding box, recomputed from its
//! visuals' `Pos` props whenever one of them changes and the panel has
//! auto-fit enabled.

use crate::visual::{PropType, Visual};

/// An axis-aligned bounding box in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataCoords {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl DataCoords {
    /// The empty box: any real point extends it on first `include`.
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    /// Whether this box has never been extended by a point.
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    fn include(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Center of the box (zero for an empty box).
    pub fn center(&self) -> [f32; 3] {
        if self.is_empty() {
            return [0.0; 3];
        }
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Half-extent of the box along each axis (zero for an empty or
    /// degenerate box).
    pub fn half_extent(&self) -> [f32; 3] {
        if self.is_empty() {
            return [0.0; 3];
        }
        [
            (self.max[0] - self.min[0]) * 0.5,
            (self.max[1] - self.min[1]) * 0.5,
            (self.max[2] - self.min[2]) * 0.5,
        ]
    }

    /// Grow every axis's half-extent to the largest one present — the
    /// "make cubic" option panels with a 3D controller use so a non-cubic
    /// dataset doesn't appear squashed under a uniform-scale camera.
    pub fn make_cubic(&mut self) {
        if self.is_empty() {
            return;
        }
        let c = self.center();
        let half = self.half_extent();
        let largest = half[0].max(half[1]).max(half[2]).max(f32::MIN_POSITIVE);
        for i in 0..3 {
            self.min[i] = c[i] - largest;
            self.max[i] = c[i] + largest;
        }
    }

    /// Recompute by scanning every `Pos` prop across `visuals`.
    ///
    /// `cubic` applies [`DataCoords::make_cubic`] afterward — set for
    /// panels driven by a 3D controller (`Arcball`/`Turntable`/`Fly`/`Fps`/`Axes3D`),
    /// since those project a single uniform zoom onto all three axes.
    pub fn fit(visuals: &[Visual], cubic: bool) -> Self {
        let mut bounds = Self::empty();
        for visual in visuals {
            for prop in &visual.props {
                if prop.prop_type != PropType::Pos {
                    continue;
                }
                let data = prop.effective_array();
                for chunk in data.chunks_exact(12) {
                    let p = [
                        f32::from_le_bytes(chunk[0..4].try_into().unwrap()),
                        f32::from_le_bytes(chunk[4..8].try_into().unwrap()),
                        f32::from_le_bytes(chunk[8..12].try_into().unwrap()),
                    ];
                    bounds.include(p);
                }
            }
        }
        if cubic {
            bounds.make_cubic();
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::{BakeKind, CopyPolicy, DType, Prop};

    fn visual_with_positions(points: &[[f32; 3]]) -> Visual {
        let mut visual = Visual::new(crate::graphics::GraphicsType::Point, BakeKind::Default);
        let mut prop = Prop::new(PropType::Pos, 0, DType::F32x3, 0, 0, CopyPolicy::Single);
        let mut bytes = Vec::new();
        for p in points {
            bytes.extend_from_slice(bytemuck::bytes_of(p));
        }
        prop.set(&bytes);
        visual.add_prop(prop);
        visual
    }

    #[test]
    fn fit_computes_bounding_box_across_visuals() {
        let v1 = visual_with_positions(&[[0.0, 0.0, 0.0], [2.0, 1.0, 0.0]]);
        let v2 = visual_with_positions(&[[-1.0, 3.0, 0.5]]);
        let bounds = DataCoords::fit(&[v1, v2], false);
        assert_eq!(bounds.min, [-1.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [2.0, 3.0, 0.5]);
    }

    #[test]
    fn make_cubic_equalizes_half_extents() {
        let v = visual_with_positions(&[[0.0, 0.0, 0.0], [10.0, 1.0, 1.0]]);
        let bounds = DataCoords::fit(&[v], true);
        let half = bounds.half_extent();
        assert_eq!(half[0], half[1]);
        assert_eq!(half[1], half[2]);
        assert_eq!(half[0], 5.0);
    }

    #[test]
    fn empty_box_has_zero_center_and_extent() {
        let bounds = DataCoords::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), [0.0; 3]);
        assert_eq!(bounds.half_extent(), [0.0; 3]);
    }
}
