//! Draw and filter settings for renderer draws
//!
//! A draw selects visible renderers by render queue range and shader pass,
//! then orders them: opaque front-to-back for early depth rejection,
//! transparent back-to-front for correct blending.

use crate::render::materials::render_queue;
use crate::render::visibility::VisibleRenderer;

/// Shader pass tags used by the built-in pipelines
pub mod shader_pass {
    /// Forward lit/unlit shading
    pub const FORWARD: &str = "Forward";
    /// G-buffer fill for deferred shading
    pub const GBUFFER: &str = "GBuffer";
}

/// Renderer sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// By queue, then front-to-back
    CommonOpaque,
    /// By queue, then back-to-front
    CommonTransparent,
    /// Visibility order
    None,
}

/// Inclusive range of render queue values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueRange {
    /// Lowest queue value included
    pub min: i32,
    /// Highest queue value included
    pub max: i32,
}

impl QueueRange {
    /// Queues up to and including [`render_queue::GEOMETRY_LAST`]
    pub const OPAQUE: Self = Self {
        min: 0,
        max: render_queue::GEOMETRY_LAST,
    };

    /// Queues after [`render_queue::GEOMETRY_LAST`]
    pub const TRANSPARENT: Self = Self {
        min: render_queue::GEOMETRY_LAST + 1,
        max: 5000,
    };

    /// Every queue
    pub const ALL: Self = Self { min: 0, max: 5000 };

    /// Check if `queue` is inside the range
    pub fn contains(&self, queue: i32) -> bool {
        (self.min..=self.max).contains(&queue)
    }
}

/// How selected renderers are drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSettings {
    /// Shader pass tag a material must provide
    pub pass: String,
    /// Sort order
    pub sort: SortMode,
}

impl DrawSettings {
    /// Draw with `pass` in `sort` order
    pub fn new(pass: &str, sort: SortMode) -> Self {
        Self {
            pass: pass.to_string(),
            sort,
        }
    }
}

/// Which renderers a draw considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    /// Render queue range
    pub queue: QueueRange,
}

impl FilterSettings {
    /// Opaque queues only
    pub fn opaque() -> Self {
        Self {
            queue: QueueRange::OPAQUE,
        }
    }

    /// Transparent queues only
    pub fn transparent() -> Self {
        Self {
            queue: QueueRange::TRANSPARENT,
        }
    }
}

/// Order renderers in place for `mode`
pub fn sort_renderers(renderers: &mut [&VisibleRenderer], mode: SortMode) {
    match mode {
        SortMode::CommonOpaque => renderers.sort_by(|a, b| {
            a.render_queue
                .cmp(&b.render_queue)
                .then_with(|| a.distance.total_cmp(&b.distance))
        }),
        SortMode::CommonTransparent => renderers.sort_by(|a, b| {
            a.render_queue
                .cmp(&b.render_queue)
                .then_with(|| b.distance.total_cmp(&a.distance))
        }),
        SortMode::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::MaterialHandle;

    fn renderer(object_index: usize, render_queue: i32, distance: f32) -> VisibleRenderer {
        VisibleRenderer {
            object_index,
            material: MaterialHandle::default(),
            render_queue,
            distance,
        }
    }

    #[test]
    fn test_queue_ranges_split_at_geometry_last() {
        assert!(QueueRange::OPAQUE.contains(2000));
        assert!(QueueRange::OPAQUE.contains(2500));
        assert!(!QueueRange::OPAQUE.contains(2501));
        assert!(QueueRange::TRANSPARENT.contains(3000));
        assert!(!QueueRange::TRANSPARENT.contains(2000));
    }

    #[test]
    fn test_opaque_sorts_front_to_back() {
        let (far, near) = (renderer(0, 2000, 20.0), renderer(1, 2000, 5.0));
        let mut list = vec![&far, &near];
        sort_renderers(&mut list, SortMode::CommonOpaque);
        assert_eq!(list[0].object_index, 1);
    }

    #[test]
    fn test_transparent_sorts_back_to_front() {
        let (near, far) = (renderer(0, 3000, 5.0), renderer(1, 3000, 20.0));
        let mut list = vec![&near, &far];
        sort_renderers(&mut list, SortMode::CommonTransparent);
        assert_eq!(list[0].object_index, 1);
    }

    #[test]
    fn test_queue_takes_priority_over_distance() {
        let (alpha_test, geometry) = (renderer(0, 2450, 1.0), renderer(1, 2000, 50.0));
        let mut list = vec![&alpha_test, &geometry];
        sort_renderers(&mut list, SortMode::CommonOpaque);
        assert_eq!(list[0].object_index, 1);
    }
}
