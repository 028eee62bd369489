use glam::Vec2;

/// Render surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Zero sizes are bumped to one pixel so aspect and NDC stay finite
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// True when a screen point lies on the surface (edges inclusive)
    pub fn contains(&self, screen: Vec2) -> bool {
        screen.x >= 0.0
            && screen.y >= 0.0
            && screen.x <= self.width as f32
            && screen.y <= self.height as f32
    }

    /// Screen pixels (origin top-left, y down) to normalized device coordinates
    pub fn to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x / self.width as f32) * 2.0 - 1.0,
            -(screen.y / self.height as f32) * 2.0 + 1.0,
        )
    }

    pub fn from_ndc(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
