use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use crate::config::ViewportConfig;
use crate::error::ViewportError;
use crate::util::is_finite;

const WHEEL_FACTOR_MIN: f32 = 0.85;
const WHEEL_FACTOR_MAX: f32 = 1.15;

/// Maps graph space to surface space: `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    pub fn to_screen(&self, world: Vec2) -> Pos2 {
        (world * self.scale + self.translate).to_pos2()
    }

    pub fn to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }
}

#[derive(Clone, Debug)]
pub struct Viewport {
    transform: Transform,
    config: ViewportConfig,
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            transform: Transform::IDENTITY,
            config,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn to_screen(&self, world: Vec2) -> Pos2 {
        self.transform.to_screen(world)
    }

    pub fn to_world(&self, screen: Pos2) -> Vec2 {
        self.transform.to_world(screen)
    }

    /// Multiplies the scale by `factor`, clamped to the configured range,
    /// keeping the graph point under `focal` fixed on screen.
    pub fn zoom_by(&mut self, factor: f32, focal: Pos2) -> Result<(), ViewportError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ViewportError::InvalidFactor(factor));
        }
        if !(focal.x.is_finite() && focal.y.is_finite()) {
            return Err(ViewportError::NonFinite { operation: "zoom" });
        }

        let world_before = self.transform.to_world(focal);
        let scale = (self.transform.scale * factor).clamp(self.config.min_scale, self.config.max_scale);
        let translate = focal.to_vec2() - world_before * scale;
        if !is_finite(translate) {
            return Err(ViewportError::NonFinite { operation: "zoom" });
        }

        self.transform = Transform { scale, translate };
        Ok(())
    }

    pub fn zoom_in(&mut self, focal: Pos2) -> Result<(), ViewportError> {
        self.zoom_by(self.config.zoom_in_step, focal)
    }

    pub fn zoom_out(&mut self, focal: Pos2) -> Result<(), ViewportError> {
        self.zoom_by(self.config.zoom_out_step, focal)
    }

    /// Scroll-wheel zoom; positive `delta` zooms in.
    pub fn wheel(&mut self, delta: f32, focal: Pos2) -> Result<(), ViewportError> {
        if !delta.is_finite() {
            return Err(ViewportError::NonFinite { operation: "wheel" });
        }
        if delta == 0.0 {
            return Ok(());
        }
        let factor = (1.0 + delta * self.config.wheel_sensitivity)
            .clamp(WHEEL_FACTOR_MIN, WHEEL_FACTOR_MAX);
        self.zoom_by(factor, focal)
    }

    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), ViewportError> {
        let translate = self.transform.translate + delta;
        if !is_finite(translate) {
            return Err(ViewportError::NonFinite { operation: "pan" });
        }
        self.transform.translate = translate;
        Ok(())
    }

    pub fn reset(&mut self) {
        debug!("viewport reset");
        self.transform = Transform::IDENTITY;
    }

    /// Pans so `world` sits at `surface_center`, keeping the current scale.
    pub fn center_on(&mut self, world: Vec2, surface_center: Pos2) -> Result<(), ViewportError> {
        let translate = surface_center.to_vec2() - world * self.transform.scale;
        if !is_finite(translate) {
            return Err(ViewportError::NonFinite {
                operation: "center",
            });
        }
        self.transform.translate = translate;
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}
