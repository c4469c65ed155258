use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

/// Element rectangle in CSS pixels, relative to the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box worth drawing: finite coordinates and a positive area.
    pub fn is_drawable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Page-automation capability driven by the execution engine.
///
/// A surface is one exclusively owned session: methods take `&mut self` and
/// [`AutomationSurface::close`] is called exactly once when a run ends.
#[async_trait]
pub trait AutomationSurface: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SurfaceError>;

    async fn click(&mut self, selector: &str) -> Result<(), SurfaceError>;

    /// Replaces the element's current value with `value`.
    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), SurfaceError>;

    /// Suspends the current run only; other tasks keep running.
    async fn wait(&mut self, duration: Duration) -> Result<(), SurfaceError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// PNG-encoded snapshot of the viewport.
    async fn snapshot(&mut self) -> Result<Vec<u8>, SurfaceError>;

    /// Serialized markup of the current document.
    async fn content(&mut self) -> Result<String, SurfaceError>;

    /// Bounding box of the first element matching `selector`, `None` if
    /// nothing matches.
    async fn locate(&mut self, selector: &str) -> Result<Option<BoundingBox>, SurfaceError>;

    async fn close(&mut self) -> Result<(), SurfaceError>;
}
