//! Render surface management.
//!
//! [`RenderSurface`] owns the single drawable raster of a session. Frames are
//! placed according to a [`PlacementPolicy`] chosen when the surface is built,
//! and presentation is last-writer-wins on the message sequence number so a
//! slow decode can never drag the view back to an older frame.

pub mod panel;

pub use crate::config::PlacementPolicy;
pub use panel::{MetricsPanel, PLACEHOLDER};

use crate::config::RenderConfig;
use crate::frame::DecodedFrame;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Where a frame was drawn on the surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Aspect-preserving, centered placement of a `frame_w`×`frame_h` image
    /// inside a `surface_w`×`surface_h` surface (letterbox or pillarbox).
    ///
    /// # Example
    ///
    /// ```
    /// use pitchlens::render::Placement;
    ///
    /// // 16:9 frame on a 4:3 surface gets bars above and below
    /// let p = Placement::letterbox(640, 480, 1920, 1080);
    /// assert_eq!((p.width, p.height), (640, 360));
    /// assert_eq!((p.x, p.y), (0, 60));
    /// ```
    pub fn letterbox(surface_w: u32, surface_h: u32, frame_w: u32, frame_h: u32) -> Self {
        if frame_w == 0 || frame_h == 0 || surface_w == 0 || surface_h == 0 {
            return Self {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            };
        }
        let scale = f64::min(
            surface_w as f64 / frame_w as f64,
            surface_h as f64 / frame_h as f64,
        );
        let width = ((frame_w as f64 * scale).round() as u32).clamp(1, surface_w);
        let height = ((frame_h as f64 * scale).round() as u32).clamp(1, surface_h);
        Self {
            x: (surface_w - width) / 2,
            y: (surface_h - height) / 2,
            width,
            height,
        }
    }
}

/// Result of a [`RenderSurface::present`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Frame was drawn at the given placement
    Presented(Placement),
    /// A frame with a higher sequence number is already on screen
    Superseded { presented: u64 },
}

/// The single drawable surface of a session.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    canvas: RgbaImage,
    base_width: u32,
    base_height: u32,
    policy: PlacementPolicy,
    background: Rgba<u8>,
    presented_seq: Option<u64>,
    placement: Option<Placement>,
}

impl RenderSurface {
    pub fn new(config: &RenderConfig) -> Self {
        let background = Rgba(config.background);
        Self {
            canvas: RgbaImage::from_pixel(config.width, config.height, background),
            base_width: config.width,
            base_height: config.height,
            policy: config.placement,
            background,
            presented_seq: None,
            placement: None,
        }
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Current surface contents
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Sequence number of the frame currently on screen
    pub fn presented_seq(&self) -> Option<u64> {
        self.presented_seq
    }

    /// Placement of the frame currently on screen
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// Paint `frame` if `seq` is not older than what is already shown.
    ///
    /// Re-presenting the current sequence number repaints the same contents.
    pub fn present(&mut self, seq: u64, frame: &DecodedFrame) -> PresentOutcome {
        if let Some(presented) = self.presented_seq {
            if seq < presented {
                return PresentOutcome::Superseded { presented };
            }
        }

        let placement = match self.policy {
            PlacementPolicy::Letterbox => self.paint_letterboxed(frame),
            PlacementPolicy::ResizeToFrame => self.paint_native(frame),
        };
        self.presented_seq = Some(seq);
        self.placement = Some(placement);
        PresentOutcome::Presented(placement)
    }

    /// Clear the surface and forget the presented sequence, for a new session.
    pub fn reset(&mut self) {
        if self.canvas.dimensions() != (self.base_width, self.base_height) {
            self.canvas = RgbaImage::from_pixel(self.base_width, self.base_height, self.background);
        } else {
            self.clear();
        }
        self.presented_seq = None;
        self.placement = None;
    }

    /// Write the surface to an image file; format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.canvas.save(path)
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = self.background;
        }
    }

    fn paint_letterboxed(&mut self, frame: &DecodedFrame) -> Placement {
        self.clear();
        let placement = Placement::letterbox(
            self.canvas.width(),
            self.canvas.height(),
            frame.width(),
            frame.height(),
        );
        if placement.width == 0 || placement.height == 0 {
            return placement;
        }
        if (placement.width, placement.height) == (frame.width(), frame.height()) {
            imageops::replace(
                &mut self.canvas,
                &frame.image,
                placement.x as i64,
                placement.y as i64,
            );
        } else {
            let scaled = imageops::resize(
                &frame.image,
                placement.width,
                placement.height,
                FilterType::Triangle,
            );
            imageops::replace(&mut self.canvas, &scaled, placement.x as i64, placement.y as i64);
        }
        placement
    }

    fn paint_native(&mut self, frame: &DecodedFrame) -> Placement {
        if self.canvas.dimensions() != (frame.width(), frame.height()) {
            self.canvas = RgbaImage::from_pixel(frame.width(), frame.height(), self.background);
        } else {
            self.clear();
        }
        imageops::replace(&mut self.canvas, &frame.image, 0, 0);
        Placement {
            x: 0,
            y: 0,
            width: frame.width(),
            height: frame.height(),
        }
    }
}
