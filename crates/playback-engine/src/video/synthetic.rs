//! Generated frames for dry runs and tests.

use std::f64::consts::TAU;
use std::time::Duration;

use dynso_common::error::{DynsoError, DynsoResult};
use dynso_motion_core::{Frame, Quadrant};
use image::Luma;
use imageproc::drawing::draw_filled_circle_mut;

use super::{wait_for_interrupt, InterruptFlag, KeyCode, VideoSource, ESCAPE};

const BACKGROUND: Luma<u8> = Luma([24]);
const BLOB: Luma<u8> = Luma([230]);
const ORBIT_STEPS: f64 = 60.0;

/// What the generated camera sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticScene {
    /// A bright blob circling the frame centre through every quadrant.
    Orbit,
    /// A blob in one quadrant that appears on every other frame.
    Blink(Quadrant),
    /// Nothing moves.
    Still,
}

/// Deterministic [`VideoSource`] that needs no hardware.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    scene: SyntheticScene,
    produced: u64,
    frame_limit: Option<u64>,
    fail_after: Option<u64>,
    resize_after: Option<(u64, (u32, u32))>,
    paced: bool,
    interrupt: InterruptFlag,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scene: SyntheticScene::Orbit,
            produced: 0,
            frame_limit: None,
            fail_after: None,
            resize_after: None,
            paced: true,
            interrupt: InterruptFlag::new(),
        }
    }

    pub fn with_scene(mut self, scene: SyntheticScene) -> Self {
        self.scene = scene;
        self
    }

    /// Report [`ESCAPE`] once `frames` frames have been produced.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Fail every query after `frames` frames have been produced.
    pub fn failing_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Switch to `dimensions` after `frames` frames have been produced.
    pub fn resizing_after(mut self, frames: u64, dimensions: (u32, u32)) -> Self {
        self.resize_after = Some((frames, dimensions));
        self
    }

    /// Return from `poll_key` immediately instead of waiting out the timeout.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    fn current_dimensions(&self) -> (u32, u32) {
        match self.resize_after {
            Some((after, dimensions)) if self.produced >= after => dimensions,
            _ => (self.width, self.height),
        }
    }

    fn render(&self, (width, height): (u32, u32)) -> Frame {
        let mut frame = Frame::from_pixel(width, height, BACKGROUND);
        let radius = (width.min(height) / 8).max(1) as i32;

        match self.scene {
            SyntheticScene::Orbit => {
                let orbit = f64::from(width.min(height)) / 3.0;
                let angle = self.produced as f64 * TAU / ORBIT_STEPS;
                let cx = f64::from(width) / 2.0 + orbit * angle.cos();
                let cy = f64::from(height) / 2.0 + orbit * angle.sin();
                draw_filled_circle_mut(&mut frame, (cx as i32, cy as i32), radius, BLOB);
            }
            SyntheticScene::Blink(quadrant) => {
                if self.produced % 2 == 1 {
                    let (x0, y0, x1, y1) = quadrant.bounds(width, height);
                    let centre = (((x0 + x1) / 2) as i32, ((y0 + y1) / 2) as i32);
                    draw_filled_circle_mut(&mut frame, centre, radius, BLOB);
                }
            }
            SyntheticScene::Still => {}
        }
        frame
    }
}

impl VideoSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic {:?} {}x{}", self.scene, self.width, self.height)
    }

    fn query_frame(&mut self) -> DynsoResult<Frame> {
        if self.fail_after.is_some_and(|after| self.produced >= after) {
            return Err(DynsoError::capture(format!(
                "Synthetic source failed after {} frames",
                self.produced
            )));
        }
        let frame = self.render(self.current_dimensions());
        self.produced += 1;
        Ok(frame)
    }

    fn poll_key(&mut self, timeout: Duration) -> Option<KeyCode> {
        if self.frame_limit.is_some_and(|limit| self.produced >= limit) {
            return Some(ESCAPE);
        }
        if self.paced {
            wait_for_interrupt(&self.interrupt, timeout)
        } else {
            self.interrupt.is_raised().then_some(ESCAPE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_moves_between_frames() {
        let mut source = SyntheticSource::new(64, 48).unpaced();
        let first = source.query_frame().unwrap();
        let second = source.query_frame().unwrap();
        assert_ne!(first, second);
        assert!(first.pixels().any(|p| *p == BLOB));
    }

    #[test]
    fn blink_lights_only_its_quadrant() {
        let mut source = SyntheticSource::new(64, 48)
            .with_scene(SyntheticScene::Blink(Quadrant::DownRight))
            .unpaced();
        let dark = source.query_frame().unwrap();
        let lit = source.query_frame().unwrap();

        assert!(dark.pixels().all(|p| *p == BACKGROUND));
        let (x0, y0, x1, y1) = Quadrant::DownRight.bounds(64, 48);
        for (x, y, p) in lit.enumerate_pixels() {
            if *p == BLOB {
                assert!((x0..x1).contains(&x) && (y0..y1).contains(&y));
            }
        }
    }

    #[test]
    fn frame_limit_reports_escape() {
        let mut source = SyntheticSource::new(8, 8).with_frame_limit(2).unpaced();
        source.query_frame().unwrap();
        assert_eq!(source.poll_key(Duration::ZERO), None);
        source.query_frame().unwrap();
        assert_eq!(source.poll_key(Duration::ZERO), Some(ESCAPE));
    }

    #[test]
    fn failure_and_resize_hooks() {
        let mut source = SyntheticSource::new(8, 8)
            .resizing_after(1, (10, 6))
            .failing_after(2)
            .unpaced();
        assert_eq!(source.query_frame().unwrap().dimensions(), (8, 8));
        assert_eq!(source.query_frame().unwrap().dimensions(), (10, 6));
        assert!(source.query_frame().is_err());
        assert_eq!(source.produced(), 2);
    }

    #[test]
    fn interrupt_reports_escape() {
        let flag = InterruptFlag::new();
        let mut source = SyntheticSource::new(8, 8)
            .with_interrupt(flag.clone())
            .unpaced();
        assert_eq!(source.poll_key(Duration::ZERO), None);
        flag.raise();
        assert_eq!(source.poll_key(Duration::ZERO), Some(ESCAPE));
    }
}
