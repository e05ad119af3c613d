use std::time::{Duration, Instant};

use log::info;
use ndarray::{Array2, Array3};
use serde_derive::{Deserialize, Serialize};

use crate::error::DcapError;
use crate::image::Frame;
use crate::pipeline::{process_frame, Filters, Viewport};

/// A source of raw, aligned color/depth frame pairs.
///
/// Device enumeration and backend selection live outside the core: a capture
/// backend opens its hardware and hands the pipeline one of these. Returning
/// `Ok(None)` ends the recording.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<(Array3<u8>, Array2<f32>)>, DcapError>;
}

/// Recording configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Recording length in seconds; 0 records until the source is exhausted.
    pub duration: u64,
    /// Seconds to wait before the first frame; 0 starts immediately.
    pub delay: u64,
    /// Upper bound on captured frames per second; 0 captures as many frames
    /// as possible.
    pub rate: f32,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            duration: 0,
            delay: 0,
            rate: 0.0,
        }
    }
}

/// Summary of one recording run.
#[derive(Clone, Copy, Debug)]
pub struct RecordStats {
    pub frames: usize,
    pub elapsed: Duration,
}

impl RecordStats {
    pub fn fps(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.frames as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Records a sequence of RGB-D frames.
///
/// Each frame pulled from `source` runs through [process_frame] and the
/// resulting datapoint (color, depth, normals, mask) is handed to `sink`.
/// Recording stops when the source is exhausted or the configured duration
/// passes; the frame rate cap is enforced by sleeping between frames.
pub fn record<S, F>(
    source: &mut S,
    config: &RecordConfig,
    viewport: &Viewport,
    filters: &Filters,
    mut sink: F,
) -> Result<RecordStats, DcapError>
where
    S: FrameSource,
    F: FnMut(Frame),
{
    info!(
        "recording: filters skin={} noise={}, viewport x=({},W-{}) y=({},H-{}) z=({},{})",
        filters.skin,
        filters.noise,
        viewport.left,
        viewport.right,
        viewport.top,
        viewport.bottom,
        viewport.near,
        viewport.far
    );

    if config.delay > 0 {
        info!("starting in {} seconds", config.delay);
        std::thread::sleep(Duration::from_secs(config.delay));
    }

    let start = Instant::now();
    let mut last_frame = start;
    let mut frames = 0usize;

    while let Some((color, depth)) = source.next_frame()? {
        let frame = process_frame(&color.view(), &depth.view(), viewport, filters)?;
        sink(frame);
        frames += 1;

        if config.duration > 0 && start.elapsed() >= Duration::from_secs(config.duration) {
            info!("recording completed");
            break;
        }

        if config.rate > 0.0 {
            let between_frames = Duration::from_secs_f32(1.0 / config.rate);
            let since_last = last_frame.elapsed();
            if between_frames > since_last {
                std::thread::sleep(between_frames - since_last);
            }
        }
        last_frame = Instant::now();
    }

    let stats = RecordStats {
        frames,
        elapsed: start.elapsed(),
    };
    info!(
        "processed {} frames in {:.2}s at {:.1} fps",
        stats.frames,
        stats.elapsed.as_secs_f64(),
        stats.fps()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3};

    use crate::unit_test::neutral_color;

    use super::*;

    struct SyntheticSource {
        remaining: usize,
    }

    impl FrameSource for SyntheticSource {
        fn next_frame(&mut self) -> Result<Option<(Array3<u8>, Array2<f32>)>, DcapError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some((
                neutral_color(8, 8),
                Array2::from_elem((8, 8), 1000.0),
            )))
        }
    }

    #[test]
    fn test_record_drains_finite_source() {
        let mut source = SyntheticSource { remaining: 5 };
        let viewport = Viewport::new(0, 0, 0, 0, 500.0, 1500.0);
        let filters = Filters {
            skin: false,
            noise: false,
        };

        let mut sunk = 0;
        let stats = record(
            &mut source,
            &RecordConfig::default(),
            &viewport,
            &filters,
            |frame| {
                assert_eq!(frame.width(), 8);
                sunk += 1;
            },
        )
        .unwrap();

        assert_eq!(stats.frames, 5);
        assert_eq!(sunk, 5);
    }

    #[test]
    fn test_record_propagates_source_errors() {
        struct FailingSource;
        impl FrameSource for FailingSource {
            fn next_frame(&mut self) -> Result<Option<(Array3<u8>, Array2<f32>)>, DcapError> {
                Err(DcapError::invalid_parameter("device unplugged"))
            }
        }

        let result = record(
            &mut FailingSource,
            &RecordConfig::default(),
            &Viewport::default(),
            &Filters::default(),
            |_| {},
        );
        assert!(result.is_err());
    }
}
