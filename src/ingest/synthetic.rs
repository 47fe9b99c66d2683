//! Synthetic frame source (`stub://` URLs).
//!
//! Produces blank frames at the configured size and paces them to the target
//! frame rate. Paired with the synthetic landmark source it exercises the full
//! pipeline without camera hardware.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

use crate::frame::Frame;

/// Configuration for a frame source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Source URL. Only `stub://` is built in; platform cameras plug in via `LandmarkSource`.
    pub url: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "stub://front_camera".to_string(),
            target_fps: 15,
            width: 640,
            height: 480,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

pub struct SyntheticSource {
    config: SourceConfig,
    frame_count: u64,
    connected: bool,
    last_frame_at: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if !config.url.starts_with("stub://") {
            return Err(anyhow!(
                "unsupported frame source '{}'; only stub:// is built in",
                config.url
            ));
        }
        if config.target_fps == 0 {
            return Err(anyhow!("target_fps must be >= 1"));
        }
        Ok(Self {
            config,
            frame_count: 0,
            connected: false,
            last_frame_at: None,
        })
    }

    pub fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {} (synthetic)", self.config.url);
        self.connected = true;
        Ok(())
    }

    /// Capture the next frame without pacing.
    pub fn next_frame(&mut self) -> Result<Frame> {
        if !self.connected {
            return Err(anyhow!("source {} is not connected", self.config.url));
        }
        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());
        Ok(Frame::blank(
            self.config.width,
            self.config.height,
            self.frame_count,
        ))
    }

    /// Sleep until the next frame is due, then capture it.
    pub fn next_frame_paced(&mut self) -> Result<Frame> {
        if let Some(last) = self.last_frame_at {
            let interval = self.frame_interval();
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.next_frame()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.target_fps as f64)
    }

    pub fn is_healthy(&self) -> bool {
        self.connected
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config() -> SourceConfig {
        SourceConfig {
            url: "stub://test".to_string(),
            target_fps: 30,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn synthetic_source_produces_sequenced_frames() -> Result<()> {
        let mut source = SyntheticSource::new(stub_config())?;
        source.connect()?;

        let f1 = source.next_frame()?;
        let f2 = source.next_frame()?;
        assert_eq!((f1.width, f1.height), (64, 48));
        assert_eq!(f1.sequence + 1, f2.sequence);
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn synthetic_source_requires_connect() -> Result<()> {
        let mut source = SyntheticSource::new(stub_config())?;
        assert!(!source.is_healthy());
        assert!(source.next_frame().is_err());
        Ok(())
    }

    #[test]
    fn non_stub_urls_are_rejected() {
        let config = SourceConfig {
            url: "rtsp://camera".to_string(),
            ..stub_config()
        };
        assert!(SyntheticSource::new(config).is_err());
    }
}
