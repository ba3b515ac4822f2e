use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// The three animations cat mode plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Dance,
    Explosion,
    Confetti,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Dance, AssetKind::Explosion, AssetKind::Confetti];

    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::Dance => "cat-dance.json",
            AssetKind::Explosion => "explosion.json",
            AssetKind::Confetti => "confetti.json",
        }
    }

    /// Text drawn in place of the animation when it is not available.
    pub fn fallback_glyph(self) -> &'static str {
        match self {
            AssetKind::Dance => "🐈",
            AssetKind::Explosion => "💥",
            AssetKind::Confetti => "🎉",
        }
    }

    fn index(self) -> usize {
        match self {
            AssetKind::Dance => 0,
            AssetKind::Explosion => 1,
            AssetKind::Confetti => 2,
        }
    }
}

/// Prerecorded animation (Lottie-style JSON). Only timing and canvas are
/// read; the layer data is kept opaque.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationClip {
    #[serde(rename = "nm", default)]
    pub name: Option<String>,
    /// Frames per second.
    #[serde(rename = "fr")]
    pub frame_rate: f32,
    #[serde(rename = "ip")]
    pub in_point: f32,
    #[serde(rename = "op")]
    pub out_point: f32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    #[serde(default)]
    pub layers: Vec<serde_json::Value>,
}

impl AnimationClip {
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let clip: AnimationClip = serde_json::from_slice(raw).context("malformed animation json")?;
        ensure!(clip.frame_rate > 0.0, "frame rate must be positive, got {}", clip.frame_rate);
        ensure!(
            clip.out_point > clip.in_point,
            "empty clip: out point {} <= in point {}",
            clip.out_point,
            clip.in_point
        );
        Ok(clip)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)
            .with_context(|| format!("failed reading animation {}", path.display()))?;
        Self::from_slice(&raw).with_context(|| format!("invalid animation {}", path.display()))
    }

    pub fn frame_count(&self) -> u32 {
        ((self.out_point - self.in_point).ceil() as u32).max(1)
    }

    /// Loop length in seconds.
    pub fn duration(&self) -> f32 {
        (self.out_point - self.in_point) / self.frame_rate
    }

    /// Looping frame index at `elapsed` seconds.
    pub fn frame_at(&self, elapsed: f32) -> u32 {
        let frame = (elapsed.max(0.0) * self.frame_rate) as u32;
        frame % self.frame_count()
    }
}

/// Load state of one asset.
#[derive(Debug, Clone)]
pub enum AssetSlot {
    Pending,
    Ready(Arc<AnimationClip>),
    Failed,
}

impl AssetSlot {
    pub fn clip(&self) -> Option<&Arc<AnimationClip>> {
        match self {
            AssetSlot::Ready(clip) => Some(clip),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetSlot::Pending => "loading",
            AssetSlot::Ready(_) => "ready",
            AssetSlot::Failed => "fallback",
        }
    }
}

/// The shared animation clips, loaded in the background.
///
/// Each clip loads on its own thread and reports back over a channel; the
/// owner calls [`AssetBank::poll`] once per frame. Every cat renders from the
/// same slot, so they all switch from glyph to animation on the same frame.
pub struct AssetBank {
    slots: [AssetSlot; 3],
    rx: Option<Receiver<(AssetKind, Result<AnimationClip>)>>,
}

impl AssetBank {
    /// Start loading every clip from `dir`.
    pub fn load(dir: &Path) -> Self {
        let (tx, rx) = channel();
        for kind in AssetKind::ALL {
            let worker_tx = tx.clone();
            let path: PathBuf = dir.join(kind.file_name());
            let spawned = thread::Builder::new()
                .name(format!("asset-{}", kind.file_name()))
                .spawn(move || {
                    // Receiver may be gone if cat mode was switched off meanwhile.
                    let _ = worker_tx.send((kind, AnimationClip::load(&path)));
                });
            if let Err(e) = spawned {
                log::warn!("could not start loader for {}: {e}", kind.file_name());
                let _ = tx.send((kind, Err(anyhow::Error::new(e))));
            }
        }
        Self {
            slots: [AssetSlot::Pending, AssetSlot::Pending, AssetSlot::Pending],
            rx: Some(rx),
        }
    }

    /// Bank with every asset already failed (glyph-only rendering).
    pub fn fallback() -> Self {
        Self {
            slots: [AssetSlot::Failed, AssetSlot::Failed, AssetSlot::Failed],
            rx: None,
        }
    }

    /// Bank with the given clips already resolved.
    pub fn ready(dance: Option<AnimationClip>, explosion: Option<AnimationClip>, confetti: Option<AnimationClip>) -> Self {
        let slot = |clip: Option<AnimationClip>| match clip {
            Some(clip) => AssetSlot::Ready(Arc::new(clip)),
            None => AssetSlot::Failed,
        };
        Self {
            slots: [slot(dance), slot(explosion), slot(confetti)],
            rx: None,
        }
    }

    /// Collect finished loads. Returns true if any slot changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.rx else {
            return false;
        };
        let mut changed = false;
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok((kind, Ok(clip))) => {
                    log::info!(
                        "Loaded {} ({} frames @ {} fps)",
                        kind.file_name(),
                        clip.frame_count(),
                        clip.frame_rate
                    );
                    self.slots[kind.index()] = AssetSlot::Ready(Arc::new(clip));
                    changed = true;
                }
                Ok((kind, Err(e))) => {
                    log::warn!("{} unavailable, using {}: {e:#}", kind.file_name(), kind.fallback_glyph());
                    self.slots[kind.index()] = AssetSlot::Failed;
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            // Every loader reported; anything still pending never will.
            for slot in &mut self.slots {
                if matches!(slot, AssetSlot::Pending) {
                    *slot = AssetSlot::Failed;
                    changed = true;
                }
            }
            self.rx = None;
        }
        changed
    }

    pub fn slot(&self, kind: AssetKind) -> &AssetSlot {
        &self.slots[kind.index()]
    }

    pub fn clip(&self, kind: AssetKind) -> Option<&Arc<AnimationClip>> {
        self.slot(kind).clip()
    }

    /// True once no slot is pending.
    pub fn settled(&self) -> bool {
        self.slots.iter().all(|s| !matches!(s, AssetSlot::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    const CLIP: &str = r#"{"v":"5.7.4","nm":"dance","fr":30,"ip":0,"op":60,"w":200,"h":200,"layers":[]}"#;

    fn wait_settled(bank: &mut AssetBank) {
        let start = Instant::now();
        while !bank.settled() && start.elapsed() < Duration::from_secs(5) {
            bank.poll();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn parses_timing() {
        let clip = AnimationClip::from_slice(CLIP.as_bytes()).unwrap();
        assert_eq!(clip.name.as_deref(), Some("dance"));
        assert_eq!(clip.frame_count(), 60);
        assert!((clip.duration() - 2.0).abs() < 1e-6);
        assert_eq!(clip.frame_at(0.5), 15);
        assert_eq!(clip.frame_at(2.5), 15);
    }

    #[test]
    fn rejects_empty_or_frozen_clips() {
        assert!(AnimationClip::from_slice(br#"{"fr":0,"ip":0,"op":10,"w":1,"h":1}"#).is_err());
        assert!(AnimationClip::from_slice(br#"{"fr":30,"ip":10,"op":10,"w":1,"h":1}"#).is_err());
        assert!(AnimationClip::from_slice(b"<html>404</html>").is_err());
    }

    #[test]
    fn missing_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cat-dance.json"), CLIP).unwrap();

        let mut bank = AssetBank::load(dir.path());
        wait_settled(&mut bank);

        assert!(bank.clip(AssetKind::Dance).is_some());
        assert!(matches!(bank.slot(AssetKind::Explosion), AssetSlot::Failed));
        assert!(matches!(bank.slot(AssetKind::Confetti), AssetSlot::Failed));
    }

    #[test]
    fn fallback_bank_is_settled() {
        let bank = AssetBank::fallback();
        assert!(bank.settled());
        assert!(bank.clip(AssetKind::Dance).is_none());
        assert_eq!(AssetKind::Dance.fallback_glyph(), "🐈");
    }

    #[test]
    fn ready_bank_mixes_clips_and_fallbacks() {
        let clip = AnimationClip::from_slice(CLIP.as_bytes()).unwrap();
        let mut bank = AssetBank::ready(Some(clip), None, None);
        assert!(bank.settled());
        assert!(!bank.poll());
        assert_eq!(bank.clip(AssetKind::Dance).map(|c| c.frame_count()), Some(60));
        assert_eq!(bank.slot(AssetKind::Explosion).label(), "fallback");
        assert!(bank.clip(AssetKind::Confetti).is_none());
    }

    #[test]
    fn bundled_clips_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let mut bank = AssetBank::load(&dir);
        wait_settled(&mut bank);
        for kind in AssetKind::ALL {
            assert_eq!(bank.slot(kind).label(), "ready", "{}", kind.file_name());
        }
    }
}
