use std::fs;
use std::path::Path;

use crate::engine::Engine;
use crate::error::LoadError;
use crate::scheduler::{FrameClock, RunToken, Scheduler};

/// A non-empty program image on its way to the engine.
///
/// The harness keeps no copy: [`ProgramImage::into_bytes`] moves the bytes
/// into the engine's `load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    bytes: Vec<u8>,
}

impl ProgramImage {
    pub fn new(bytes: Vec<u8>) -> Result<Self, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::EmptyOrUnreadableFile {
                path: None,
                source: None,
            });
        }
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads user-selected program files and starts them through the scheduler.
///
/// A failed read never reaches the scheduler, so whatever was running keeps
/// running.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgramLoader;

impl ProgramLoader {
    pub fn read(path: Option<&Path>) -> Result<ProgramImage, LoadError> {
        let path = path.ok_or(LoadError::NoFileSelected)?;
        let bytes = fs::read(path).map_err(|err| LoadError::EmptyOrUnreadableFile {
            path: Some(path.to_path_buf()),
            source: Some(err),
        })?;
        ProgramImage::new(bytes).map_err(|_| LoadError::EmptyOrUnreadableFile {
            path: Some(path.to_path_buf()),
            source: None,
        })
    }

    pub fn load<E: Engine, C: FrameClock>(
        scheduler: &mut Scheduler<E, C>,
        path: Option<&Path>,
    ) -> Result<RunToken, LoadError> {
        let image = Self::read(path)?;
        if let Some(path) = path {
            log::info!("Loading '{}' ({} bytes)", path.display(), image.len());
        }
        Ok(scheduler.restart(image)?)
    }

    /// Bytes already read by the host, e.g. through a browser `FileReader`.
    pub fn load_bytes<E: Engine, C: FrameClock>(
        scheduler: &mut Scheduler<E, C>,
        bytes: Vec<u8>,
    ) -> Result<RunToken, LoadError> {
        let image = ProgramImage::new(bytes)?;
        Ok(scheduler.restart(image)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::scheduler::{CadenceConfig, RefreshQueue};
    use crate::testing::{Call, RecordingEngine};
    use std::path::PathBuf;

    fn scheduler() -> Scheduler<RecordingEngine, RefreshQueue> {
        Scheduler::new(
            RecordingEngine::default(),
            RefreshQueue::default(),
            CadenceConfig::new(2).unwrap(),
        )
    }

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "framepump-loader-{}-{}",
            std::process::id(),
            name
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn empty_image_is_refused() {
        assert!(matches!(
            ProgramImage::new(Vec::new()),
            Err(LoadError::EmptyOrUnreadableFile { .. })
        ));
    }

    #[test]
    fn nothing_selected_leaves_run_untouched() {
        let mut sched = scheduler();
        let token = sched.restart(ProgramImage::new(vec![1]).unwrap()).unwrap();
        sched.engine_mut().clear();

        let err = ProgramLoader::load(&mut sched, None).unwrap_err();
        assert!(matches!(err, LoadError::NoFileSelected));
        assert!(sched.engine().calls().is_empty());
        assert_eq!(sched.live_token(), Some(token));
        assert!(sched.clock().is_pending());
    }

    #[test]
    fn empty_file_never_reaches_engine() {
        let mut sched = scheduler();
        let token = sched.restart(ProgramImage::new(vec![1]).unwrap()).unwrap();
        sched.engine_mut().clear();

        let path = temp_file("empty.ch8", &[]);
        let err = ProgramLoader::load(&mut sched, Some(&path)).unwrap_err();
        fs::remove_file(&path).ok();

        assert!(matches!(err, LoadError::EmptyOrUnreadableFile { .. }));
        assert!(sched.engine().calls().is_empty());
        assert_eq!(sched.live_token(), Some(token));

        let mut fb = FrameBuffer::new(1, 1);
        assert_eq!(sched.pump(&mut fb), Some(crate::Iteration::Ran));
    }

    #[test]
    fn empty_bytes_never_reach_engine() {
        let mut sched = scheduler();
        let err = ProgramLoader::load_bytes(&mut sched, Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::EmptyOrUnreadableFile { .. }));
        assert!(sched.engine().calls().is_empty());
        assert_eq!(sched.live_token(), None);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let mut sched = scheduler();
        let path = std::env::temp_dir().join("framepump-loader-does-not-exist.ch8");
        let err = ProgramLoader::load(&mut sched, Some(&path)).unwrap_err();
        match err {
            LoadError::EmptyOrUnreadableFile { path: p, source } => {
                assert_eq!(p.as_deref(), Some(path.as_path()));
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sched.engine().calls().is_empty());
    }

    #[test]
    fn file_is_loaded_and_started() {
        let mut sched = scheduler();
        let path = temp_file("game.ch8", &[0xA2, 0x2A]);
        let token = ProgramLoader::load(&mut sched, Some(&path)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(sched.live_token(), Some(token));
        assert_eq!(
            sched.engine().calls(),
            vec![Call::Reset, Call::Load(vec![0xA2, 0x2A])]
        );
    }

    #[test]
    fn rejection_is_reported_as_load_error() {
        let mut sched = scheduler();
        sched.engine_mut().reject_next = true;
        let err = ProgramLoader::load_bytes(&mut sched, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, LoadError::LoadRejected(_)));
        assert_eq!(sched.live_token(), None);
    }
}
