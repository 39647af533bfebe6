//! Reloads the custom shader when its files change on disk.

use std::path::PathBuf;

use log::debug;

use atlas_core::{Changes, Frame, FrameObserver, MiscSettings};

use crate::watcher::FileWatcher;

/// Requests a misc re-apply whenever the custom shader or its image changes.
#[derive(Debug)]
pub struct ShaderHotReload {
    watcher: FileWatcher,
}

impl ShaderHotReload {
    /// Watch the shader files named by `misc`. `None` if there is nothing to
    /// watch.
    pub fn new(misc: &MiscSettings) -> Option<Self> {
        let files = watched_files(misc);
        if files.is_empty() {
            return None;
        }
        FileWatcher::new(&files).map(|watcher| Self { watcher })
    }
}

impl FrameObserver for ShaderHotReload {
    fn before_frame(&mut self) -> Changes {
        if !self.watcher.take_changed() {
            return Changes::empty();
        }
        for path in self.watcher.drain_paths() {
            debug!("shader reload: {} changed", path.display());
        }
        Changes::MISC
    }

    fn after_frame(&mut self, _frame: &mut Frame) {}
}

fn watched_files(misc: &MiscSettings) -> Vec<PathBuf> {
    misc.custom_shader_path
        .iter()
        .chain(misc.shader_image_path.iter())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use atlas_core::{Changes, FrameObserver, MiscSettings};

    use super::{ShaderHotReload, watched_files};

    #[test]
    fn nothing_to_watch_without_a_shader() {
        assert!(ShaderHotReload::new(&MiscSettings::default()).is_none());
    }

    #[test]
    fn watches_shader_and_image() {
        let misc = MiscSettings {
            custom_shader_path: Some(PathBuf::from("/s/post.wgsl")),
            shader_image_path: Some(PathBuf::from("/s/noise.png")),
            ..MiscSettings::default()
        };
        assert_eq!(watched_files(&misc), [PathBuf::from("/s/post.wgsl"), PathBuf::from("/s/noise.png")]);
    }

    #[test]
    fn edit_requests_misc_reapply() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = std::env::temp_dir().join(format!("glyph_atlas_reload_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        let shader = dir.join("post.wgsl");
        std::fs::write(&shader, "// v1").expect("write shader");

        let misc = MiscSettings {
            custom_shader_path: Some(shader.clone()),
            ..MiscSettings::default()
        };
        // Platforms without a file watcher backend have nothing to test.
        let Some(mut reload) = ShaderHotReload::new(&misc) else {
            return;
        };
        assert_eq!(reload.before_frame(), Changes::empty());

        std::fs::write(&shader, "// v2").expect("rewrite shader");
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Changes::empty();
        while Instant::now() < deadline && seen.is_empty() {
            std::thread::sleep(Duration::from_millis(50));
            seen = reload.before_frame();
        }
        assert_eq!(seen, Changes::MISC);
    }
}
