//! File change monitor: watches a set of files and raises a shared flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, warn};
use notify::{RecursiveMode, Watcher};
use parking_lot::Mutex;

/// Bursts of events closer together than this count as one change.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// How often the idle loop checks for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// A burst that keeps going is reported after this long anyway.
const MAX_BURST: Duration = Duration::from_secs(1);

type NotifyResult = Result<notify::Event, notify::Error>;

/// Watches the parent directories of `files` and records changes to any of
/// them. The watcher thread stops when this is dropped.
pub struct FileWatcher {
    changed: Arc<AtomicBool>,
    paths: Arc<Mutex<Vec<PathBuf>>>,
    shutdown_tx: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl FileWatcher {
    /// Start watching. Returns `None` if no file has an existing parent
    /// directory or the platform watcher cannot be created.
    pub fn new(files: &[PathBuf]) -> Option<Self> {
        let (notify_tx, notify_rx) = mpsc::channel::<NotifyResult>();
        let mut watcher = match notify::recommended_watcher(notify_tx) {
            Ok(w) => w,
            Err(e) => {
                warn!("watcher: failed to create watcher: {e}");
                return None;
            }
        };

        let mut watching = 0;
        for dir in parent_dirs(files) {
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!("watcher: watching {}", dir.display());
                    watching += 1;
                }
                Err(e) => warn!("watcher: failed to watch {}: {e}", dir.display()),
            }
        }
        if watching == 0 {
            return None;
        }

        let changed = Arc::new(AtomicBool::new(false));
        let paths = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let files = files.to_vec();
        let flag = Arc::clone(&changed);
        let seen = Arc::clone(&paths);
        let thread = std::thread::Builder::new()
            .name("file-watcher".into())
            .spawn(move || {
                // Keep the watcher alive for the lifetime of this thread.
                let _watcher = watcher;
                watch_loop(&files, &notify_rx, &shutdown_rx, &flag, &seen);
            })
            .ok()?;

        Some(Self {
            changed,
            paths,
            shutdown_tx,
            thread: Some(thread),
        })
    }

    /// Whether a watched file changed since the last call. Clears the flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Files that changed since the last call, deduplicated.
    pub fn drain_paths(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.paths.lock())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("changed", &self.changed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn parent_dirs(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for file in files {
        let Some(parent) = file.parent().filter(|p| p.is_dir()) else {
            continue;
        };
        if !dirs.iter().any(|d| d == parent) {
            dirs.push(parent.to_path_buf());
        }
    }
    dirs
}

/// Which of `files` an event touches.
fn matching_paths<'a>(files: &'a [PathBuf], event: &notify::Event) -> Vec<&'a Path> {
    files
        .iter()
        .filter(|f| event.paths.iter().any(|p| p == *f))
        .map(PathBuf::as_path)
        .collect()
}

fn watch_loop(
    files: &[PathBuf],
    notify_rx: &mpsc::Receiver<NotifyResult>,
    shutdown_rx: &mpsc::Receiver<()>,
    changed: &AtomicBool,
    paths: &Mutex<Vec<PathBuf>>,
) {
    loop {
        if shutdown_rx.try_recv().is_ok() {
            return;
        }
        let event = match notify_rx.recv_timeout(SHUTDOWN_POLL) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                warn!("watcher: {e}");
                continue;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        };

        let mut hits: Vec<PathBuf> = matching_paths(files, &event)
            .into_iter()
            .map(Path::to_path_buf)
            .collect();
        if hits.is_empty() {
            continue;
        }

        if drain_burst(files, notify_rx, shutdown_rx, &mut hits) == Drain::Shutdown {
            return;
        }

        debug!("watcher: changed {hits:?}");
        {
            let mut pending = paths.lock();
            for hit in hits {
                if !pending.contains(&hit) {
                    pending.push(hit);
                }
            }
        }
        changed.store(true, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drain {
    Settled,
    Shutdown,
}

/// Fold the rest of a burst into `hits`. Stops when no event arrives for
/// [`DEBOUNCE`], after [`MAX_BURST`], or on shutdown.
fn drain_burst(
    files: &[PathBuf],
    notify_rx: &mpsc::Receiver<NotifyResult>,
    shutdown_rx: &mpsc::Receiver<()>,
    hits: &mut Vec<PathBuf>,
) -> Drain {
    let started = Instant::now();
    while started.elapsed() < MAX_BURST {
        if shutdown_rx.try_recv().is_ok() {
            return Drain::Shutdown;
        }
        match notify_rx.recv_timeout(DEBOUNCE) {
            Ok(Ok(event)) => {
                for path in matching_paths(files, &event) {
                    if !hits.iter().any(|h| h == path) {
                        hits.push(path.to_path_buf());
                    }
                }
            }
            Ok(Err(e)) => warn!("watcher: {e}"),
            Err(_) => break,
        }
    }
    Drain::Settled
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use super::{Drain, MAX_BURST, NotifyResult, drain_burst, matching_paths, parent_dirs};

    fn touched(path: &str) -> NotifyResult {
        Ok(notify::Event::new(notify::EventKind::Any).add_path(PathBuf::from(path)))
    }

    #[test]
    fn parent_dirs_deduplicates_and_skips_missing() {
        let tmp = std::env::temp_dir();
        let files = vec![
            tmp.join("a.wgsl"),
            tmp.join("b.png"),
            PathBuf::from("/definitely/not/a/dir/c.wgsl"),
        ];
        assert_eq!(parent_dirs(&files), vec![tmp]);
    }

    #[test]
    fn events_match_only_watched_files() {
        let files = vec![PathBuf::from("/x/shader.wgsl"), PathBuf::from("/x/image.png")];
        let event = notify::Event::new(notify::EventKind::Any)
            .add_path(PathBuf::from("/x/other.txt"))
            .add_path(PathBuf::from("/x/image.png"));
        let hits = matching_paths(&files, &event);
        assert_eq!(hits, vec![files[1].as_path()]);
    }

    #[test]
    fn burst_collects_each_path_once() {
        let files = vec![PathBuf::from("/x/shader.wgsl"), PathBuf::from("/x/image.png")];
        let (tx, rx) = mpsc::channel();
        let (_shutdown_tx, shutdown_rx) = mpsc::channel();
        for path in ["/x/image.png", "/x/other.txt", "/x/image.png", "/x/shader.wgsl"] {
            tx.send(touched(path)).expect("send");
        }
        let mut hits = Vec::new();
        assert_eq!(drain_burst(&files, &rx, &shutdown_rx, &mut hits), Drain::Settled);
        assert_eq!(hits, vec![files[1].clone(), files[0].clone()]);
    }

    #[test]
    fn shutdown_interrupts_a_burst() {
        let files = vec![PathBuf::from("/x/shader.wgsl")];
        let (tx, rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        tx.send(touched("/x/shader.wgsl")).expect("send");
        shutdown_tx.send(()).expect("send");
        let mut hits = Vec::new();
        assert_eq!(drain_burst(&files, &rx, &shutdown_rx, &mut hits), Drain::Shutdown);
    }

    #[test]
    fn endless_burst_is_cut_off() {
        let files = vec![PathBuf::from("/x/shader.wgsl")];
        let (tx, rx) = mpsc::channel();
        let (_shutdown_tx, shutdown_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let producer = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if tx.send(touched("/x/shader.wgsl")).is_err() {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            })
        };

        let started = Instant::now();
        let mut hits = Vec::new();
        let drain = drain_burst(&files, &rx, &shutdown_rx, &mut hits);
        let elapsed = started.elapsed();
        stop.store(true, Ordering::Relaxed);
        producer.join().expect("producer");

        assert_eq!(drain, Drain::Settled);
        assert_eq!(hits, files);
        assert!(elapsed >= MAX_BURST);
        assert!(elapsed < MAX_BURST + Duration::from_secs(2), "took {elapsed:?}");
    }
}
