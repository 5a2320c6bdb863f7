// Directory traversal
// Depth-first walk of one root that prunes ignored subtrees and emits files as they are found

use super::coordinator::CancelToken;
use super::error::FailureKind;
use super::file::{FileMeta, FileResult, PendingFile};
use super::filter::PathFilter;
use jwalk::{Parallelism, WalkDir};
use std::fs::{self, FileType};
use std::io;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, trace};

/// Something the walker found
#[derive(Debug)]
pub enum WalkEvent {
    /// A file to hash
    File(PendingFile),
    /// An entry (or the root itself) that could not be inspected
    Failed(FileResult),
}

/// Counts for a single root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub files: u64,
    pub failures: u64,
    /// Stopped early because the scan was cancelled
    pub cancelled: bool,
    /// Stopped early because `emit` asked to stop
    pub aborted: bool,
}

/// Walk `root` depth-first and hand every qualifying entry to `emit`
///
/// Directories matching the filter are not descended into. Only regular
/// files are emitted. Symlinks are never followed for descent: a symlink is
/// emitted as a file when its target is a regular file, and reported as
/// `Unreadable` when its target cannot be stat'ed. A directory whose contents
/// cannot be listed is reported as `Unreadable` too. Errors on individual
/// entries are reported and the walk carries on with their siblings.
///
/// `emit` may block (queue backpressure). Returning `ControlFlow::Break`
/// stops the walk.
///
/// # Arguments
/// * `root` - Directory (or single file) to traverse
/// * `filter` - Ignored prefixes
/// * `cancel` - Checked before every emitted entry
/// * `emit` - Receives files and per-entry failures
pub fn walk_root<E>(
    root: &Path,
    filter: &PathFilter,
    cancel: &CancelToken,
    mut emit: E,
) -> WalkSummary
where
    E: FnMut(WalkEvent) -> ControlFlow<()>,
{
    let mut summary = WalkSummary::default();

    if filter.should_skip(root) {
        debug!(root = %root.display(), "root matches an ignored prefix");
        return summary;
    }

    if let Err(err) = fs::symlink_metadata(root) {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            FailureKind::TraversalRootMissing
        } else {
            FailureKind::Unreadable
        };
        summary.failures += 1;
        let failure = FileResult::failed(PendingFile::unstatted(root.to_path_buf()), kind, err);
        if emit(WalkEvent::Failed(failure)).is_break() {
            summary.aborted = true;
        }
        return summary;
    }

    // jwalk needs an owned filter for its read_dir hook
    let prune = filter.clone();
    let walk = WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .process_read_dir(move |_depth, _path, _state, children| {
            children.retain(|child| match child {
                Ok(entry) => !prune.should_skip(&entry.path()),
                Err(_) => true,
            });
        });

    for entry in walk {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let event = match entry {
            Ok(mut entry) => {
                let file_type = entry.file_type();
                let path = entry.path();
                if file_type.is_dir() {
                    // Found the directory but could not list its contents
                    match entry.read_children_error.take() {
                        Some(err) => {
                            summary.failures += 1;
                            WalkEvent::Failed(FileResult::failed(
                                PendingFile::unstatted(path),
                                FailureKind::Unreadable,
                                to_io_error(&err),
                            ))
                        }
                        None => continue,
                    }
                } else {
                    match describe(&path, file_type) {
                        Ok(Some(meta)) => {
                            trace!(path = %path.display(), "discovered");
                            summary.files += 1;
                            WalkEvent::File(PendingFile::new(path, meta))
                        }
                        Ok(None) => continue,
                        Err(err) => {
                            summary.failures += 1;
                            WalkEvent::Failed(FileResult::failed(
                                PendingFile::unstatted(path),
                                FailureKind::Unreadable,
                                err,
                            ))
                        }
                    }
                }
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                summary.failures += 1;
                WalkEvent::Failed(FileResult::failed(
                    PendingFile::unstatted(path),
                    FailureKind::Unreadable,
                    to_io_error(&err),
                ))
            }
        };

        if emit(event).is_break() {
            summary.aborted = true;
            break;
        }
    }

    summary
}

/// Stat a non-directory entry
///
/// Returns `None` for anything that is not a regular file once symlinks are
/// resolved: directory links, FIFOs, sockets and device nodes. Opening a FIFO
/// would block a worker indefinitely.
fn describe(path: &Path, file_type: FileType) -> io::Result<Option<FileMeta>> {
    let metadata = if file_type.is_symlink() {
        fs::metadata(path)?
    } else {
        fs::symlink_metadata(path)?
    };
    if !metadata.is_file() {
        trace!(path = %path.display(), "skipping non-regular file");
        return Ok(None);
    }
    Ok(Some(FileMeta::from_metadata(&metadata)))
}

/// Keep the underlying io error kind where jwalk has one
fn to_io_error(err: &jwalk::Error) -> io::Error {
    match err.io_error() {
        Some(source) => io::Error::new(source.kind(), err.to_string()),
        None => io::Error::other(err.to_string()),
    }
}

// Tests moved to tests/scan/walker_tests.rs
