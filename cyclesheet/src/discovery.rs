//! Finds report files in a directory by the names the calculation gives
//! them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;

/// Returns the most recently modified file in `dir` whose name starts with
/// `prefix`. Equal times go to the name that sorts last.
pub fn newest_with_prefix(
  dir: &Path,
  prefix: &str
) -> io::Result<Option<PathBuf>> {
  let mut best: Option<(SystemTime, PathBuf)> = None;
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let path = entry.path();
    let matches = path.file_name()
      .and_then(|n| n.to_str())
      .is_some_and(|n| n.starts_with(prefix));
    if !matches || !path.is_file() {
      continue;
    }
    let mtime = entry.metadata()?.modified()?;
    debug!("Candidate for \"{}\": {}", prefix, path.display());
    let newer = match &best {
      Some((t, p)) => (mtime, &path) > (*t, p),
      None => true
    };
    if newer {
      best = Some((mtime, path));
    }
  }
  return Ok(best.map(|(_, p)| p));
}
