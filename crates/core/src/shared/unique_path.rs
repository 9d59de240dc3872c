use std::path::{Path, PathBuf};

/// Picks a filename under `dir` that does not collide with an existing
/// file: `capture.png`, then `capture_000001.png`, `capture_000002.png`…
///
/// Only probes the filesystem; the caller creates the file.
pub fn unique_path(dir: &Path, base: &str) -> PathBuf {
    let candidate = dir.join(base);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (base, None),
    };

    let mut n: u32 = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{n:06}.{ext}"),
            None => format!("{stem}_{n:06}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
