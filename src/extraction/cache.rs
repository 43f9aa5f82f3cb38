//! Derived text files.
//!
//! Extraction results are memoised next to their source file. The presence of
//! the derived path is the only validity check: a file that exists is trusted
//! and never rewritten. Writers go through a uniquely named temporary sibling
//! that is linked into place, so a reader never sees a half-written cache and
//! two racing writers cannot clobber each other.
//!
//! The derived path depends on the source path only. When one file is
//! extracted with two different selectors in the same process, the second
//! call gets the first call's lines and a warning is logged.

use std::fs::{self, File};
use std::hash::BuildHasher;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ahash::{AHashMap, RandomState};
use lazy_static::lazy_static;
use log::{debug, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::segment::CanonicalStream;

/// Number of write lock stripes shared by all derived paths.
const LOCK_STRIPES: usize = 64;

lazy_static! {
    /// Striped write locks; a path always maps to the same stripe.
    static ref PATH_LOCKS: Vec<Mutex<()>> = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();
    static ref STRIPE_HASHER: RandomState = RandomState::new();
    /// Which extraction produced (or first read) each derived file in this
    /// process.
    static ref PRODUCERS: Mutex<AHashMap<PathBuf, String>> = Mutex::new(AHashMap::new());
}

/// Path of the derived text file for `source`: same path, `.txt` extension.
pub fn derived_text_path<P: AsRef<Path>>(source: P) -> PathBuf {
    source.as_ref().with_extension("txt")
}

/// Path with `suffix` inserted before the extension, e.g. `hyp.sgm` ->
/// `hyp.filtered.sgm`.
pub fn derived_sibling_path<P: AsRef<Path>>(source: P, suffix: &str) -> PathBuf {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match source.extension() {
        Some(ext) => format!("{stem}.{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{suffix}"),
    };
    source.with_file_name(file_name)
}

/// Read a derived text file back into a stream, one segment per line.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<CanonicalStream> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        lines.push(line.strip_suffix('\r').map(str::to_string).unwrap_or(line));
    }
    Ok(lines)
}

/// Return the cached stream at `target`, or run `produce` and cache its output.
///
/// `producer` names what is being extracted (selector and collection). A
/// cache hit recorded under a different producer is still returned, with a
/// warning.
///
/// Empty streams are returned but not cached: they stand for "no data" (for
/// instance an unknown collection) and must not shadow a later, better call.
pub fn memoize<F>(target: &Path, producer: &str, produce: F) -> Result<CanonicalStream>
where
    F: FnOnce() -> Result<CanonicalStream>,
{
    if target.exists() {
        match claim(target, producer) {
            Some(previous) => warn!(
                "Reusing {} produced for {previous}, not for {producer}",
                target.display()
            ),
            None => debug!("Using cached segments from {}", target.display()),
        }
        return read_lines(target);
    }

    let lines = produce()?;
    if lines.is_empty() {
        return Ok(lines);
    }

    let mut contents = String::new();
    for line in &lines {
        contents.push_str(line);
        contents.push('\n');
    }
    write_once(target, contents.as_bytes())?;
    claim(target, producer);
    Ok(lines)
}

/// Record `producer` for `target` unless another producer is already on
/// record, in which case that one is returned.
fn claim(target: &Path, producer: &str) -> Option<String> {
    let mut producers = PRODUCERS.lock();
    match producers.get(target) {
        Some(previous) if previous != producer => Some(previous.clone()),
        Some(_) => None,
        None => {
            producers.insert(target.to_path_buf(), producer.to_string());
            None
        }
    }
}

/// Write `bytes` to `target` unless it already exists.
///
/// Returns `true` when this call created the file. An existing target is left
/// untouched, even if its contents differ.
pub fn write_once(target: &Path, bytes: &[u8]) -> Result<bool> {
    let _guard = path_lock(target).lock();

    if target.exists() {
        return Ok(false);
    }

    let tmp_path = temp_sibling(target);
    if let Err(e) = write_synced(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    let created = match fs::hard_link(&tmp_path, target) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => false,
        Err(_) if target.exists() => false,
        // Filesystems without hard links: fall back to a plain rename.
        Err(_) => {
            fs::rename(&tmp_path, target)?;
            return Ok(true);
        }
    };
    fs::remove_file(&tmp_path)?;

    if created {
        debug!("Wrote derived file {}", target.display());
    } else {
        debug!("Derived file {} appeared concurrently, keeping it", target.display());
    }
    Ok(created)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

fn path_lock(target: &Path) -> &'static Mutex<()> {
    let stripe = STRIPE_HASHER.hash_one(target) as usize % LOCK_STRIPES;
    &PATH_LOCKS[stripe]
}
