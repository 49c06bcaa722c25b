//! Save targets for downloaded blobs.

// std
use std::{
	fs::{self, OpenOptions},
	io::{self, Write},
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{_prelude::*, error::DownloadError};

/// Boxed future returned by [`FileSaver::save`].
pub type SaveFuture<'a> =
	Pin<Box<dyn Future<Output = Result<SavedFile, DownloadError>> + 'a + Send>>;

const MAX_DUPLICATE_SUFFIX: u32 = 999;

static STAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Binary payload tagged with its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
	/// Raw bytes.
	pub bytes: Vec<u8>,
	/// MIME type the bytes should be saved as.
	pub mime: String,
}
impl Blob {
	/// Creates a blob from bytes and a MIME type.
	pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
		Self { bytes, mime: mime.into() }
	}

	/// Returns the payload size in bytes.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Returns `true` for an empty payload.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}
impl Debug for Blob {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Blob").field("len", &self.bytes.len()).field("mime", &self.mime).finish()
	}
}

/// Where a blob ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFile {
	/// Final location on disk.
	pub path: PathBuf,
	/// Number of bytes written.
	pub size: u64,
	/// MIME type of the saved blob.
	pub mime: String,
}

/// Platform-level "save to disk" action.
pub trait FileSaver
where
	Self: Send + Sync,
{
	/// Saves `blob` under `file_name` and reports the final location.
	fn save<'a>(&'a self, blob: &'a Blob, file_name: &'a str) -> SaveFuture<'a>;
}

/// Saves blobs into a directory without ever overwriting an existing file.
///
/// The blob is first staged next to its destination, then linked into place under the first
/// free name (`report.xlsx`, `report (1).xlsx`, ...). Filesystems without hard links fall back
/// to writing the destination directly. The staging file is removed once the save completes
/// or fails.
#[derive(Clone, Debug)]
pub struct DirectorySaver {
	dir: PathBuf,
}
impl DirectorySaver {
	/// Creates a saver rooted at `dir`; the directory is created on first use.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Returns the target directory.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn save_now(&self, blob: &Blob, file_name: &str) -> Result<SavedFile, DownloadError> {
		let name = sanitize_file_name(file_name)?;

		fs::create_dir_all(&self.dir)
			.map_err(|source| DownloadError::Save { path: self.dir.clone(), source })?;

		let staged = StagedFile::write(&self.dir, &name, &blob.bytes)?;
		let path = staged.publish(&self.dir, &name, &blob.bytes)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(path = %path.display(), size = blob.len(), "download saved");

		Ok(SavedFile { path, size: blob.len() as u64, mime: blob.mime.clone() })
	}
}
impl FileSaver for DirectorySaver {
	fn save<'a>(&'a self, blob: &'a Blob, file_name: &'a str) -> SaveFuture<'a> {
		Box::pin(async move { self.save_now(blob, file_name) })
	}
}

/// Transient copy of the blob that is always cleaned up on drop.
struct StagedFile {
	path: PathBuf,
}
impl StagedFile {
	fn write(dir: &Path, name: &str, bytes: &[u8]) -> Result<Self, DownloadError> {
		let seq = STAGE_SEQ.fetch_add(1, Ordering::Relaxed);
		let path = dir.join(format!(".{name}.{}-{seq}.part", std::process::id()));
		let staged = Self { path };

		write_new(&staged.path, bytes)
			.map_err(|source| DownloadError::Save { path: staged.path.clone(), source })?;

		Ok(staged)
	}

	fn publish(&self, dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
		for candidate in candidate_paths(dir, name) {
			let linked = match fs::hard_link(&self.path, &candidate) {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
				Err(_) => write_new(&candidate, bytes),
			};

			match linked {
				Ok(()) => return Ok(candidate),
				Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
				Err(source) => return Err(DownloadError::Save { path: candidate, source }),
			}
		}

		Err(DownloadError::Save {
			path: dir.join(name),
			source: io::Error::new(io::ErrorKind::AlreadyExists, "no free file name left"),
		})
	}
}
impl Drop for StagedFile {
	fn drop(&mut self) {
		let _ = fs::remove_file(&self.path);
	}
}

fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
	let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;

	file.write_all(bytes)?;
	file.sync_all()
}

fn candidate_paths<'a>(dir: &'a Path, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
	let (stem, ext) = match name.rfind('.') {
		Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
		_ => (name, ""),
	};

	std::iter::once(dir.join(name)).chain(
		(1..=MAX_DUPLICATE_SUFFIX).map(move |i| dir.join(format!("{stem} ({i}){ext}"))),
	)
}

/// Replaces path separators and reserved characters so the name stays inside the target
/// directory.
pub(crate) fn sanitize_file_name(name: &str) -> Result<String, DownloadError> {
	let sanitized = name
		.chars()
		.map(|c| match c {
			'/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
			c if c.is_control() => '_',
			c => c,
		})
		.collect::<String>();
	let sanitized = sanitized.trim();

	if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
		return Err(DownloadError::InvalidFileName { name: name.to_owned() });
	}

	Ok(sanitized.to_owned())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn sanitize_replaces_separators() {
		assert_eq!(
			sanitize_file_name("../报表/2024:Q1.xlsx").expect("Name should sanitize."),
			".._报表_2024_Q1.xlsx"
		);
		assert!(matches!(sanitize_file_name(" .. "), Err(DownloadError::InvalidFileName { .. })));
		assert!(matches!(sanitize_file_name(""), Err(DownloadError::InvalidFileName { .. })));
	}

	#[test]
	fn candidates_insert_suffix_before_extension() {
		let dir = Path::new("/exports");
		let names = candidate_paths(dir, "导出文件.xlsx").take(3).collect::<Vec<_>>();

		assert_eq!(
			names,
			vec![
				dir.join("导出文件.xlsx"),
				dir.join("导出文件 (1).xlsx"),
				dir.join("导出文件 (2).xlsx"),
			]
		);

		let dotless = candidate_paths(dir, "README").nth(1).expect("Suffix candidate should exist.");

		assert_eq!(dotless, dir.join("README (1)"));
	}

	#[test]
	fn blob_debug_hides_bytes() {
		let blob = Blob::new(vec![1, 2, 3], "application/octet-stream");

		assert_eq!(format!("{blob:?}"), "Blob { len: 3, mime: \"application/octet-stream\" }");
		assert_eq!(blob.len(), 3);
		assert!(!blob.is_empty());
	}
}
