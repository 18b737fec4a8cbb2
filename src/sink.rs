//! Output sinks.
//!
//! Extracted frames end up either as files in a fresh directory or as
//! deflate-compressed entries of a fresh zip archive. Both are reached through
//! the [`FrameSink`] trait; [`OutputTarget`] describes where the output goes
//! and creates the matching [`OutputSink`].
//!
//! Entries are named `"{index}.{extension}"`, with an unpadded, zero-based
//! decimal index.

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::ExtractError;

/// Extension of archive outputs, without the leading dot.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Destination for encoded frames.
pub trait FrameSink {
    /// Write one entry named `"{index}.{extension}"`.
    fn write_entry(&mut self, index: u64, bytes: &[u8], extension: &str)
    -> Result<(), ExtractError>;

    /// Flush and close the sink.
    ///
    /// Calling this more than once is a no-op after the first call.
    fn finish(&mut self) -> Result<(), ExtractError>;
}

/// Name of the entry holding frame `index`.
pub fn entry_name(index: u64, extension: &str) -> String {
    format!("{index}.{extension}")
}

/// Where extracted frames are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A directory that is created for the run.
    Directory(PathBuf),
    /// A zip archive that is created for the run.
    Archive(PathBuf),
}

impl OutputTarget {
    /// Resolve the target inside `output_path`.
    ///
    /// Archives are named `<output_name>.zip`; directories `<output_name>`.
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use vidframes::OutputTarget;
    ///
    /// let target = OutputTarget::new(Path::new("out"), "frames", true);
    /// assert_eq!(target.path(), Path::new("out/frames.zip"));
    /// ```
    pub fn new(output_path: &Path, output_name: &str, archive: bool) -> Self {
        if archive {
            OutputTarget::Archive(
                output_path.join(format!("{output_name}.{ARCHIVE_EXTENSION}")),
            )
        } else {
            OutputTarget::Directory(output_path.join(output_name))
        }
    }

    /// Filesystem path of the directory or archive.
    pub fn path(&self) -> &Path {
        match self {
            OutputTarget::Directory(path) | OutputTarget::Archive(path) => path,
        }
    }

    /// Whether the target is a zip archive.
    pub fn is_archive(&self) -> bool {
        matches!(self, OutputTarget::Archive(_))
    }

    /// Create the directory or archive and return a sink writing into it.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::OutputAlreadyExists`] if something already exists at
    ///   the target path.
    /// - [`ExtractError::SinkWriteError`] if it cannot be created.
    pub fn create(&self) -> Result<OutputSink, ExtractError> {
        match self {
            OutputTarget::Directory(path) => DirectorySink::create(path).map(OutputSink::Directory),
            OutputTarget::Archive(path) => ArchiveSink::create(path).map(OutputSink::Archive),
        }
    }
}

fn creation_error(path: &Path, error: std::io::Error) -> ExtractError {
    if error.kind() == ErrorKind::AlreadyExists {
        ExtractError::OutputAlreadyExists(path.to_path_buf())
    } else {
        ExtractError::SinkWriteError(format!("cannot create {}: {error}", path.display()))
    }
}

/// Writes each entry as a file in a directory.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    entries: u64,
}

impl DirectorySink {
    /// Create `root` (its parent must exist) and write entries into it.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self, ExtractError> {
        let root = root.as_ref();
        fs::create_dir(root).map_err(|error| creation_error(root, error))?;
        log::debug!("Created output directory {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            entries: 0,
        })
    }

    /// Directory the entries are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }
}

impl FrameSink for DirectorySink {
    fn write_entry(
        &mut self,
        index: u64,
        bytes: &[u8],
        extension: &str,
    ) -> Result<(), ExtractError> {
        let path = self.root.join(entry_name(index, extension));
        fs::write(&path, bytes).map_err(|error| {
            ExtractError::SinkWriteError(format!("{}: {error}", path.display()))
        })?;
        self.entries += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExtractError> {
        Ok(())
    }
}

/// Writes each entry into a deflate-compressed zip archive.
///
/// The archive's central directory is written by [`finish`](FrameSink::finish);
/// if the sink is dropped without it, the zip writer finalizes the archive on
/// drop.
pub struct ArchiveSink {
    path: PathBuf,
    writer: Option<ZipWriter<BufWriter<File>>>,
    entries: u64,
}

impl std::fmt::Debug for ArchiveSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSink")
            .field("path", &self.path)
            .field("open", &self.writer.is_some())
            .field("entries", &self.entries)
            .finish()
    }
}

impl ArchiveSink {
    /// Create the archive file at `path`, which must not exist yet.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|error| creation_error(path, error))?;
        log::debug!("Created output archive {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(ZipWriter::new(BufWriter::new(file))),
            entries: 0,
        })
    }

    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }
}

impl FrameSink for ArchiveSink {
    fn write_entry(
        &mut self,
        index: u64,
        bytes: &[u8],
        extension: &str,
    ) -> Result<(), ExtractError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            ExtractError::SinkWriteError(format!("{} is already closed", self.path.display()))
        })?;

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(entry_name(index, extension), options)?;
        writer.write_all(bytes).map_err(|error| {
            ExtractError::SinkWriteError(format!("{}: {error}", self.path.display()))
        })?;
        self.entries += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExtractError> {
        if let Some(writer) = self.writer.take() {
            let mut file = writer.finish()?;
            file.flush().map_err(|error| {
                ExtractError::SinkWriteError(format!("{}: {error}", self.path.display()))
            })?;
            log::debug!(
                "Closed archive {} ({} entries)",
                self.path.display(),
                self.entries
            );
        }
        Ok(())
    }
}

/// Either sink variant, as created by [`OutputTarget::create`].
#[derive(Debug)]
pub enum OutputSink {
    /// Files in a directory.
    Directory(DirectorySink),
    /// Entries in a zip archive.
    Archive(ArchiveSink),
}

impl OutputSink {
    /// Number of entries written so far.
    pub fn entries(&self) -> u64 {
        match self {
            OutputSink::Directory(sink) => sink.entries(),
            OutputSink::Archive(sink) => sink.entries(),
        }
    }
}

impl FrameSink for OutputSink {
    fn write_entry(
        &mut self,
        index: u64,
        bytes: &[u8],
        extension: &str,
    ) -> Result<(), ExtractError> {
        match self {
            OutputSink::Directory(sink) => sink.write_entry(index, bytes, extension),
            OutputSink::Archive(sink) => sink.write_entry(index, bytes, extension),
        }
    }

    fn finish(&mut self) -> Result<(), ExtractError> {
        match self {
            OutputSink::Directory(sink) => sink.finish(),
            OutputSink::Archive(sink) => sink.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Read, path::Path};

    use zip::ZipArchive;

    use super::{FrameSink, OutputSink, OutputTarget, entry_name};
    use crate::error::ExtractError;

    #[test]
    fn entry_names_are_unpadded() {
        assert_eq!(entry_name(0, "jpg"), "0.jpg");
        assert_eq!(entry_name(12, "png"), "12.png");
        assert_eq!(entry_name(1_000, "jpeg"), "1000.jpeg");
    }

    #[test]
    fn target_paths() {
        let parent = Path::new("/tmp/out");
        assert_eq!(
            OutputTarget::new(parent, "frames", false),
            OutputTarget::Directory(parent.join("frames"))
        );
        assert_eq!(
            OutputTarget::new(parent, "frames", true),
            OutputTarget::Archive(parent.join("frames.zip"))
        );
        assert!(OutputTarget::new(parent, "frames", true).is_archive());
    }

    #[test]
    fn directory_sink_writes_files() {
        let temporary_directory = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(temporary_directory.path(), "frames", false);

        let mut sink = target.create().unwrap();
        sink.write_entry(0, b"first", "jpg").unwrap();
        sink.write_entry(1, b"second", "jpg").unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.entries(), 2);
        let root = target.path();
        assert_eq!(std::fs::read(root.join("0.jpg")).unwrap(), b"first");
        assert_eq!(std::fs::read(root.join("1.jpg")).unwrap(), b"second");
    }

    #[test]
    fn archive_sink_writes_deflated_entries_in_order() {
        let temporary_directory = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(temporary_directory.path(), "frames", true);

        let mut sink = target.create().unwrap();
        for index in 0..3 {
            sink.write_entry(index, &[index as u8; 512], "png").unwrap();
        }
        sink.finish().unwrap();
        sink.finish().unwrap();

        let mut archive = ZipArchive::new(File::open(target.path()).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        for index in 0..3 {
            let mut entry = archive.by_index(index).unwrap();
            assert_eq!(entry.name(), format!("{index}.png"));
            assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);

            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, vec![index as u8; 512]);
        }
    }

    #[test]
    fn empty_archive_is_valid() {
        let temporary_directory = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(temporary_directory.path(), "empty", true);

        let mut sink = target.create().unwrap();
        sink.finish().unwrap();

        let archive = ZipArchive::new(File::open(target.path()).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn dropped_archive_is_still_readable() {
        let temporary_directory = tempfile::tempdir().unwrap();
        let target = OutputTarget::new(temporary_directory.path(), "dropped", true);

        {
            let mut sink = target.create().unwrap();
            sink.write_entry(0, b"kept", "jpg").unwrap();
        }

        let archive = ZipArchive::new(File::open(target.path()).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn existing_targets_are_refused() {
        let temporary_directory = tempfile::tempdir().unwrap();

        let directory = OutputTarget::new(temporary_directory.path(), "frames", false);
        std::fs::create_dir(directory.path()).unwrap();
        assert!(matches!(
            directory.create(),
            Err(ExtractError::OutputAlreadyExists(_))
        ));

        let archive = OutputTarget::new(temporary_directory.path(), "frames", true);
        std::fs::write(archive.path(), b"").unwrap();
        assert!(matches!(
            archive.create(),
            Err(ExtractError::OutputAlreadyExists(_))
        ));
    }

    #[test]
    fn missing_parent_is_a_write_error() {
        let temporary_directory = tempfile::tempdir().unwrap();
        let parent = temporary_directory.path().join("does-not-exist");

        let result = OutputTarget::new(&parent, "frames", false).create();
        assert!(matches!(result, Err(ExtractError::SinkWriteError(_))));

        let result: Result<OutputSink, _> = OutputTarget::new(&parent, "frames", true).create();
        assert!(matches!(result, Err(ExtractError::SinkWriteError(_))));
    }
}
