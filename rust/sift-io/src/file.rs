use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::IndexOutput;

/// File-backed [`IndexOutput`] with an internal write buffer.
///
/// The output is sealed by flushing the buffer and syncing the file to disk;
/// the file handle is released at that point and any further write fails.
pub struct FileOutput {
    file: Option<BufWriter<File>>,
    pos: u64,
}

impl FileOutput {
    const BUFFER_SIZE: usize = 64 * 1024;

    pub fn new(file: File) -> FileOutput {
        FileOutput {
            file: Some(BufWriter::with_capacity(Self::BUFFER_SIZE, file)),
            pos: 0,
        }
    }

    /// Creates a new file at `path`. Fails if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<FileOutput> {
        Ok(FileOutput::new(File::create_new(path)?))
    }

    fn file_mut(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("file output is sealed"))
    }
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.file_mut()?.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file_mut()?.flush()
    }
}

impl IndexOutput for FileOutput {
    fn file_pointer(&self) -> u64 {
        self.pos
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| std::io::Error::other("file output is sealed"))?;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}
