//! I/O abstractions:
//! - `IndexOutput`: append-only byte sink that tracks its current position and has a
//!   `seal()` operation committing the write activity.
//! - `DataOutput`: extension trait encoding variable-length and fixed-width integers
//!   on top of any `IndexOutput`.
//! - `ByteReader`: positional cursor over an in-memory byte slice, the decoding
//!   counterpart of `DataOutput`.
//!
//! Provides a couple of simple implementations: memory-based and file-based.

pub mod data_input;
pub mod data_output;
pub mod file;
pub mod memory;
pub mod utils;

pub use data_input::ByteReader;
pub use data_output::DataOutput;
pub use file::FileOutput;

/// A trait for append-only sequential writing with explicit sealing semantics.
///
/// Index files are written strictly front to back: nothing is ever rewritten or
/// re-read once appended. Implementors track the number of bytes written so far,
/// which callers use as file pointers (offsets) stored in other structures.
///
/// Unlike plain [`std::io::Write`], the written data is only guaranteed to be
/// durable once [`seal`](IndexOutput::seal) returns successfully. Writing after
/// sealing is an error.
///
/// # Thread Safety
///
/// Implementations must be [`Send`] to support transfer between threads, though
/// the trait does not require [`Sync`] as writers require exclusive access through
/// `&mut self`.
pub trait IndexOutput: std::io::Write + Send {
    /// Returns the current position of the output, i.e. the total number of bytes
    /// appended so far.
    fn file_pointer(&self) -> u64;

    /// Seals the output, flushing any buffered data and committing it to the
    /// underlying storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or commit fails, or if the output has
    /// already been sealed.
    fn seal(&mut self) -> std::io::Result<()>;
}

impl<T> IndexOutput for Box<T>
where
    T: IndexOutput + ?Sized,
{
    fn file_pointer(&self) -> u64 {
        self.as_ref().file_pointer()
    }

    fn seal(&mut self) -> std::io::Result<()> {
        self.as_mut().seal()
    }
}

impl<T> IndexOutput for &mut T
where
    T: IndexOutput + ?Sized,
{
    fn file_pointer(&self) -> u64 {
        (**self).file_pointer()
    }

    fn seal(&mut self) -> std::io::Result<()> {
        (**self).seal()
    }
}
