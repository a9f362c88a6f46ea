use crate::IndexOutput;

impl IndexOutput for Vec<u8> {
    fn file_pointer(&self) -> u64 {
        self.len() as u64
    }

    fn seal(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::IndexOutput;

    #[test]
    fn test_mem_writer() {
        let mut buffer = Vec::<u8>::new();
        buffer.write_all(b"abcd").unwrap();
        assert_eq!(buffer.file_pointer(), 4);
        buffer.write_all(b"123").unwrap();
        buffer.seal().unwrap();
        assert_eq!(buffer.file_pointer(), 7);
        assert_eq!(buffer, b"abcd123");
    }

    fn append_through<W: IndexOutput>(mut output: W, buf: &[u8]) -> u64 {
        output.write_all(buf).unwrap();
        output.seal().unwrap();
        output.file_pointer()
    }

    #[test]
    fn test_borrowed_writer() {
        let mut buffer = Vec::<u8>::new();
        assert_eq!(append_through(&mut buffer, b"xyz"), 3);
        assert_eq!(append_through(Box::new(&mut buffer), b"uv"), 5);
        assert_eq!(buffer, b"xyzuv");
    }
}
