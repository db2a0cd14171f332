//! Console output
//!
//! Command handlers print through [`Terminal`], a byte sink that never fails
//! from the handler's point of view. [`Console`] adapts any
//! [`embedded_io::Write`] (a UART on the target, stdout or a serial port on
//! the host) into a terminal.

use core::fmt;

/// Byte oriented output used by the shell and every command
///
/// `write!` and `writeln!` work directly on `&mut dyn Terminal` through the
/// provided [`Terminal::write_fmt`].
pub trait Terminal {
    /// Write raw bytes
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write a string
    fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Write formatted output, used by `write!`/`writeln!`
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::write(&mut Adapter(self), args);
    }
}

struct Adapter<'a, T: ?Sized>(&'a mut T);

impl<T: Terminal + ?Sized> fmt::Write for Adapter<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Terminal on top of an embedded-io writer
pub struct Console<W> {
    inner: W,
    errors: u32,
}

impl<W: embedded_io::Write> Console<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner, errors: 0 }
    }

    /// Number of writes that failed since creation
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) {
        if self.inner.flush().is_err() {
            self.errors = self.errors.wrapping_add(1);
        }
    }

    /// Get a reference to the wrapped writer
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Unwrap the console
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: embedded_io::Write> Terminal for Console<W> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        if let Err(e) = self.inner.write_all(bytes) {
            self.errors = self.errors.wrapping_add(1);
            log::warn!("console write failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::{ErrorKind, ErrorType};
    use std::vec::Vec;

    struct Sink(Vec<u8>);

    impl ErrorType for Sink {
        type Error = Infallible;
    }

    impl embedded_io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct Broken;

    impl ErrorType for Broken {
        type Error = ErrorKind;
    }

    impl embedded_io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
            Err(ErrorKind::BrokenPipe)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::BrokenPipe)
        }
    }

    #[test]
    fn test_formatted_output() {
        let mut console = Console::new(Sink(Vec::new()));
        {
            let out: &mut dyn Terminal = &mut console;
            writeln!(out, "page {} @ 0x{:08X}", 3, 0x0800_0C00u32);
            out.write_bytes(&[0x01, 0xFF]);
        }
        assert_eq!(console.inner().0, b"page 3 @ 0x08000C00\n\x01\xFF");
        assert_eq!(console.errors(), 0);
    }

    #[test]
    fn test_write_errors_are_counted() {
        let mut console = Console::new(Broken);
        console.write_str("lost");
        console.flush();
        assert_eq!(console.errors(), 2);
    }
}
