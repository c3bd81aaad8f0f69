use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Output device shared by every process. Each `write_str` lands as one
/// unit, so lines from concurrent processes never tear.
pub struct Console {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Console {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// A console whose output can be read back, for tests and headless runs.
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        (Self::new(Box::new(capture.clone())), capture)
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| io::Error::other("console unavailable"))?;
        sink.write_all(text.as_bytes())?;
        sink.flush()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("capture unavailable"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
