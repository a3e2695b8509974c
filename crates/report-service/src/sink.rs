//! Caller-provided output sinks

use std::io::{self, Write};

/// Writable response that also carries attachment metadata
pub trait OutputSink: Write {
    /// Set the attachment disposition header value
    fn set_content_disposition(&mut self, value: &str);
}

/// In-memory response, useful for tests and for callers that frame
/// the bytes themselves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedResponse {
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// File name from the disposition header, if set
    pub fn file_name(&self) -> Option<&str> {
        self.content_disposition
            .as_deref()
            .and_then(|value| value.split_once("filename="))
            .map(|(_, name)| name)
    }
}

impl Write for BufferedResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputSink for BufferedResponse {
    fn set_content_disposition(&mut self, value: &str) {
        self.content_disposition = Some(value.to_string());
    }
}
