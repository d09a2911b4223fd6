//! Local edit buffer
//!
//! Holds the command line typed so far; nothing reaches the shell until the
//! line is submitted.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditBuffer {
    bytes: Vec<u8>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[allow(dead_code)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Buffer followed by a newline, ready to send to the shell
    pub fn to_submission(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.bytes.len() + 1);
        line.extend_from_slice(&self.bytes);
        line.push(b'\n');
        line
    }

    /// Buffer text with leading spaces removed
    pub fn request_text(&self) -> String {
        let start = self
            .bytes
            .iter()
            .position(|&b| b != b' ')
            .unwrap_or(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[start..]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> EditBuffer {
        let mut buf = EditBuffer::new();
        text.bytes().for_each(|b| buf.push(b));
        buf
    }

    #[test]
    fn test_push_pop() {
        let mut buf = buffer("ab");
        assert_eq!(buf.pop(), Some(b'b'));
        assert_eq!(buf.as_bytes(), b"a");
        buf.pop();
        assert_eq!(buf.pop(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_submission_appends_newline() {
        assert_eq!(buffer("ls").to_submission(), b"ls\n");
        assert_eq!(EditBuffer::new().to_submission(), b"\n");
    }

    #[test]
    fn test_request_text_trims_leading_spaces_only() {
        assert_eq!(buffer("   list files ").request_text(), "list files ");
        assert_eq!(buffer("    ").request_text(), "");
        assert_eq!(buffer("\tx").request_text(), "\tx");
    }
}
