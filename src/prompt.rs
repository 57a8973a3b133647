use std::io::{self, BufRead, Write};

pub struct ShellPrompt {
    text: String,
}

impl ShellPrompt {
    pub fn new(text: &str) -> Self {
        ShellPrompt {
            text: text.to_string(),
        }
    }

    pub fn show_prompt(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self.text.as_bytes())?;
        out.flush()
    }

    /// Read one line without its line terminator. `None` at end of input.
    /// Bytes that are not valid UTF-8 are replaced rather than failing the read.
    pub fn read_line(&self, input: &mut dyn BufRead) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let bytes_read = input.read_until(b'\n', &mut buf)?;
        if bytes_read == 0 {
            // EOF (e.g., Ctrl-D)
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}
