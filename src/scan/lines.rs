use std::borrow::Cow;

/// Splits a chunked byte stream into text lines.
///
/// Bytes after the last newline are kept until the next chunk or
/// [`LineBuffer::finish`], so records split across chunks stay whole.
#[derive(Debug, Default)]
pub(super) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(super) fn feed(&mut self, chunk: &[u8], mut on_line: impl FnMut(&str)) {
        self.pending.extend_from_slice(chunk);
        let Some(last_newline) = self.pending.iter().rposition(|byte| *byte == b'\n') else {
            return;
        };
        let rest = self.pending.split_off(last_newline.saturating_add(1));
        let complete = std::mem::replace(&mut self.pending, rest);
        for line in complete.split(|byte| *byte == b'\n') {
            emit(line, &mut on_line);
        }
    }

    /// Flushes the trailing unterminated line, if any.
    pub(super) fn finish(self, mut on_line: impl FnMut(&str)) {
        emit(&self.pending, &mut on_line);
    }
}

fn emit(line: &[u8], on_line: &mut impl FnMut(&str)) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return;
    }
    let text: Cow<'_, str> = String::from_utf8_lossy(line);
    on_line(&text);
}
