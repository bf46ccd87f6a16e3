//! endpoint.rs — the position as a readable line of text

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use portable_atomic::Ordering;

use super::RotaryEncoder;
use crate::platform::FileOperations;

/// Rendered line size: `i32::MIN` plus the newline.
pub const LINE_LEN: usize = 12;

/// One rendered reading, e.g. `"-42\n"`.
pub type PositionLine = heapless::String<LINE_LEN>;

/// Render `value` as signed decimal followed by `\n`.
pub fn render(value: i32) -> PositionLine {
    let mut line = PositionLine::new();
    // LINE_LEN fits every i32, so this cannot run out of space.
    let _ = writeln!(line, "{}", value);
    line
}

/// Serve `text` from stream position `offset`.
///
/// At or past the end (or before the start) the stream is exhausted: nothing
/// is copied and `offset` rewinds to 0 so the next read starts a fresh line.
pub fn read_at(text: &[u8], buf: &mut [u8], offset: &mut i64) -> usize {
    let start = match usize::try_from(*offset) {
        Ok(start) if start < text.len() => start,
        _ => {
            *offset = 0;
            return 0;
        }
    };

    let count = buf.len().min(text.len() - start);
    buf[..count].copy_from_slice(&text[start..start + count]);
    *offset += count as i64;

    count
}

impl<M: RawMutex, B> FileOperations for RotaryEncoder<M, B> {
    fn open(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
        info!("rotenc: open");
    }

    fn read(&self, buf: &mut [u8], offset: &mut i64) -> usize {
        let line = render(self.position.snapshot());
        read_at(line.as_bytes(), buf, offset)
    }

    fn release(&self) {
        // Saturate so a stray release cannot wrap the count.
        let _ = self
            .sessions
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        info!("rotenc: release");
    }
}

// ============================================================================
// CONSUMER SESSION
// ============================================================================

/// An open handle on a readable endpoint.
///
/// Opening calls [`FileOperations::open`], dropping calls
/// [`FileOperations::release`], and the stream offset lives here in between.
///
/// ```ignore
/// let mut session = Session::open(&ENCODER);
/// let mut buf = [0u8; 16];
/// let n = session.read(&mut buf);   // "3\n"
/// let eof = session.read(&mut buf); // 0, offset rewound
/// ```
pub struct Session<'a, F: FileOperations + ?Sized> {
    fops: &'a F,
    offset: i64,
}

impl<'a, F: FileOperations + ?Sized> Session<'a, F> {
    pub fn open(fops: &'a F) -> Self {
        fops.open();
        Self { fops, offset: 0 }
    }

    /// Read into `buf`; 0 means the current line has been fully consumed.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.fops.read(buf, &mut self.offset)
    }

    /// Read to end of stream and return the first line seen.
    ///
    /// The value can change between the individual reads; anything after the
    /// first newline comes from a later snapshot and is dropped.
    pub fn read_line(&mut self) -> PositionLine {
        let mut line = PositionLine::new();
        let mut chunk = [0u8; LINE_LEN];
        let mut complete = false;
        loop {
            let count = self.read(&mut chunk);
            if count == 0 {
                break;
            }
            if complete {
                continue;
            }
            for &byte in &chunk[..count] {
                let _ = line.push(char::from(byte));
                if byte == b'\n' {
                    complete = true;
                    break;
                }
            }
        }
        line
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl<F: FileOperations + ?Sized> Drop for Session<'_, F> {
    fn drop(&mut self) {
        self.fops.release();
    }
}
