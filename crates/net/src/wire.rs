//! Line framing for the move exchange.
//!
//! Every message is one ASCII line ending in `\n`. A connection opens with a
//! hello line naming its role, then carries one move token per line. There is
//! no length prefix, checksum or acknowledgement.

use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

use engine::Move;

use crate::error::ChannelError;
use crate::token::{self, TokenError};

/// Longest line accepted as a message, not counting the line ending.
pub const MAX_LINE_LEN: usize = 16;

/// Sent by a host after the moves played so far, once a player may move.
pub const READY: &str = "ready";
/// Sent by a host that already has a player.
pub const BUSY: &str = "busy";

/// How long either side waits for the other's half of the handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "player" => Some(Role::Player),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// A line longer than `MAX_LINE_LEN`, already discarded. Holds its length.
    Oversized(usize),
}

/// Splits a byte stream into frames, skipping blank lines.
pub struct FrameReader<R> {
    reader: R,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Next non-blank frame, `None` once the stream ends.
    pub fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            let mut buf = Vec::with_capacity(MAX_LINE_LEN + 2);
            // room for the longest line plus "\r\n"
            let limit = MAX_LINE_LEN as u64 + 2;
            let read = (&mut self.reader).take(limit).read_until(b'\n', &mut buf)?;
            if read == 0 {
                return Ok(None);
            }

            if buf.last() != Some(&b'\n') && buf.len() as u64 == limit {
                let dropped = buf.len() + self.skip_line()?;
                return Ok(Some(Frame::Oversized(dropped)));
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            if line.len() > MAX_LINE_LEN {
                return Ok(Some(Frame::Oversized(line.len())));
            }
            return Ok(Some(Frame::Line(line.to_string())));
        }
    }

    /// Consumes the rest of the current line, returning how many bytes it had.
    fn skip_line(&mut self) -> io::Result<usize> {
        let mut skipped = 0;
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|&byte| byte == b'\n') {
                Some(end) => {
                    self.reader.consume(end + 1);
                    return Ok(skipped + end);
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                    skipped += len;
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

pub fn write_line<W: Write + ?Sized>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

pub fn write_hello<W: Write + ?Sized>(writer: &mut W, role: Role) -> io::Result<()> {
    write_line(writer, role.as_str())
}

/// Reads the opening line of a connection.
pub fn read_hello<R: BufRead>(frames: &mut FrameReader<R>) -> Result<Role, ChannelError> {
    match frames.next_frame()? {
        Some(Frame::Line(line)) => Role::parse(&line).ok_or(ChannelError::Handshake(line)),
        Some(Frame::Oversized(len)) => Err(ChannelError::Handshake(format!("<{len} bytes>"))),
        None => Err(ChannelError::Disconnected),
    }
}

/// Reads the moves a host replays to a joining player, up to `ready`.
pub fn read_catch_up<R: BufRead>(frames: &mut FrameReader<R>) -> Result<Vec<Move>, ChannelError> {
    let mut moves = Vec::new();
    loop {
        match frames.next_frame()? {
            Some(Frame::Line(line)) if line == READY => return Ok(moves),
            Some(Frame::Line(line)) if line == BUSY => {
                return Err(ChannelError::Handshake("host already has a player".to_string()))
            }
            Some(Frame::Line(line)) => moves.push(token::decode(&line)?),
            Some(Frame::Oversized(len)) => return Err(TokenError::Oversized(len).into()),
            None => return Err(ChannelError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frames(input: &str) -> Vec<Frame> {
        let mut reader = FrameReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn splits_concatenated_moves() {
        assert_eq!(
            frames("e2e4\ne7e5\r\ng1f3"),
            vec![
                Frame::Line("e2e4".into()),
                Frame::Line("e7e5".into()),
                Frame::Line("g1f3".into()),
            ]
        );
    }

    #[test]
    fn skips_blank_lines() {
        assert_eq!(frames("\n\n  \ne2e4\n\n"), vec![Frame::Line("e2e4".into())]);
    }

    #[test]
    fn long_lines_are_discarded_whole() {
        let long = "x".repeat(100);
        assert_eq!(
            frames(&format!("{long}\ne2e4\n")),
            vec![Frame::Oversized(100), Frame::Line("e2e4".into())]
        );
        assert_eq!(frames(&"y".repeat(17)), vec![Frame::Oversized(17)]);
    }

    #[test]
    fn line_at_the_limit_is_kept() {
        let exact = "z".repeat(MAX_LINE_LEN);
        assert_eq!(frames(&format!("{exact}\r\n")), vec![Frame::Line(exact)]);
    }

    #[test]
    fn hello_names_the_role() {
        let mut out = Vec::new();
        write_hello(&mut out, Role::Viewer).unwrap();
        write_line(&mut out, "e2e4").unwrap();
        assert_eq!(out, b"viewer\ne2e4\n");

        let mut reader = FrameReader::new(Cursor::new(out));
        assert_eq!(read_hello(&mut reader).unwrap(), Role::Viewer);
        assert_eq!(reader.next_frame().unwrap(), Some(Frame::Line("e2e4".into())));
    }

    #[test]
    fn unknown_hello_is_rejected() {
        let mut reader = FrameReader::new(Cursor::new(b"admin\n".to_vec()));
        assert!(matches!(read_hello(&mut reader), Err(ChannelError::Handshake(line)) if line == "admin"));

        let mut empty = FrameReader::new(Cursor::new(Vec::new()));
        assert!(matches!(read_hello(&mut empty), Err(ChannelError::Disconnected)));
    }

    #[test]
    fn catch_up_ends_at_ready_and_leaves_live_moves() {
        let mut reader = FrameReader::new(Cursor::new(b"e2e4\ne7e5\nready\ng1f3\n".to_vec()));
        let moves = read_catch_up(&mut reader).unwrap();
        assert_eq!(moves, vec![token::decode("e2e4").unwrap(), token::decode("e7e5").unwrap()]);
        assert_eq!(reader.next_frame().unwrap(), Some(Frame::Line("g1f3".into())));

        let mut fresh = FrameReader::new(Cursor::new(b"ready\n".to_vec()));
        assert!(read_catch_up(&mut fresh).unwrap().is_empty());
    }

    #[test]
    fn catch_up_reports_busy_hosts_and_bad_lines() {
        let mut busy = FrameReader::new(Cursor::new(b"busy\n".to_vec()));
        assert!(matches!(read_catch_up(&mut busy), Err(ChannelError::Handshake(_))));

        let mut garbled = FrameReader::new(Cursor::new(b"e2e4\nzz\nready\n".to_vec()));
        assert!(matches!(read_catch_up(&mut garbled), Err(ChannelError::Decode(TokenError::Length(_)))));

        let mut cut = FrameReader::new(Cursor::new(b"e2e4\n".to_vec()));
        assert!(matches!(read_catch_up(&mut cut), Err(ChannelError::Disconnected)));
    }
}
