//! An open serial port: reader thread plus write handle.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tokio::sync::mpsc;

use owlhub_app::ports::Connection;
use owlhub_domain::error::OwlHubError;

use crate::error::SerialError;

/// Lines buffered between the reader thread and the ingestion loop.
const LINE_BUFFER: usize = 64;

/// Longest record kept; anything longer is dropped up to its terminator.
const MAX_RECORD_LEN: usize = 4096;

type LineResult = io::Result<String>;

/// Open session on one serial port.
///
/// Dropping the connection closes the write handle and lets the reader
/// thread exit after its current read times out.
pub struct SerialConnection {
    lines: mpsc::Receiver<LineResult>,
    writer: Box<dyn SerialPort>,
}

impl SerialConnection {
    /// Open `path` and start the reader thread. Blocking.
    pub(crate) fn open(
        path: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Self, SerialError> {
        let open_err = |source| SerialError::Open {
            path: path.to_string(),
            source,
        };

        let writer = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(open_err)?;
        let reader = writer.try_clone().map_err(open_err)?;

        let (tx, lines) = mpsc::channel(LINE_BUFFER);
        std::thread::Builder::new()
            .name(format!("serial-reader {path}"))
            .spawn(move || pump_lines(BufReader::new(reader), &tx))
            .map_err(|source| SerialError::Reader {
                path: path.to_string(),
                source,
            })?;

        Ok(Self { lines, writer })
    }
}

impl Connection for SerialConnection {
    async fn next_line(&mut self) -> Result<Option<String>, OwlHubError> {
        match self.lines.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(err)) => Err(SerialError::Io(err).into()),
            None => Ok(None),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), OwlHubError> {
        self.writer
            .write_all(bytes)
            .and_then(|()| self.writer.flush())
            .map_err(|err| SerialError::Io(err).into())
    }
}

/// Split `reader` into lines and forward them until EOF, a hard read error
/// or the receiving side going away.
///
/// Read timeouts are not errors: they only give the loop a chance to notice
/// that the connection was dropped. Bytes read before a timeout are kept.
/// Records longer than [`MAX_RECORD_LEN`] are discarded whole.
fn pump_lines<R: BufRead>(mut reader: R, lines: &mpsc::Sender<LineResult>) {
    let mut buf = Vec::new();
    let mut discarding = false;

    loop {
        if lines.is_closed() {
            return;
        }

        let limit = u64::try_from(MAX_RECORD_LEN - buf.len()).unwrap_or(u64::MAX);
        match reader.by_ref().take(limit).read_until(b'\n', &mut buf) {
            Ok(0) => {
                tracing::debug!("serial port reached end of stream");
                return;
            }
            Ok(_) if !buf.ends_with(b"\n") && buf.len() >= MAX_RECORD_LEN => {
                if !discarding {
                    tracing::debug!(limit = MAX_RECORD_LEN, "oversized serial record dropped");
                }
                discarding = true;
                buf.clear();
            }
            Ok(_) => {
                if std::mem::take(&mut discarding) {
                    buf.clear();
                    continue;
                }
                let line = frame(&buf);
                buf.clear();
                if lines.blocking_send(Ok(line)).is_err() {
                    return;
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => {
                let _ = lines.blocking_send(Err(err));
                return;
            }
        }
    }
}

/// Text of one record without its `\r\n` terminator.
fn frame(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Cursor, Read};

    /// Reader that replays scripted chunks and errors, then reports EOF.
    struct ScriptedReader(VecDeque<io::Result<Vec<u8>>>);

    impl Read for ScriptedReader {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                None => Ok(0),
                Some(Err(err)) => Err(err),
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(out.len());
                    out[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.0.push_front(Ok(chunk[n..].to_vec()));
                    }
                    Ok(n)
                }
            }
        }
    }

    fn collect(mut rx: mpsc::Receiver<LineResult>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line.unwrap());
        }
        lines
    }

    #[test]
    fn should_strip_crlf_terminator() {
        assert_eq!(frame(b"TEMP:25.0\r\n"), "TEMP:25.0");
        assert_eq!(frame(b"TEMP:25.0\n"), "TEMP:25.0");
        assert_eq!(frame(b"TEMP:25.0"), "TEMP:25.0");
        assert_eq!(frame(b"\r\n"), "");
    }

    #[test]
    fn should_forward_every_line_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let input = Cursor::new(b"Temp: 30.1\r\nHUM:55\r\n\r\n25.0,40,0,100\r\n".to_vec());

        pump_lines(BufReader::new(input), &tx);
        drop(tx);

        assert_eq!(
            collect(rx),
            vec!["Temp: 30.1", "HUM:55", "", "25.0,40,0,100"]
        );
    }

    #[test]
    fn should_keep_partial_line_across_read_timeout() {
        let (tx, rx) = mpsc::channel(8);
        let reader = ScriptedReader(VecDeque::from([
            Ok(b"TEMP:2".to_vec()),
            Err(io::Error::from(io::ErrorKind::TimedOut)),
            Ok(b"5.0\r\n".to_vec()),
        ]));

        pump_lines(BufReader::new(reader), &tx);
        drop(tx);

        assert_eq!(collect(rx), vec!["TEMP:25.0"]);
    }

    #[test]
    fn should_drop_oversized_record_and_resume_at_next_line() {
        let (tx, rx) = mpsc::channel(8);
        let mut input = vec![0xAA; MAX_RECORD_LEN * 2 + 17];
        input.extend_from_slice(b"\r\nHUM:50\r\n");

        pump_lines(BufReader::new(Cursor::new(input)), &tx);
        drop(tx);

        assert_eq!(collect(rx), vec!["HUM:50"]);
    }

    #[test]
    fn should_keep_record_just_under_limit() {
        let (tx, rx) = mpsc::channel(8);
        let mut input = vec![b'x'; MAX_RECORD_LEN - 1];
        input.push(b'\n');

        pump_lines(BufReader::new(Cursor::new(input)), &tx);
        drop(tx);

        assert_eq!(collect(rx), vec!["x".repeat(MAX_RECORD_LEN - 1)]);
    }

    #[test]
    fn should_forward_hard_read_error_and_stop() {
        let (tx, mut rx) = mpsc::channel(8);
        let reader = ScriptedReader(VecDeque::from([
            Ok(b"HUM:50\r\n".to_vec()),
            Err(io::Error::from(io::ErrorKind::BrokenPipe)),
            Ok(b"HUM:51\r\n".to_vec()),
        ]));

        pump_lines(BufReader::new(reader), &tx);
        drop(tx);

        assert_eq!(rx.try_recv().unwrap().unwrap(), "HUM:50");
        assert_eq!(
            rx.try_recv().unwrap().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn should_stop_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let input = Cursor::new(b"HUM:50\r\n".to_vec());

        pump_lines(BufReader::new(input), &tx);

        assert!(tx.is_closed());
    }
}
