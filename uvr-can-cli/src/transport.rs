//! Line-based transport over stdio
//!
//! Capture lines arrive on stdin (typically piped from `candump`) and are
//! forwarded by a reader thread over a channel; send commands are written to
//! stdout, one per line, for a `cansend` wrapper to execute.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;
use uvr_can_codec::{CanFrame, CommandBuilder, Transport};

pub struct LineTransport<W: Write> {
    builder: CommandBuilder,
    lines: Receiver<String>,
    pending: VecDeque<String>,
    out: W,
    closed: bool,
}

impl LineTransport<io::Stdout> {
    /// Read capture lines from stdin on a background thread.
    pub fn stdio(device: &str) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to read capture input: {}", e);
                        break;
                    }
                }
            }
            log::debug!("Capture input closed");
        });
        Self::new(device, rx, io::stdout())
    }
}

impl<W: Write> LineTransport<W> {
    pub fn new(device: &str, lines: Receiver<String>, out: W) -> Self {
        Self {
            builder: CommandBuilder::new(device),
            lines,
            pending: VecDeque::new(),
            out,
            closed: false,
        }
    }

    /// Interface the send commands are addressed to
    pub fn device(&self) -> &str {
        self.builder.device()
    }

    /// Block up to `timeout` for the next capture line.
    pub fn wait(&mut self, timeout: Duration) {
        if !self.pending.is_empty() || self.closed {
            return;
        }
        match self.lines.recv_timeout(timeout) {
            Ok(line) => self.pending.push_back(line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.closed = true,
        }
    }

    /// True once the input has ended and every line was consumed.
    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Transport for LineTransport<W> {
    fn send(&mut self, frame: &CanFrame) -> uvr_can_codec::Result<()> {
        let command = self.builder.build(frame);
        writeln!(self.out, "{}", command)?;
        self.out.flush()?;
        log::debug!("Sent {}", command);
        Ok(())
    }

    fn receive_nonblocking(&mut self) -> Option<String> {
        if let Some(line) = self.pending.pop_front() {
            return Some(line);
        }
        match self.lines.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_writes_command_lines() {
        let (_tx, rx) = mpsc::channel();
        let mut transport = LineTransport::new("can0", rx, Vec::new());
        assert_eq!(transport.device(), "can0");
        transport.send(&CanFrame::new(0x17E, vec![0x05])).unwrap();
        transport.send(&CanFrame::new(0x100, vec![])).unwrap();
        assert_eq!(
            String::from_utf8(transport.output().clone()).unwrap(),
            "can0 17e#05\ncan0 100#\n"
        );
    }

    #[test]
    fn test_receive_until_closed() {
        let (tx, rx) = mpsc::channel();
        let mut transport = LineTransport::new("can0", rx, Vec::new());
        tx.send("first".to_string()).unwrap();
        tx.send("second".to_string()).unwrap();
        drop(tx);

        transport.wait(Duration::from_millis(10));
        assert_eq!(transport.receive_nonblocking().as_deref(), Some("first"));
        assert_eq!(transport.receive_nonblocking().as_deref(), Some("second"));
        assert!(!transport.is_closed());
        assert_eq!(transport.receive_nonblocking(), None);
        assert!(transport.is_closed());
    }

    #[test]
    fn test_wait_times_out() {
        let (_tx, rx) = mpsc::channel::<String>();
        let mut transport = LineTransport::new("can0", rx, Vec::new());
        transport.wait(Duration::from_millis(5));
        assert_eq!(transport.receive_nonblocking(), None);
        assert!(!transport.is_closed());
    }
}
