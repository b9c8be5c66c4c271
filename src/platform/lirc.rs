use std::io::{ErrorKind, Read};
use std::os::unix::net::UnixStream;
use std::path::Path;

use tracing::{debug, warn};

use crate::commands::{RemoteSource, Token};

/// IR remote transport reading decoded key presses from the lircd socket.
///
/// Each lircd line looks like `<code> <repeat> <key-name> <remote>`; the key
/// name is the third field. The socket is non-blocking so `poll` returns
/// immediately; when several lines are pending only the most recent one wins.
/// Any transport failure is logged once and the remote goes permanently
/// silent, per the degraded-transport policy.
pub struct LircRemote {
    stream: Option<UnixStream>,
}

impl LircRemote {
    pub fn connect(path: &Path) -> Self {
        let stream = match UnixStream::connect(path) {
            Ok(stream) => match stream.set_nonblocking(true) {
                Ok(()) => {
                    debug!(path = %path.display(), "connected to lircd socket");
                    Some(stream)
                }
                Err(err) => {
                    warn!(%err, "failed to make lircd socket non-blocking; remote disabled");
                    None
                }
            },
            Err(err) => {
                warn!(
                    %err,
                    path = %path.display(),
                    "lircd socket unavailable; continuing without remote"
                );
                None
            }
        };
        Self { stream }
    }

    /// A remote that was never connected; `poll` always returns `None`.
    pub fn disabled() -> Self {
        Self { stream: None }
    }
}

impl RemoteSource for LircRemote {
    fn poll(&mut self) -> Option<Token> {
        let stream = self.stream.as_mut()?;
        let mut buf = [0u8; 512];
        match stream.read(&mut buf) {
            Ok(0) => {
                warn!("lircd socket closed; remote disabled");
                self.stream = None;
                None
            }
            Ok(n) => parse_latest_key(&buf[..n]).and_then(Token::from_key_name),
            Err(err) if err.kind() == ErrorKind::WouldBlock => None,
            Err(err) => {
                warn!(%err, "lircd socket read failed; remote disabled");
                self.stream = None;
                None
            }
        }
    }
}

/// Extract the key name from the last complete line of a lircd burst.
fn parse_latest_key(data: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(data).ok()?;
    text.lines()
        .rev()
        .find_map(|line| line.split_whitespace().nth(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_the_key_name_field() {
        let line = b"0000000000f40bf0 00 KEY_PLAYPAUSE SAMSUNG\n";
        assert_eq!(parse_latest_key(line), Some("KEY_PLAYPAUSE"));
    }

    #[test]
    fn most_recent_line_wins() {
        let burst = b"a 00 KEY_LEFT r\nb 00 KEY_RIGHT r\n";
        assert_eq!(parse_latest_key(burst), Some("KEY_RIGHT"));
    }

    #[test]
    fn corrupt_data_is_ignored() {
        assert_eq!(parse_latest_key(b"garbage\n"), None);
        assert_eq!(parse_latest_key(&[0xff, 0xfe]), None);
        assert_eq!(parse_latest_key(b""), None);
    }

    #[test]
    fn disabled_remote_stays_silent() {
        let mut remote = LircRemote::disabled();
        assert_eq!(remote.poll(), None);
    }

    #[test]
    fn missing_socket_degrades_to_silent() {
        let mut remote = LircRemote::connect(Path::new("/nonexistent/lircd"));
        assert_eq!(remote.poll(), None);
    }

    #[test]
    fn delivers_tokens_from_a_live_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock_path = dir.path().join("lircd");
        let listener = std::os::unix::net::UnixListener::bind(&sock_path).unwrap();

        let mut remote = LircRemote::connect(&sock_path);
        let (mut server, _) = listener.accept().unwrap();
        assert_eq!(remote.poll(), None);

        server
            .write_all(b"0000000000f40bf0 00 KEY_RIGHT SAMSUNG\n")
            .unwrap();
        server.flush().unwrap();
        // Give the kernel a moment to move bytes through the socketpair.
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(remote.poll(), Some(Token::Next));
    }
}
