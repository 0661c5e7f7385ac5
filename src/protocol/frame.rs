use bytes::{Bytes, BytesMut};
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest line accepted before the connection is dropped
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Errors produced while turning a line into a command
#[derive(Debug, Error)]
pub enum FrameError {
  /// The line is not valid JSON
  #[error("malformed request: {0}")]
  Syntax(#[source] serde_json::Error),
  /// The line is JSON but not an object with an `op` string
  #[error("request must be an object with an \"op\" string")]
  MissingOp,
  /// No command is registered under the given name
  #[error("unknown command '{0}'")]
  UnknownCommand(String),
  /// The arguments do not fit the command
  #[error("invalid arguments for '{op}': {source}")]
  InvalidArguments {
    op: String,
    #[source]
    source: serde_json::Error,
  },
  /// A line grew past [`MAX_FRAME_LEN`] without a terminator
  #[error("request exceeds {} bytes", MAX_FRAME_LEN)]
  TooLong,
}

/// Line framing for newline-delimited JSON
pub struct Parser;

impl Parser {
  /// Split the next complete line off the front of `buffer`, without its
  /// `\n` or `\r\n` terminator. Blank lines are skipped. Returns `Ok(None)`
  /// until a full line is buffered.
  pub fn next_frame(buffer: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
    loop {
      let Some(end) = buffer.iter().position(|b| *b == b'\n') else {
        if buffer.len() > MAX_FRAME_LEN {
          return Err(FrameError::TooLong);
        }
        return Ok(None);
      };
      if end > MAX_FRAME_LEN {
        return Err(FrameError::TooLong);
      }

      let mut line = buffer.split_to(end + 1);
      line.truncate(end);
      if line.last() == Some(&b'\r') {
        line.truncate(end - 1);
      }

      if line.iter().all(u8::is_ascii_whitespace) {
        continue;
      }
      return Ok(Some(line.freeze()));
    }
  }

  /// Decode a line into its command name and argument object
  pub fn decode(line: &[u8]) -> Result<(String, Map<String, Value>), FrameError> {
    let value: Value = serde_json::from_slice(line).map_err(FrameError::Syntax)?;

    let Value::Object(mut args) = value else {
      return Err(FrameError::MissingOp);
    };
    match args.remove("op") {
      Some(Value::String(op)) => Ok((op, args)),
      _ => Err(FrameError::MissingOp),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_next_frame_waits_for_terminator() {
    let mut buffer = BytesMut::from(&b"{\"op\": \"list_"[..]);
    assert_eq!(Parser::next_frame(&mut buffer).unwrap(), None);

    buffer.extend_from_slice(b"users\"}\n{\"op\"");
    let frame = Parser::next_frame(&mut buffer).unwrap().unwrap();
    assert_eq!(&frame[..], b"{\"op\": \"list_users\"}");
    assert_eq!(&buffer[..], b"{\"op\"");
  }

  #[test]
  fn test_next_frame_strips_crlf_and_skips_blank_lines() {
    let mut buffer = BytesMut::from(&b"\r\n  \n{\"op\":\"a\"}\r\n"[..]);
    let frame = Parser::next_frame(&mut buffer).unwrap().unwrap();
    assert_eq!(&frame[..], b"{\"op\":\"a\"}");
    assert!(buffer.is_empty());
  }

  #[test]
  fn test_next_frame_rejects_oversized_line() {
    let mut buffer = BytesMut::from(vec![b'x'; MAX_FRAME_LEN + 1].as_slice());
    assert!(matches!(
      Parser::next_frame(&mut buffer),
      Err(FrameError::TooLong)
    ));
  }

  #[test]
  fn test_next_frame_rejects_oversized_terminated_line() {
    let mut line = vec![b'x'; MAX_FRAME_LEN + 1];
    line.push(b'\n');
    let mut buffer = BytesMut::from(line.as_slice());
    assert!(matches!(
      Parser::next_frame(&mut buffer),
      Err(FrameError::TooLong)
    ));

    let mut line = vec![b'x'; MAX_FRAME_LEN];
    line.push(b'\n');
    let mut buffer = BytesMut::from(line.as_slice());
    let frame = Parser::next_frame(&mut buffer).unwrap().unwrap();
    assert_eq!(frame.len(), MAX_FRAME_LEN);
  }

  #[test]
  fn test_decode_splits_op_from_args() {
    let line = b"{\"op\": \"get_user\", \"user_id\": \"abc\"}";
    let (op, args) = Parser::decode(line).unwrap();
    assert_eq!(op, "get_user");
    assert_eq!(args.get("user_id"), Some(&Value::String("abc".to_string())));
    assert!(!args.contains_key("op"));
  }

  #[test]
  fn test_decode_errors() {
    assert!(matches!(
      Parser::decode(b"{not json"),
      Err(FrameError::Syntax(_))
    ));
    assert!(matches!(
      Parser::decode(b"[1, 2]"),
      Err(FrameError::MissingOp)
    ));
    assert!(matches!(
      Parser::decode(b"{\"op\": 7}"),
      Err(FrameError::MissingOp)
    ));
  }
}
