//! RESP protocol async parser

use crate::{RespError, RespValue};
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Default maximum frame size: 512MB (prevents memory overflow attacks)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements accepted in a single array frame
const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// RESP protocol async parser
pub struct AsyncRespParser<R: AsyncRead + Unpin> {
    reader: BufReader<R>,
    max_bytes: usize,
    bytes_read: usize,
}

impl<R: AsyncRead + Unpin> AsyncRespParser<R> {
    /// Create a new async parser (using default max frame size)
    pub fn new(reader: R) -> Self {
        Self::with_max_bytes(reader, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new async parser with an explicit frame size limit
    pub fn with_max_bytes(reader: R, max_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            max_bytes,
            bytes_read: 0,
        }
    }

    /// Reset byte counter (call between frames when parsing a pipeline)
    pub fn reset_bytes_read(&mut self) {
        self.bytes_read = 0;
    }

    fn check_frame_size(&mut self, additional: usize) -> Result<(), RespError> {
        self.bytes_read = self.bytes_read.saturating_add(additional);
        if self.bytes_read > self.max_bytes {
            Err(RespError::FrameTooLarge(self.bytes_read, self.max_bytes))
        } else {
            Ok(())
        }
    }

    /// Read one header line, stripping the trailing CRLF
    async fn read_line(&mut self) -> Result<Vec<u8>, RespError> {
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Err(RespError::UnexpectedEof);
        }
        self.check_frame_size(n)?;
        while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(line)
    }

    fn parse_len(line: &[u8]) -> Result<i64, RespError> {
        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                RespError::InvalidFormat(format!(
                    "Invalid length: {}",
                    String::from_utf8_lossy(line)
                ))
            })
    }

    /// Parse the next RESP value from the stream
    pub async fn parse(&mut self) -> Result<RespValue, RespError> {
        let line = self.read_line().await?;
        if line.is_empty() {
            return Err(RespError::InvalidFormat("Empty line".to_string()));
        }

        let (kind, rest) = (line[0], &line[1..]);
        match kind {
            b'*' => self.parse_array(rest).await,
            b'$' => self.parse_bulk(rest).await,
            b':' => self.parse_int(rest),
            b'+' => Ok(RespValue::SimpleString(Bytes::from(rest.to_vec()))),
            b'-' => Ok(RespValue::Error(Bytes::from(rest.to_vec()))),
            other => Err(RespError::InvalidType(other)),
        }
    }

    /// Parse integer: :123\r\n
    fn parse_int(&mut self, rest: &[u8]) -> Result<RespValue, RespError> {
        let text = std::str::from_utf8(rest)
            .map_err(|_| RespError::InvalidFormat("Non-ASCII integer".to_string()))?;
        let num = text
            .parse::<i128>()
            .map_err(|_| RespError::InvalidFormat(format!("Invalid integer: {}", text)))?;
        if num > i64::MAX as i128 || num < i64::MIN as i128 {
            return Err(RespError::IntegerOverflow);
        }
        Ok(RespValue::Integer(num as i64))
    }

    /// Parse bulk string: $5\r\nhello\r\n
    async fn parse_bulk(&mut self, rest: &[u8]) -> Result<RespValue, RespError> {
        let len = Self::parse_len(rest)?;
        if len == -1 {
            return Ok(RespValue::Null);
        }
        if len < 0 {
            return Err(RespError::InvalidFormat(format!(
                "Invalid bulk string length: {}",
                len
            )));
        }

        let len = len as usize;
        self.check_frame_size(len + 2)?;

        let mut buffer = vec![0u8; len];
        self.reader.read_exact(&mut buffer).await?;

        let mut crlf = [0u8; 2];
        self.reader.read_exact(&mut crlf).await?;
        if crlf != [b'\r', b'\n'] {
            return Err(RespError::InvalidFormat(
                "Expected \\r\\n after bulk string".to_string(),
            ));
        }

        Ok(RespValue::BulkString(Some(Bytes::from(buffer))))
    }

    /// Parse array: *2\r\n$3\r\nGET\r\n$3\r\nkey\r\n
    async fn parse_array(&mut self, rest: &[u8]) -> Result<RespValue, RespError> {
        let count = Self::parse_len(rest)?;
        if count == -1 {
            return Ok(RespValue::Null);
        }
        if count < 0 {
            return Err(RespError::InvalidFormat(format!(
                "Invalid array length: {}",
                count
            )));
        }

        let count = count as usize;
        if count > MAX_ARRAY_LEN {
            return Err(RespError::InvalidFormat(format!(
                "Array too large: {} elements",
                count
            )));
        }

        let mut array = Vec::with_capacity(count);
        for _ in 0..count {
            let parse_fut = Box::pin(async { self.parse().await });
            array.push(parse_fut.await?);
        }
        Ok(RespValue::Array(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_parse_simple_string() {
        let reader = Builder::new().read(b"+OK\r\n").build();
        let mut parser = AsyncRespParser::with_max_bytes(reader, 1024);
        let result = parser.parse().await.unwrap();
        assert_eq!(result, RespValue::SimpleString(Bytes::from("OK")));
    }

    #[tokio::test]
    async fn test_parse_bulk_string() {
        let reader = Builder::new().read(b"$5\r\nhello\r\n").build();
        let mut parser = AsyncRespParser::with_max_bytes(reader, 1024);
        let result = parser.parse().await.unwrap();
        assert_eq!(
            result,
            RespValue::BulkString(Some(Bytes::from(b"hello" as &[u8])))
        );
    }

    #[tokio::test]
    async fn test_parse_binary_bulk_string() {
        // payload bytes may contain CR/LF; the declared length wins
        let reader = Builder::new().read(b"$4\r\na\r\nb\r\n").build();
        let mut parser = AsyncRespParser::with_max_bytes(reader, 1024);
        let result = parser.parse().await.unwrap();
        assert_eq!(
            result,
            RespValue::BulkString(Some(Bytes::from(b"a\r\nb" as &[u8])))
        );
    }

    #[tokio::test]
    async fn test_parse_null_bulk() {
        let reader = Builder::new().read(b"$-1\r\n").build();
        let mut parser = AsyncRespParser::with_max_bytes(reader, 1024);
        assert_eq!(parser.parse().await.unwrap(), RespValue::Null);
    }

    #[tokio::test]
    async fn test_parse_array() {
        let reader = Builder::new()
            .read(b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n")
            .build();
        let mut parser = AsyncRespParser::with_max_bytes(reader, 1024);
        let result = parser.parse().await.unwrap();
        match result {
            RespValue::Array(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[0],
                    RespValue::BulkString(Some(Bytes::from(b"GET" as &[u8])))
                );
                assert_eq!(
                    items[1],
                    RespValue::BulkString(Some(Bytes::from(b"key" as &[u8])))
                );
            }
            _ => panic!("Expected array"),
        }
    }

    #[tokio::test]
    async fn test_frame_too_large() {
        let reader = Builder::new().read(b"$9999999999\r\n").build();
        let mut parser = AsyncRespParser::with_max_bytes(reader, 1024);
        let result = parser.parse().await;
        assert!(matches!(result, Err(RespError::FrameTooLarge(_, _))));
    }

    #[tokio::test]
    async fn test_eof_reported() {
        let mut parser = AsyncRespParser::with_max_bytes(&b""[..], 1024);
        assert!(matches!(
            parser.parse().await,
            Err(RespError::UnexpectedEof)
        ));
    }
}
