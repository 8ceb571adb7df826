//! RESP protocol encoder
//!
//! Replies are serialized into one buffer and written with a single
//! `write_all`, so a multi-part array reaches the socket as one frame.

use crate::RespValue;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Append the wire encoding of `value` to `buf`
fn write_value(buf: &mut Vec<u8>, value: &RespValue) {
    match value {
        RespValue::SimpleString(s) => {
            buf.push(b'+');
            buf.extend_from_slice(s);
            buf.extend_from_slice(b"\r\n");
        }
        RespValue::Error(e) => {
            buf.push(b'-');
            buf.extend_from_slice(e);
            buf.extend_from_slice(b"\r\n");
        }
        RespValue::Integer(i) => {
            buf.push(b':');
            buf.extend_from_slice(i.to_string().as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        RespValue::BulkString(Some(bytes)) => {
            buf.push(b'$');
            buf.extend_from_slice(bytes.len().to_string().as_bytes());
            buf.extend_from_slice(b"\r\n");
            buf.extend_from_slice(bytes);
            buf.extend_from_slice(b"\r\n");
        }
        RespValue::BulkString(None) | RespValue::Null => {
            buf.extend_from_slice(b"$-1\r\n");
        }
        RespValue::Array(items) => {
            buf.push(b'*');
            buf.extend_from_slice(items.len().to_string().as_bytes());
            buf.extend_from_slice(b"\r\n");
            for item in items {
                write_value(buf, item);
            }
        }
    }
}

/// Encode a RESP value into a byte vector
pub fn encode_to_vec(value: &RespValue) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

/// RESP protocol async encoder
pub struct AsyncRespEncoder<W: AsyncWrite + Unpin> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> AsyncRespEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encode a RESP value and write it to the underlying stream
    pub async fn encode(&mut self, value: &RespValue) -> io::Result<()> {
        let bytes = encode_to_vec(value);
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_encode_simple_string() {
        let value = RespValue::SimpleString(Bytes::from("OK"));
        assert_eq!(String::from_utf8_lossy(&encode_to_vec(&value)), "+OK\r\n");
    }

    #[test]
    fn test_encode_error() {
        let value = RespValue::error("ERR boom");
        assert_eq!(
            String::from_utf8_lossy(&encode_to_vec(&value)),
            "-ERR boom\r\n"
        );
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(
            String::from_utf8_lossy(&encode_to_vec(&RespValue::Integer(-42))),
            ":-42\r\n"
        );
    }

    #[test]
    fn test_encode_bulk_string() {
        let value = RespValue::BulkString(Some(Bytes::from(b"hello" as &[u8])));
        assert_eq!(
            String::from_utf8_lossy(&encode_to_vec(&value)),
            "$5\r\nhello\r\n"
        );
    }

    #[test]
    fn test_encode_binary_bulk_string() {
        // payload bytes pass through untouched, CR/LF included
        let value = RespValue::BulkString(Some(Bytes::from(b"a\r\nb" as &[u8])));
        assert_eq!(encode_to_vec(&value), b"$4\r\na\r\nb\r\n".to_vec());
    }

    #[test]
    fn test_encode_null_bulk() {
        assert_eq!(
            String::from_utf8_lossy(&encode_to_vec(&RespValue::Null)),
            "$-1\r\n"
        );
        assert_eq!(
            String::from_utf8_lossy(&encode_to_vec(&RespValue::BulkString(None))),
            "$-1\r\n"
        );
    }

    #[test]
    fn test_encode_array() {
        let value = RespValue::Array(vec![
            RespValue::BulkString(Some(Bytes::from(b"GET" as &[u8]))),
            RespValue::BulkString(Some(Bytes::from(b"key" as &[u8]))),
        ]);
        assert_eq!(
            String::from_utf8_lossy(&encode_to_vec(&value)),
            "*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n"
        );
    }

    #[tokio::test]
    async fn test_encode_to_stream() {
        let mut buffer = Vec::new();
        {
            let mut encoder = AsyncRespEncoder::new(&mut buffer);
            encoder.encode(&RespValue::Integer(42)).await.unwrap();
            encoder
                .encode(&RespValue::BulkString(Some(Bytes::from("hi"))))
                .await
                .unwrap();
        }
        assert_eq!(String::from_utf8_lossy(&buffer), ":42\r\n$2\r\nhi\r\n");
    }
}
