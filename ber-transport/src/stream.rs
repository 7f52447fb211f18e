//! PDU reader over an async byte stream
//!
//! Socket reads return whatever happens to be available, so a read may end
//! in the middle of a tag, a length or a value, and may also carry the start
//! of the next PDU. [`PduReader`] keeps unconsumed bytes in a `BytesMut` and
//! feeds them to a [`Container`] until it reports a complete PDU.

use crate::error::{TransportError, TransportResult};
use ber_asn1::{Container, Decodable, DecodeStatus};
use ber_core::BerError;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default number of bytes requested per read
pub const DEFAULT_READ_CHUNK: usize = 4096;

/// Reader settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Spare capacity reserved before each read
    pub read_chunk: usize,
    /// Maximum wait for a single read, `None` waits forever
    pub read_timeout: Option<Duration>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            read_chunk: DEFAULT_READ_CHUNK,
            read_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ReaderSettings {
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }
}

/// Reads BER PDUs from `R`
#[derive(Debug)]
pub struct PduReader<R> {
    reader: R,
    buffer: BytesMut,
    settings: ReaderSettings,
    eof: bool,
}

impl<R: AsyncRead + Unpin> PduReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_settings(reader, ReaderSettings::default())
    }

    pub fn with_settings(reader: R, settings: ReaderSettings) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(settings.read_chunk),
            settings,
            eof: false,
        }
    }

    /// Bytes read from the stream but not consumed by a decode yet
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the peer closed its side of the stream
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Drive `container` until it holds a complete PDU
    ///
    /// # Returns
    /// `Ok(true)` once the PDU is complete; bytes after it stay buffered for
    /// the next call. `Ok(false)` if the stream ended cleanly before the
    /// first octet of a PDU.
    ///
    /// # Error Handling
    /// - `Decode(Truncated)` if the stream ends inside a PDU
    /// - `Decode(_)` for any other decode failure; the container is then
    ///   unusable and the connection should be dropped
    /// - `Closed` if called again after the end of the stream was reported
    /// - `Timeout` if a read exceeds the configured timeout
    pub async fn read_pdu<T: Decodable>(
        &mut self,
        container: &mut Container<'_, T>,
    ) -> TransportResult<bool> {
        loop {
            if container.feed(&mut self.buffer)? == DecodeStatus::Decoded {
                return Ok(true);
            }

            if self.eof {
                return match container.bytes_consumed() {
                    0 => Err(TransportError::Closed),
                    consumed => Err(BerError::Truncated { consumed }.into()),
                };
            }

            if self.fill().await? == 0 {
                self.eof = true;
                log::debug!("end of stream, {} bytes of a PDU pending", container.bytes_consumed());
                if container.bytes_consumed() == 0 {
                    return Ok(false);
                }
            }
        }
    }

    async fn fill(&mut self) -> TransportResult<usize> {
        self.buffer.reserve(self.settings.read_chunk);
        let read = self.reader.read_buf(&mut self.buffer);
        let n = match self.settings.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read)
                .await
                .map_err(|_| TransportError::Timeout)??,
            None => read.await?,
        };
        log::trace!("read {} bytes, {} buffered", n, self.buffer.len());
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ber_kerberos::{ErrorCode, KerberosCodec, KerberosTime, KrbError, PrincipalName};
    use tokio_test::io::Builder;

    fn sample(code: ErrorCode) -> KrbError {
        KrbError::new(
            code,
            "EXAMPLE.COM",
            PrincipalName::krbtgt("EXAMPLE.COM"),
            KerberosTime::parse("20240102030405Z").unwrap(),
            17,
        )
        .with_e_text("sample")
    }

    #[tokio::test]
    async fn test_pdu_split_across_reads() {
        let codec = KerberosCodec::new().unwrap();
        let bytes = sample(ErrorCode::KDC_ERR_NONE).encode().unwrap();
        let mock = Builder::new()
            .read(&bytes[..1])
            .read(&bytes[1..3])
            .read(&bytes[3..40])
            .read(&bytes[40..])
            .build();

        let mut reader = PduReader::new(mock);
        let mut container = codec.krb_error_container().unwrap();
        assert!(reader.read_pdu(&mut container).await.unwrap());
        assert_eq!(container.finish().unwrap(), sample(ErrorCode::KDC_ERR_NONE));
        assert_eq!(reader.buffered(), 0);
    }

    #[tokio::test]
    async fn test_pipelined_pdus_in_one_read() {
        let codec = KerberosCodec::new().unwrap();
        let mut bytes = sample(ErrorCode::KDC_ERR_NONE).encode().unwrap();
        bytes.extend(sample(ErrorCode::KRB_AP_ERR_SKEW).encode().unwrap());
        let mock = Builder::new().read(&bytes).build();

        let mut reader = PduReader::new(mock);
        let mut container = codec.krb_error_container().unwrap();
        assert!(reader.read_pdu(&mut container).await.unwrap());
        assert!(reader.buffered() > 0);
        let first = container.finish_and_reset(codec.krb_error_builder()).unwrap();
        assert_eq!(first.error_code, ErrorCode::KDC_ERR_NONE);

        assert!(reader.read_pdu(&mut container).await.unwrap());
        let second = container.finish_and_reset(codec.krb_error_builder()).unwrap();
        assert_eq!(second.error_code, ErrorCode::KRB_AP_ERR_SKEW);

        assert!(!reader.read_pdu(&mut container).await.unwrap());
        assert!(reader.is_eof());
        assert!(matches!(
            reader.read_pdu(&mut container).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_eof_inside_pdu() {
        let codec = KerberosCodec::new().unwrap();
        let bytes = sample(ErrorCode::KDC_ERR_NONE).encode().unwrap();
        let mock = Builder::new().read(&bytes[..20]).build();

        let mut reader = PduReader::new(mock);
        let mut container = codec.krb_error_container().unwrap();
        match reader.read_pdu(&mut container).await {
            Err(TransportError::Decode(BerError::Truncated { consumed })) => {
                assert_eq!(consumed, 20)
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_input() {
        let codec = KerberosCodec::new().unwrap();
        let mock = Builder::new().read(&[0x7E, 0x80]).build();

        let mut reader = PduReader::new(mock);
        let mut container = codec.krb_error_container().unwrap();
        let err = reader.read_pdu(&mut container).await.unwrap_err();
        assert!(err.is_decode());
        assert!(container.has_failed());
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let codec = KerberosCodec::new().unwrap();
        let (_client, server) = tokio::io::duplex(64);
        let settings = ReaderSettings::default().with_read_timeout(Some(Duration::from_millis(50)));
        let mut reader = PduReader::with_settings(server, settings);
        let mut container = codec.krb_error_container().unwrap();
        assert!(matches!(
            reader.read_pdu(&mut container).await,
            Err(TransportError::Timeout)
        ));
    }
}
