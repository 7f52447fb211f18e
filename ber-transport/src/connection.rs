//! Request/response loop over one connection
//!
//! [`serve_connection`] reads PDUs one after another with a single reused
//! [`Container`], hands each decoded message to a [`PduHandler`] and writes
//! back whatever the handler returns. A malformed PDU ends the connection:
//! once the framing is lost there is no reliable way to find the start of
//! the next message.

use crate::error::TransportResult;
use crate::stream::{PduReader, ReaderSettings};
use async_trait::async_trait;
use ber_asn1::{Container, Decodable, Grammar};
use ber_core::DecoderConfig;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Application side of a connection
#[async_trait]
pub trait PduHandler<T>: Send
where
    T: Decodable + Send,
    T::Output: Send + 'static,
{
    /// Fresh decode target for the next PDU
    fn new_target(&mut self) -> T;

    /// Process one decoded PDU
    ///
    /// # Returns
    /// Encoded bytes to send back to the peer, or `None` for no response.
    async fn handle(&mut self, pdu: T::Output) -> TransportResult<Option<Vec<u8>>>;
}

/// Serve PDUs on `stream` until the peer closes it
///
/// # Arguments
/// * `stream` - Connected byte stream
/// * `grammar` - Grammar of the PDUs the peer sends
/// * `config` - Decoder limits applied to every PDU
/// * `settings` - Read chunk size and timeout
/// * `handler` - Receives each decoded PDU
///
/// # Returns
/// Number of PDUs handled before the peer closed the stream
///
/// # Error Handling
/// Decode errors are logged and returned after shutting the stream down.
/// Handler and I/O errors are returned as they are.
pub async fn serve_connection<S, T, H>(
    stream: S,
    grammar: &Grammar<T>,
    config: DecoderConfig,
    settings: ReaderSettings,
    handler: &mut H,
) -> TransportResult<usize>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    T: Decodable + Send,
    T::Output: Send + 'static,
    H: PduHandler<T>,
{
    let mut container = Container::with_config(grammar, handler.new_target(), config)?;
    let mut reader = PduReader::with_settings(stream, settings);
    let mut handled = 0;

    loop {
        match reader.read_pdu(&mut container).await {
            Ok(true) => {}
            Ok(false) => {
                log::info!("Peer closed connection after {} {} PDUs", handled, grammar.name());
                return Ok(handled);
            }
            Err(e) => {
                if e.is_decode() {
                    log::error!("Error decoding {} PDU: {}", grammar.name(), e);
                    if let Err(shutdown_err) = reader.get_mut().shutdown().await {
                        log::error!("Failed to shut down connection: {}", shutdown_err);
                    }
                }
                return Err(e);
            }
        }

        let pdu = container.finish_and_reset(handler.new_target())?;
        handled += 1;
        log::info!(
            "Received {} PDU #{} ({} bytes buffered)",
            grammar.name(),
            handled,
            reader.buffered()
        );

        if let Some(response) = handler.handle(pdu).await? {
            let stream = reader.get_mut();
            stream.write_all(&response).await?;
            stream.flush().await?;
            log::debug!("Sent {} byte response", response.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use ber_core::BerError;
    use ber_kerberos::{
        ErrorCode, KerberosCodec, KerberosTime, KrbError, KrbErrorBuilder, PrincipalName,
    };
    use tokio::io::AsyncReadExt;
    use tokio_test::io::Builder;

    /// Answers every KRB-ERROR with its error code as a single octet
    struct CodeEcho<'c> {
        codec: &'c KerberosCodec,
        seen: Vec<ErrorCode>,
    }

    #[async_trait]
    impl<'c> PduHandler<KrbErrorBuilder> for CodeEcho<'c> {
        fn new_target(&mut self) -> KrbErrorBuilder {
            self.codec.krb_error_builder()
        }

        async fn handle(&mut self, pdu: KrbError) -> TransportResult<Option<Vec<u8>>> {
            self.seen.push(pdu.error_code);
            Ok(Some(vec![pdu.error_code.0 as u8]))
        }
    }

    fn sample(code: ErrorCode) -> Vec<u8> {
        KrbError::new(
            code,
            "EXAMPLE.COM",
            PrincipalName::krbtgt("EXAMPLE.COM"),
            KerberosTime::parse("20240102030405Z").unwrap(),
            0,
        )
        .encode()
        .unwrap()
    }

    #[tokio::test]
    async fn test_serve_single_pdu() {
        let codec = KerberosCodec::new().unwrap();
        let bytes = sample(ErrorCode::KRB_AP_ERR_SKEW);
        let mock = Builder::new()
            .read(&bytes[..10])
            .read(&bytes[10..])
            .write(&[37])
            .build();

        let mut handler = CodeEcho { codec: &codec, seen: Vec::new() };
        let handled = serve_connection(
            mock,
            codec.krb_error_grammar(),
            *codec.config(),
            ReaderSettings::default(),
            &mut handler,
        )
        .await
        .unwrap();
        assert_eq!(handled, 1);
        assert_eq!(handler.seen, vec![ErrorCode::KRB_AP_ERR_SKEW]);
    }

    #[tokio::test]
    async fn test_serve_pipelined_pdus() {
        let codec = KerberosCodec::new().unwrap();
        let mut bytes = sample(ErrorCode::KDC_ERR_NONE);
        bytes.extend(sample(ErrorCode::KDC_ERR_PREAUTH_REQUIRED));
        let mock = Builder::new().read(&bytes).write(&[0]).write(&[25]).build();

        let mut handler = CodeEcho { codec: &codec, seen: Vec::new() };
        let handled = serve_connection(
            mock,
            codec.krb_error_grammar(),
            *codec.config(),
            ReaderSettings::default(),
            &mut handler,
        )
        .await
        .unwrap();
        assert_eq!(handled, 2);
        assert_eq!(
            handler.seen,
            vec![ErrorCode::KDC_ERR_NONE, ErrorCode::KDC_ERR_PREAUTH_REQUIRED]
        );
    }

    #[tokio::test]
    async fn test_malformed_pdu_closes_connection() {
        let codec = KerberosCodec::new().unwrap();
        let (mut client, server) = tokio::io::duplex(256);
        // [APPLICATION 30] holding an INTEGER where the SEQUENCE belongs
        client.write_all(&[0x7E, 0x03, 0x02, 0x01, 0x05]).await.unwrap();

        let mut handler = CodeEcho { codec: &codec, seen: Vec::new() };
        let result = serve_connection(
            server,
            codec.krb_error_grammar(),
            *codec.config(),
            ReaderSettings::default(),
            &mut handler,
        )
        .await;
        assert!(matches!(
            result,
            Err(TransportError::Decode(BerError::UnexpectedTag { tag: 0x02, .. }))
        ));
        assert!(handler.seen.is_empty());

        let mut rest = Vec::new();
        assert_eq!(client.read_to_end(&mut rest).await.unwrap(), 0);
    }
}
