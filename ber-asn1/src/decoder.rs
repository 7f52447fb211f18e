//! Resumable BER decoder engine
//!
//! The engine consumes input one state at a time: tag octets, length octets,
//! then content octets. Whenever the input runs dry it returns
//! [`DecodeStatus::NeedMoreData`] and every partial field stays in the
//! [`Container`], so the next call picks up exactly where this one stopped.
//! No call stack is left suspended across I/O.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use ber_asn1::{Asn1Decoder, Container, DecodeStatus};
//!
//! let mut container = Container::new(&grammar, MyMessage::default());
//! let mut input: &[u8] = &chunk;
//! if Asn1Decoder::decode(&mut input, &mut container)? == DecodeStatus::Decoded {
//!     let message = container.finish()?;
//! }
//! ```

use crate::container::Container;
use crate::grammar::{Decodable, Grammar, GrammarState, TlvEvent, Transition};
use ber_core::{BerError, BerResult, DecoderConfig, ResourceLimit};
use bytes::Buf;

/// Where the engine stands inside the current TLV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    /// Waiting for the first tag octet
    #[default]
    TagStart,
    /// Long-form tag, continuation octets outstanding
    TagPending,
    /// Waiting for the first length octet
    LengthStart,
    /// Long-form length, length octets outstanding
    LengthPending,
    /// Value buffer allocated, nothing copied yet
    ValueStart,
    /// Value buffer partially filled
    ValuePending,
    /// Tag, length and value all complete
    TlvDone,
    /// Outermost TLV complete
    PduDecoded,
    /// A terminal error was raised; the container is unusable
    Failed,
}

/// Outcome of a successful feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Input exhausted before the PDU completed; feed more bytes
    NeedMoreData,
    /// The PDU is complete; bytes after it were left in the buffer
    Decoded,
}

/// Stateless driver of the TLV state machine
///
/// All decode state lives in the [`Container`], so one `Asn1Decoder` (or
/// none at all, the methods are associated functions) serves every decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Asn1Decoder;

impl Asn1Decoder {
    /// Feed `buf` into `container`
    ///
    /// # Arguments
    /// * `buf` - Input, advanced past every consumed octet
    /// * `container` - Per-decode context
    ///
    /// # Returns
    /// `Decoded` as soon as the outermost TLV completes. Bytes after the PDU
    /// are not consumed. `NeedMoreData` once `buf` is empty.
    ///
    /// # Error Handling
    /// Any error is terminal: the container switches to
    /// [`DecodeState::Failed`] and every later call returns `DecoderFailed`.
    pub fn decode<B: Buf, T: Decodable>(
        buf: &mut B,
        container: &mut Container<'_, T>,
    ) -> BerResult<DecodeStatus> {
        match container.decode_state {
            DecodeState::Failed => return Err(BerError::DecoderFailed),
            DecodeState::PduDecoded => return Ok(DecodeStatus::Decoded),
            _ => {}
        }

        match Self::run(buf, container) {
            Ok(status) => Ok(status),
            Err(err) => {
                log::warn!(
                    "{} decode failed after {} bytes in state {:?}: {}",
                    container.grammar.name(),
                    container.consumed,
                    container.state,
                    err
                );
                container.decode_state = DecodeState::Failed;
                Err(err)
            }
        }
    }

    /// Decode one PDU that must fill `data` exactly
    ///
    /// Used for values a grammar gathered whole, such as a nested structure
    /// decoded with a grammar of its own.
    ///
    /// # Error Handling
    /// - `Truncated` if `data` ends before the PDU does
    /// - `TrailingData` if bytes remain after it
    pub fn decode_complete<T: Decodable>(
        grammar: &Grammar<T>,
        target: T,
        data: &[u8],
        config: DecoderConfig,
    ) -> BerResult<T::Output> {
        let mut container = Container::with_config(grammar, target, config)?;
        let mut input = data;
        match Self::decode(&mut input, &mut container)? {
            DecodeStatus::Decoded if input.is_empty() => container.finish(),
            DecodeStatus::Decoded => Err(BerError::TrailingData {
                remaining: input.len(),
            }),
            DecodeStatus::NeedMoreData => Err(BerError::Truncated {
                consumed: container.consumed,
            }),
        }
    }

    fn run<B: Buf, T: Decodable>(
        buf: &mut B,
        c: &mut Container<'_, T>,
    ) -> BerResult<DecodeStatus> {
        loop {
            match c.decode_state {
                DecodeState::TagStart | DecodeState::TagPending => {
                    let Some(byte) = Self::next_octet(buf, c)? else {
                        return Ok(DecodeStatus::NeedMoreData);
                    };
                    let max = c.config.max_tag_length;
                    c.decode_state = if c.stack.current_mut().tag_mut().accumulate(byte, max)? {
                        DecodeState::LengthStart
                    } else {
                        DecodeState::TagPending
                    };
                }
                DecodeState::LengthStart | DecodeState::LengthPending => {
                    let Some(byte) = Self::next_octet(buf, c)? else {
                        return Ok(DecodeStatus::NeedMoreData);
                    };
                    if c.stack.current_mut().length_mut().accumulate(byte, &c.config)? {
                        Self::header_done(c)?;
                    } else {
                        c.decode_state = DecodeState::LengthPending;
                    }
                }
                DecodeState::ValueStart | DecodeState::ValuePending => {
                    if !buf.has_remaining() {
                        return Ok(DecodeStatus::NeedMoreData);
                    }
                    let value = c.stack.current_mut().value_mut();
                    c.consumed += value.add_data(buf);
                    c.decode_state = if value.is_complete() {
                        DecodeState::TlvDone
                    } else {
                        DecodeState::ValuePending
                    };
                }
                DecodeState::TlvDone => Self::tlv_done(c)?,
                DecodeState::PduDecoded => return Ok(DecodeStatus::Decoded),
                DecodeState::Failed => return Err(BerError::DecoderFailed),
            }
        }
    }

    /// Take one header octet, charging it to the PDU size budget
    fn next_octet<B: Buf, T: Decodable>(
        buf: &mut B,
        c: &mut Container<'_, T>,
    ) -> BerResult<Option<u8>> {
        if !buf.has_remaining() {
            return Ok(None);
        }
        let byte = buf.get_u8();
        c.consumed += 1;
        if c.consumed > c.config.max_pdu_size {
            return Err(BerError::ResourceLimitExceeded(ResourceLimit::PduSize {
                max: c.config.max_pdu_size,
            }));
        }
        Ok(Some(byte))
    }

    /// Tag and length are known: check limits, resolve the transition and
    /// prepare for the content octets
    fn header_done<T: Decodable>(c: &mut Container<'_, T>) -> BerResult<()> {
        let depth = c.stack.depth();
        let tlv = c.stack.current();
        let tag_byte = tlv.tag().leading_byte();
        let constructed = tlv.is_constructed();
        let length = tlv.length().value();
        let size = tlv.size();

        log::trace!(
            "TLV header 0x{:02X} length {} at depth {} offset {}",
            tag_byte,
            length,
            depth,
            c.consumed
        );

        let limit = c.config.max_pdu_size;
        if c.consumed as u64 + length as u64 > limit as u64 {
            return Err(BerError::LengthTooLarge {
                length: length as u64,
                offset: c.consumed,
                limit,
            });
        }

        if let Some(parent) = c.stack.parent_mut() {
            let available = parent.remaining();
            if !parent.claim(size) {
                return Err(BerError::LengthMismatch {
                    needed: size,
                    available,
                });
            }
        }

        let transition = *c
            .grammar
            .transition(c.state, tag_byte)
            .ok_or_else(|| c.grammar.unexpected(c.state, tag_byte))?;

        if let Some(pinned) = transition.to.depth() {
            if pinned != depth {
                return Err(BerError::UnexpectedTag {
                    grammar: c.grammar.name(),
                    state: format!("{:?} at depth {}", c.state, depth),
                    tag: tag_byte,
                    expected: c.grammar.expected_tags(c.state),
                });
            }
        }

        if constructed && !transition.gather {
            if depth >= c.config.max_depth {
                return Err(BerError::ResourceLimitExceeded(ResourceLimit::Depth {
                    max: c.config.max_depth,
                }));
            }
            Self::apply(c, &transition)?;
            if length == 0 {
                c.decode_state = DecodeState::TlvDone;
            } else {
                c.stack.push();
                c.decode_state = DecodeState::TagStart;
            }
            return Ok(());
        }

        c.pending = Some(transition);
        c.stack.current_mut().value_mut().allocate(length);
        c.decode_state = if length == 0 {
            DecodeState::TlvDone
        } else {
            DecodeState::ValueStart
        };
        Ok(())
    }

    /// Run the pending action, then unwind every parent whose content this
    /// TLV completed
    fn tlv_done<T: Decodable>(c: &mut Container<'_, T>) -> BerResult<()> {
        if let Some(transition) = c.pending.take() {
            Self::apply(c, &transition)?;
        }

        loop {
            match c.stack.parent().map(|parent| parent.remaining()) {
                Some(0) => c.stack.pop(),
                Some(_) => {
                    c.stack.current_mut().reset();
                    c.decode_state = DecodeState::TagStart;
                    return Ok(());
                }
                None => {
                    if !c.grammar.is_accepting(c.state) {
                        return Err(BerError::IncompleteMessage {
                            grammar: c.grammar.name(),
                            state: format!("{:?}", c.state),
                        });
                    }
                    log::debug!("{} PDU decoded, {} bytes", c.grammar.name(), c.consumed);
                    c.decode_state = DecodeState::PduDecoded;
                    return Ok(());
                }
            }
        }
    }

    fn apply<T: Decodable>(c: &mut Container<'_, T>, transition: &Transition<T>) -> BerResult<()> {
        if let Some(action) = transition.action {
            let event = TlvEvent::new(c.stack.current(), c.stack.depth(), &c.config);
            action(&mut c.target, &event)?;
        }
        log::trace!(
            "{}: {:?} -> {:?} on 0x{:02X}",
            c.grammar.name(),
            transition.from,
            transition.to,
            transition.tag
        );
        c.state = transition.to;
        Ok(())
    }
}
