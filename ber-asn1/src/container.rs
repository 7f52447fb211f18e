//! Per-decode context
//!
//! A [`Container`] ties one in-flight decode to the grammar driving it: the
//! grammar state, the engine sub-state, the TLV stack and the object the
//! grammar actions populate. Containers are cheap to create, but a container
//! that decoded successfully can also be reset and reused, keeping its TLV
//! slots and value buffers.

use crate::ber::tlv::TlvStack;
use crate::decoder::{Asn1Decoder, DecodeState, DecodeStatus};
use crate::grammar::{Decodable, Grammar, GrammarState, Transition};
use ber_core::{BerError, BerResult, DecoderConfig};
use bytes::Buf;
use std::mem;

/// Decode context for one PDU of type `T`
pub struct Container<'g, T: Decodable> {
    pub(crate) grammar: &'g Grammar<T>,
    pub(crate) config: DecoderConfig,
    pub(crate) state: T::State,
    pub(crate) decode_state: DecodeState,
    pub(crate) stack: TlvStack,
    /// Transition resolved at header time, applied when the TLV completes
    pub(crate) pending: Option<Transition<T>>,
    pub(crate) consumed: usize,
    pub(crate) target: T,
}

impl<'g, T: Decodable> Container<'g, T> {
    /// Create a container with the default configuration
    pub fn new(grammar: &'g Grammar<T>, target: T) -> Self {
        Self::build(grammar, target, DecoderConfig::default())
    }

    /// Create a container with explicit limits
    ///
    /// # Error Handling
    /// Returns `InvalidConfig` if `config` fails [`DecoderConfig::validate`].
    pub fn with_config(
        grammar: &'g Grammar<T>,
        target: T,
        config: DecoderConfig,
    ) -> BerResult<Self> {
        config.validate()?;
        Ok(Self::build(grammar, target, config))
    }

    fn build(grammar: &'g Grammar<T>, target: T, config: DecoderConfig) -> Self {
        Self {
            grammar,
            config,
            state: <T::State as GrammarState>::START,
            decode_state: DecodeState::TagStart,
            stack: TlvStack::new(),
            pending: None,
            consumed: 0,
            target,
        }
    }

    /// Feed the next chunk of input, see [`Asn1Decoder::decode`]
    pub fn feed<B: Buf>(&mut self, buf: &mut B) -> BerResult<DecodeStatus> {
        Asn1Decoder::decode(buf, self)
    }

    /// Consume the container and build the decoded message
    ///
    /// # Error Handling
    /// - `DecoderFailed` if a previous feed failed
    /// - `Truncated` if the PDU is not complete, e.g. the stream ended
    ///   inside a constructed TLV
    pub fn finish(self) -> BerResult<T::Output> {
        self.check_decoded()?;
        self.target.build()
    }

    /// Build the decoded message and get ready for the next PDU
    pub fn finish_and_reset(&mut self, next: T) -> BerResult<T::Output> {
        self.check_decoded()?;
        let target = mem::replace(&mut self.target, next);
        self.clear();
        target.build()
    }

    /// Start over with a new target, keeping allocated TLV slots
    ///
    /// # Error Handling
    /// A failed container cannot be reused and returns `DecoderFailed`.
    pub fn reset(&mut self, target: T) -> BerResult<()> {
        if self.has_failed() {
            return Err(BerError::DecoderFailed);
        }
        self.target = target;
        self.clear();
        Ok(())
    }

    fn clear(&mut self) {
        log::debug!(
            "{} container reset after {} bytes",
            self.grammar.name(),
            self.consumed
        );
        self.state = <T::State as GrammarState>::START;
        self.decode_state = DecodeState::TagStart;
        self.stack.reset();
        self.pending = None;
        self.consumed = 0;
    }

    fn check_decoded(&self) -> BerResult<()> {
        match self.decode_state {
            DecodeState::PduDecoded => Ok(()),
            DecodeState::Failed => Err(BerError::DecoderFailed),
            _ => Err(BerError::Truncated {
                consumed: self.consumed,
            }),
        }
    }

    pub fn is_decoded(&self) -> bool {
        self.decode_state == DecodeState::PduDecoded
    }

    pub fn has_failed(&self) -> bool {
        self.decode_state == DecodeState::Failed
    }

    /// Current grammar state
    pub fn state(&self) -> T::State {
        self.state
    }

    /// Current engine sub-state
    pub fn decode_state(&self) -> DecodeState {
        self.decode_state
    }

    /// Nesting depth of the TLV being decoded
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Octets of the current PDU consumed so far
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    pub fn grammar(&self) -> &'g Grammar<T> {
        self.grammar
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Object populated so far
    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TlvEvent;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FlagState {
        Start,
        Flag,
    }

    impl GrammarState for FlagState {
        const COUNT: usize = 2;
        const START: Self = FlagState::Start;

        fn index(self) -> usize {
            self as usize
        }
    }

    #[derive(Debug, Default)]
    struct Flag(Option<bool>);

    impl Decodable for Flag {
        type State = FlagState;
        type Output = bool;

        fn build(self) -> BerResult<bool> {
            self.0
                .ok_or_else(|| BerError::InvalidValue("flag missing".to_string()))
        }
    }

    fn set_flag(flag: &mut Flag, event: &TlvEvent<'_>) -> BerResult<()> {
        flag.0 = Some(crate::ber::value::Value::decode_boolean(event.value())?);
        Ok(())
    }

    fn flag_grammar() -> Grammar<Flag> {
        Grammar::builder("FLAG")
            .on_action(FlagState::Start, 0x01, FlagState::Flag, set_flag)
            .accept(FlagState::Flag)
            .build()
            .unwrap()
    }

    #[test]
    fn test_split_boolean() {
        let grammar = flag_grammar();
        let mut container = Container::new(&grammar, Flag::default());
        let mut first: &[u8] = &[0x01];
        assert_eq!(container.feed(&mut first).unwrap(), DecodeStatus::NeedMoreData);
        assert_eq!(container.decode_state(), DecodeState::LengthStart);
        let mut second: &[u8] = &[0x01];
        assert_eq!(container.feed(&mut second).unwrap(), DecodeStatus::NeedMoreData);
        assert_eq!(container.decode_state(), DecodeState::ValueStart);
        assert!(container.target().0.is_none());
        let mut third: &[u8] = &[0xFF];
        assert_eq!(container.feed(&mut third).unwrap(), DecodeStatus::Decoded);
        assert_eq!(container.bytes_consumed(), 3);
        assert!(container.finish().unwrap());
    }

    #[test]
    fn test_finish_before_complete() {
        let grammar = flag_grammar();
        let mut container = Container::new(&grammar, Flag::default());
        let mut input: &[u8] = &[0x01, 0x01];
        container.feed(&mut input).unwrap();
        assert_eq!(container.finish(), Err(BerError::Truncated { consumed: 2 }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let grammar = flag_grammar();
        let config = DecoderConfig::new().with_max_depth(0);
        assert!(matches!(
            Container::with_config(&grammar, Flag::default(), config),
            Err(BerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset_mid_decode() {
        let grammar = flag_grammar();
        let mut container = Container::new(&grammar, Flag::default());
        let mut input: &[u8] = &[0x01, 0x01];
        container.feed(&mut input).unwrap();
        container.reset(Flag::default()).unwrap();
        assert_eq!(container.decode_state(), DecodeState::TagStart);
        let mut input: &[u8] = &[0x01, 0x01, 0x00];
        assert_eq!(container.feed(&mut input).unwrap(), DecodeStatus::Decoded);
        assert!(!container.finish().unwrap());
    }

    #[test]
    fn test_action_error_fails_container() {
        let grammar = flag_grammar();
        let mut container = Container::new(&grammar, Flag::default());
        let mut input: &[u8] = &[0x01, 0x02, 0x00, 0x00];
        assert!(matches!(
            container.feed(&mut input),
            Err(BerError::InvalidValue(_))
        ));
        assert!(container.has_failed());
    }
}
