//! Declarative grammars driving the decoder
//!
//! A grammar is a table indexed by `(state, tag byte)`. Each populated cell
//! holds a [`Transition`]: the next state, plus an optional action that
//! stores what the TLV carried into the object under construction.
//! Message types add their own grammar without touching the decoder.
//!
//! A grammar is immutable once built, so one instance can serve any number
//! of concurrent decodes, each with its own [`crate::Container`].

use crate::ber::tag::Tag;
use crate::ber::tlv::Tlv;
use crate::ber::value::Value;
use ber_core::{BerError, BerResult, DecoderConfig, ExpectedTags};
use std::fmt;

/// Closed set of states of one message type
pub trait GrammarState: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Number of states; `index()` must stay below it
    const COUNT: usize;
    /// State every decode starts in
    const START: Self;

    fn index(self) -> usize;

    /// Nesting depth of the TLV that leads into this state, if pinned
    ///
    /// A TLV found at another depth is rejected even when its tag matches,
    /// so a tag smuggled inside a constructed value cannot pass for one of
    /// its siblings.
    fn depth(self) -> Option<usize> {
        None
    }
}

/// Object built by grammar actions during one decode
pub trait Decodable: Sized {
    type State: GrammarState;
    type Output;

    /// Turn the populated object into the decoded message
    fn build(self) -> BerResult<Self::Output>;
}

/// Grammar action: stores the TLV that triggered the transition
pub type Action<T> = fn(&mut T, &TlvEvent<'_>) -> BerResult<()>;

/// What an action sees of the TLV that triggered it
pub struct TlvEvent<'a> {
    tlv: &'a Tlv,
    depth: usize,
    config: &'a DecoderConfig,
}

impl<'a> TlvEvent<'a> {
    pub(crate) fn new(tlv: &'a Tlv, depth: usize, config: &'a DecoderConfig) -> Self {
        Self { tlv, depth, config }
    }

    pub fn tag(&self) -> &Tag {
        self.tlv.tag()
    }

    /// Declared length of the content octets
    pub fn length(&self) -> usize {
        self.tlv.length().value()
    }

    /// Content octets; empty for a constructed TLV whose children are
    /// decoded by the grammar itself
    pub fn value(&self) -> &'a [u8] {
        self.tlv.value().as_bytes()
    }

    /// Nesting depth of the TLV, 0 for the outermost one
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &DecoderConfig {
        self.config
    }

    pub fn integer(&self) -> BerResult<i64> {
        Value::decode_integer(self.value())
    }

    pub fn int32(&self) -> BerResult<i32> {
        Value::decode_i32(self.value())
    }

    pub fn string(&self) -> BerResult<String> {
        Value::decode_utf8(self.value())
    }
}

/// One cell of a grammar table
pub struct Transition<T: Decodable> {
    pub from: T::State,
    pub to: T::State,
    pub tag: u8,
    pub action: Option<Action<T>>,
    /// Buffer the whole value, even of a constructed TLV, and run the action
    /// on the complete content octets
    pub gather: bool,
}

impl<T: Decodable> Clone for Transition<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Decodable> Copy for Transition<T> {}

impl<T: Decodable> fmt::Debug for Transition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("tag", &format_args!("0x{:02X}", self.tag))
            .field("action", &self.action.is_some())
            .field("gather", &self.gather)
            .finish()
    }
}

/// Immutable transition table for one message type
pub struct Grammar<T: Decodable> {
    name: &'static str,
    table: Vec<Vec<Option<Transition<T>>>>,
    accepting: Vec<bool>,
}

impl<T: Decodable> fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("transitions", &self.transition_count())
            .finish()
    }
}

impl<T: Decodable> Grammar<T> {
    pub fn builder(name: &'static str) -> GrammarBuilder<T> {
        GrammarBuilder {
            name,
            transitions: Vec::new(),
            accepting: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up the cell for `tag` in `state`
    pub fn transition(&self, state: T::State, tag: u8) -> Option<&Transition<T>> {
        self.table
            .get(state.index())
            .and_then(|row| row[tag as usize].as_ref())
    }

    /// Tag bytes with a transition out of `state`
    pub fn expected_tags(&self, state: T::State) -> ExpectedTags {
        let tags = match self.table.get(state.index()) {
            Some(row) => row
                .iter()
                .enumerate()
                .filter_map(|(tag, cell)| cell.as_ref().map(|_| tag as u8))
                .collect(),
            None => Vec::new(),
        };
        ExpectedTags(tags)
    }

    /// Whether a PDU may end in `state`
    pub fn is_accepting(&self, state: T::State) -> bool {
        self.accepting.get(state.index()).copied().unwrap_or(false)
    }

    pub fn transition_count(&self) -> usize {
        self.table
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_some()).count())
            .sum()
    }

    pub(crate) fn unexpected(&self, state: T::State, tag: u8) -> BerError {
        BerError::UnexpectedTag {
            grammar: self.name,
            state: format!("{:?}", state),
            tag,
            expected: self.expected_tags(state),
        }
    }
}

/// Collects transitions and checks them before freezing the table
pub struct GrammarBuilder<T: Decodable> {
    name: &'static str,
    transitions: Vec<Transition<T>>,
    accepting: Vec<T::State>,
}

impl<T: Decodable> GrammarBuilder<T> {
    /// Transition without action, e.g. into an EXPLICIT tag wrapper
    pub fn on(self, from: T::State, tag: u8, to: T::State) -> Self {
        self.push(from, tag, to, None, false)
    }

    /// Transition whose action stores the TLV
    pub fn on_action(self, from: T::State, tag: u8, to: T::State, action: Action<T>) -> Self {
        self.push(from, tag, to, Some(action), false)
    }

    /// Transition that buffers the whole TLV value before its action runs
    pub fn gather(self, from: T::State, tag: u8, to: T::State, action: Action<T>) -> Self {
        self.push(from, tag, to, Some(action), true)
    }

    /// Allow a PDU to end in `state`
    pub fn accept(mut self, state: T::State) -> Self {
        self.accepting.push(state);
        self
    }

    fn push(
        mut self,
        from: T::State,
        tag: u8,
        to: T::State,
        action: Option<Action<T>>,
        gather: bool,
    ) -> Self {
        self.transitions.push(Transition {
            from,
            to,
            tag,
            action,
            gather,
        });
        self
    }

    /// Freeze the table
    ///
    /// # Error Handling
    /// Returns `InvalidGrammar` if a state index is out of range or a
    /// `(state, tag)` pair is given two destinations.
    pub fn build(self) -> BerResult<Grammar<T>> {
        let count = <T::State as GrammarState>::COUNT;
        let mut table: Vec<Vec<Option<Transition<T>>>> =
            (0..count).map(|_| vec![None; 256]).collect();

        for transition in self.transitions {
            for state in [transition.from, transition.to] {
                if state.index() >= count {
                    return Err(BerError::InvalidGrammar(format!(
                        "{}: state {:?} has index {} beyond {}",
                        self.name,
                        state,
                        state.index(),
                        count
                    )));
                }
            }
            let cell = &mut table[transition.from.index()][transition.tag as usize];
            if let Some(existing) = cell {
                return Err(BerError::InvalidGrammar(format!(
                    "{}: tag 0x{:02X} in state {:?} leads to both {:?} and {:?}",
                    self.name, transition.tag, transition.from, existing.to, transition.to
                )));
            }
            *cell = Some(transition);
        }

        let mut accepting = vec![false; count];
        for state in self.accepting {
            match accepting.get_mut(state.index()) {
                Some(flag) => *flag = true,
                None => {
                    return Err(BerError::InvalidGrammar(format!(
                        "{}: accepting state {:?} out of range",
                        self.name, state
                    )));
                }
            }
        }

        log::debug!("grammar {} built", self.name);
        Ok(Grammar {
            name: self.name,
            table,
            accepting,
        })
    }
}
