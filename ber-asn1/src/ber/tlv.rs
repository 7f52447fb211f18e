//! TLV triplets and the stack of open constructed TLVs

use crate::ber::length::Length;
use crate::ber::tag::Tag;
use crate::ber::value::Value;

/// One Tag-Length-Value triplet being decoded
///
/// When the TLV is constructed and its children are decoded one by one,
/// `remaining` counts the content octets not yet claimed by a child.
#[derive(Debug, Clone, Default)]
pub struct Tlv {
    tag: Tag,
    length: Length,
    value: Value,
    remaining: usize,
}

impl Tlv {
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn tag_mut(&mut self) -> &mut Tag {
        &mut self.tag
    }

    pub fn length(&self) -> &Length {
        &self.length
    }

    pub fn length_mut(&mut self) -> &mut Length {
        &mut self.length
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// Octets taken by the tag and length fields
    pub fn header_len(&self) -> usize {
        self.tag.encoded_len() + self.length.encoded_len()
    }

    /// Total encoded size: tag octets + length octets + content octets
    pub fn size(&self) -> usize {
        self.header_len() + self.length.value()
    }

    /// Content octets of an open constructed TLV not yet claimed by children
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Start counting children against the declared length
    pub(crate) fn open(&mut self) {
        self.remaining = self.length.value();
    }

    /// Charge a child of `size` octets to this TLV
    ///
    /// Returns `false` if the child does not fit in what is left.
    pub(crate) fn claim(&mut self, size: usize) -> bool {
        match self.remaining.checked_sub(size) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => false,
        }
    }

    /// Zero every field, keeping the value buffer's capacity
    pub fn reset(&mut self) {
        self.tag.reset();
        self.length.reset();
        self.value.reset();
        self.remaining = 0;
    }
}

/// Arena of TLV slots indexed by nesting depth
///
/// Slots `0..depth` are the open constructed ancestors, slot `depth` is the
/// TLV currently being decoded. The parent of a slot is the slot just below
/// it. Slots are reset and reused rather than freed, so after the first PDU
/// a decode of the same shape allocates nothing.
#[derive(Debug, Clone)]
pub struct TlvStack {
    slots: Vec<Tlv>,
    depth: usize,
}

impl Default for TlvStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TlvStack {
    pub fn new() -> Self {
        Self {
            slots: vec![Tlv::default()],
            depth: 0,
        }
    }

    /// Number of open constructed ancestors of the current TLV
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Slots allocated so far, reused across decodes
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn current(&self) -> &Tlv {
        &self.slots[self.depth]
    }

    pub fn current_mut(&mut self) -> &mut Tlv {
        &mut self.slots[self.depth]
    }

    pub fn parent(&self) -> Option<&Tlv> {
        self.depth.checked_sub(1).map(|i| &self.slots[i])
    }

    pub fn parent_mut(&mut self) -> Option<&mut Tlv> {
        match self.depth.checked_sub(1) {
            Some(i) => Some(&mut self.slots[i]),
            None => None,
        }
    }

    /// Open the current TLV as a parent and start a fresh child slot
    pub fn push(&mut self) {
        self.slots[self.depth].open();
        self.depth += 1;
        if self.slots.len() == self.depth {
            self.slots.push(Tlv::default());
        } else {
            self.slots[self.depth].reset();
        }
    }

    /// Close the innermost parent; it becomes the current TLV again
    pub fn pop(&mut self) {
        debug_assert!(self.depth > 0, "pop on an empty TLV stack");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Back to a single empty root slot
    pub fn reset(&mut self) {
        self.depth = 0;
        self.slots[0].reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ber_core::DecoderConfig;

    fn tlv_with_header(tag: u8, length: &[u8]) -> Tlv {
        let config = DecoderConfig::default();
        let mut tlv = Tlv::default();
        tlv.tag_mut().accumulate(tag, 5).unwrap();
        for &b in length {
            tlv.length_mut().accumulate(b, &config).unwrap();
        }
        tlv
    }

    #[test]
    fn test_tlv_size() {
        let tlv = tlv_with_header(0x04, &[0x82, 0x01, 0x00]);
        assert_eq!(tlv.header_len(), 4);
        assert_eq!(tlv.size(), 260);
    }

    #[test]
    fn test_claim_quota() {
        let mut tlv = tlv_with_header(0x30, &[0x05]);
        tlv.open();
        assert!(tlv.claim(3));
        assert_eq!(tlv.remaining(), 2);
        assert!(!tlv.claim(3));
        assert!(tlv.claim(2));
        assert_eq!(tlv.remaining(), 0);
    }

    #[test]
    fn test_stack_push_pop_reuses_slots() {
        let mut stack = TlvStack::new();
        *stack.current_mut() = tlv_with_header(0x30, &[0x06]);
        stack.push();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.parent().unwrap().remaining(), 6);
        assert!(!stack.current().tag().is_complete());

        *stack.current_mut() = tlv_with_header(0x30, &[0x00]);
        stack.push();
        assert_eq!(stack.capacity(), 3);
        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 0);
        assert!(stack.parent().is_none());

        stack.reset();
        stack.push();
        assert_eq!(stack.capacity(), 3);
        assert!(!stack.current().tag().is_complete());
    }
}
