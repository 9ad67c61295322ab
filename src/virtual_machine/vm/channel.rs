use std::collections::VecDeque;

/// Newline code terminating ASCII command lines.
pub const NEWLINE: i64 = 10;

/// Paired FIFO queues backing a machine's Input and Output instructions.
///
/// Every machine owns a freshly allocated channel; orchestrators move values
/// between channels explicitly instead of sharing queues.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Channel {
    inbound: VecDeque<i64>,
    outbound: VecDeque<i64>,
}

/// Output drained from a channel and split into text and non-ASCII values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsciiOutput {
    /// Every value in `0..=127`, in order, as characters.
    pub text: String,
    /// Every other value, in order.
    pub values: Vec<i64>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel whose inbound queue is pre-seeded.
    pub fn with_input<I: IntoIterator<Item = i64>>(input: I) -> Self {
        Self {
            inbound: input.into_iter().collect(),
            outbound: VecDeque::new(),
        }
    }

    pub fn push_input(&mut self, value: i64) {
        self.inbound.push_back(value);
    }

    pub fn extend_input<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.inbound.extend(values);
    }

    /// Enqueues the character codes of `line` followed by a newline.
    pub fn push_line(&mut self, line: &str) {
        self.inbound.extend(line.chars().map(|c| c as i64));
        self.inbound.push_back(NEWLINE);
    }

    pub fn pop_input(&mut self) -> Option<i64> {
        self.inbound.pop_front()
    }

    pub fn has_input(&self) -> bool {
        !self.inbound.is_empty()
    }

    pub fn pending_input(&self) -> usize {
        self.inbound.len()
    }

    pub fn push_output(&mut self, value: i64) {
        self.outbound.push_back(value);
    }

    pub fn pop_output(&mut self) -> Option<i64> {
        self.outbound.pop_front()
    }

    pub fn has_output(&self) -> bool {
        !self.outbound.is_empty()
    }

    pub fn pending_output(&self) -> usize {
        self.outbound.len()
    }

    /// Outbound values not yet consumed, oldest first.
    pub fn outputs(&self) -> impl Iterator<Item = &i64> {
        self.outbound.iter()
    }

    /// Removes and returns every outbound value.
    pub fn take_output(&mut self) -> Vec<i64> {
        self.outbound.drain(..).collect()
    }

    /// Drains outbound, decoding ASCII values into text.
    pub fn take_ascii(&mut self) -> AsciiOutput {
        let mut out = AsciiOutput::default();
        for value in self.outbound.drain(..) {
            match u8::try_from(value) {
                Ok(byte) if byte.is_ascii() => out.text.push(byte as char),
                _ => out.values.push(value),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_is_fifo() {
        let mut ch = Channel::with_input([1, 2]);
        ch.push_input(3);
        assert_eq!(ch.pending_input(), 3);
        assert_eq!(ch.pop_input(), Some(1));
        assert_eq!(ch.pop_input(), Some(2));
        assert_eq!(ch.pop_input(), Some(3));
        assert_eq!(ch.pop_input(), None);
        assert!(!ch.has_input());
    }

    #[test]
    fn outbound_is_fifo() {
        let mut ch = Channel::new();
        ch.push_output(5);
        ch.push_output(6);
        assert_eq!(ch.outputs().copied().collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(ch.pop_output(), Some(5));
        assert_eq!(ch.take_output(), vec![6]);
        assert!(!ch.has_output());
    }

    #[test]
    fn channels_do_not_share_queues() {
        let mut a = Channel::new();
        let b = Channel::new();
        a.push_output(1);
        assert_eq!(b.pending_output(), 0);
    }

    #[test]
    fn push_line_appends_newline() {
        let mut ch = Channel::new();
        ch.push_line("WALK");
        let codes: Vec<i64> = std::iter::from_fn(|| ch.pop_input()).collect();
        assert_eq!(codes, vec![87, 65, 76, 75, 10]);
    }

    #[test]
    fn take_ascii_splits_large_values() {
        let mut ch = Channel::new();
        for v in [72, 105, 10, 19352638, -1] {
            ch.push_output(v);
        }
        let out = ch.take_ascii();
        assert_eq!(out.text, "Hi\n");
        assert_eq!(out.values, vec![19352638, -1]);
        assert!(!ch.has_output());
    }
}
