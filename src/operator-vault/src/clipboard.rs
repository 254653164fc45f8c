//! Clipboards: paste words from earlier results into the next payload before it is dispatched.

use alloy_primitives::Bytes;
use operator_vault_types::{
    wire::{SELECTOR_WIDTH, WORD_WIDTH},
    Clipboard,
};

use crate::errors::ClipboardError;

/// Results of the operations completed so far in one batch, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    results: Vec<Bytes>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: Bytes) {
        self.results.push(result);
    }

    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.results.get(index)
    }

    pub fn last(&self) -> Option<&Bytes> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.results.iter()
    }

    pub fn into_vec(self) -> Vec<Bytes> {
        self.results
    }
}

/// Apply `clipboards` in order to a copy of `payload`.
///
/// Later clipboards overwrite earlier ones where destinations overlap. On error the copy is
/// dropped, so the caller never observes a partially rewritten payload.
pub fn apply_clipboards(
    payload: &[u8],
    clipboards: &[Clipboard],
    results: &ResultSet,
) -> Result<Vec<u8>, ClipboardError> {
    let mut out = payload.to_vec();
    let args_len = payload.len().saturating_sub(SELECTOR_WIDTH);

    for (i, clipboard) in clipboards.iter().enumerate() {
        let source = results.get(clipboard.result_index as usize).ok_or(
            ClipboardError::MissingResult {
                clipboard: i,
                result_index: clipboard.result_index,
                available: results.len(),
            },
        )?;

        let copy_start = clipboard.word_index as usize * WORD_WIDTH;
        if copy_start + WORD_WIDTH > source.len() {
            return Err(ClipboardError::CopyOutOfBounds {
                clipboard: i,
                word_index: clipboard.word_index,
                result_len: source.len(),
            });
        }

        let paste_offset = clipboard.paste_offset as usize;
        if payload.len() < SELECTOR_WIDTH || paste_offset + WORD_WIDTH > args_len {
            return Err(ClipboardError::PasteOutOfBounds {
                clipboard: i,
                paste_offset: clipboard.paste_offset,
                payload_len: payload.len(),
            });
        }

        let paste_start = SELECTOR_WIDTH + paste_offset;
        out[paste_start..paste_start + WORD_WIDTH]
            .copy_from_slice(&source[copy_start..copy_start + WORD_WIDTH]);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn results_of(words: &[&[u8]]) -> ResultSet {
        let mut results = ResultSet::new();
        for w in words {
            results.push(Bytes::copy_from_slice(w));
        }
        results
    }

    fn payload(args_len: usize) -> Vec<u8> {
        let mut p = vec![0xde, 0xad, 0xbe, 0xef];
        p.resize(4 + args_len, 0);
        p
    }

    #[test]
    fn pastes_source_word_after_selector() {
        let mut result = vec![0u8; 32];
        result.extend_from_slice(&[9u8; 32]);
        let results = results_of(&[&result]);

        let out = apply_clipboards(&payload(96), &[Clipboard::new(0, 1, 32)], &results).unwrap();
        assert_eq!(&out[0..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&out[4..36], &[0u8; 32]);
        assert_eq!(&out[36..68], &[9u8; 32]);
        assert_eq!(&out[68..100], &[0u8; 32]);
    }

    #[test]
    fn overlapping_destinations_are_last_write_wins() {
        let results = results_of(&[&[1u8; 32], &[2u8; 32]]);
        let clipboards = [Clipboard::new(0, 0, 0), Clipboard::new(1, 0, 16)];
        let out = apply_clipboards(&payload(64), &clipboards, &results).unwrap();
        assert_eq!(&out[4..20], &[1u8; 16]);
        assert_eq!(&out[20..52], &[2u8; 32]);
        assert_eq!(&out[52..68], &[0u8; 16]);

        // Same pair in the opposite order: the first word wins the overlap instead.
        let reversed = [Clipboard::new(1, 0, 16), Clipboard::new(0, 0, 0)];
        let out = apply_clipboards(&payload(64), &reversed, &results).unwrap();
        assert_eq!(&out[4..36], &[1u8; 32]);
        assert_eq!(&out[36..52], &[2u8; 16]);
    }

    #[test]
    fn copy_beyond_result_is_rejected() {
        let results = results_of(&[&[1u8; 63]]);
        assert_eq!(
            apply_clipboards(&payload(64), &[Clipboard::new(0, 1, 0)], &results),
            Err(ClipboardError::CopyOutOfBounds { clipboard: 0, word_index: 1, result_len: 63 })
        );
    }

    #[test]
    fn paste_beyond_payload_is_rejected_without_touching_input() {
        let results = results_of(&[&[1u8; 32]]);
        let original = payload(64);
        // First clipboard is valid, second is not: nothing is returned.
        let clipboards = [Clipboard::new(0, 0, 0), Clipboard::new(0, 0, 33)];
        assert_eq!(
            apply_clipboards(&original, &clipboards, &results),
            Err(ClipboardError::PasteOutOfBounds {
                clipboard: 1,
                paste_offset: 33,
                payload_len: 68,
            })
        );
        assert_eq!(original, payload(64));
        assert!(apply_clipboards(&original, &[Clipboard::new(0, 0, 32)], &results).is_ok());
    }

    #[test]
    fn missing_result_and_short_payload() {
        let results = results_of(&[&[1u8; 32]]);
        assert_eq!(
            apply_clipboards(&payload(64), &[Clipboard::new(1, 0, 0)], &results),
            Err(ClipboardError::MissingResult { clipboard: 0, result_index: 1, available: 1 })
        );
        assert!(matches!(
            apply_clipboards(&[0xde, 0xad], &[Clipboard::new(0, 0, 0)], &results),
            Err(ClipboardError::PasteOutOfBounds { .. })
        ));
    }

    fn clipboards_over(args_len: usize) -> impl Strategy<Value = Vec<Clipboard>> {
        let last = (args_len - 32) as u16;
        proptest::collection::vec(
            (0u8..3, 0u8..4, 0..=last).prop_map(|(r, w, p)| Clipboard::new(r, w, p)),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn each_byte_holds_the_last_word_pasted_over_it(
            (args_len, clipboards) in
                (32usize..160).prop_flat_map(|len| (Just(len), clipboards_over(len))),
            sources in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 128), 3),
        ) {
            let mut results = ResultSet::new();
            for source in &sources {
                results.push(Bytes::copy_from_slice(source));
            }
            let original = payload(args_len);
            let out = apply_clipboards(&original, &clipboards, &results).unwrap();

            prop_assert_eq!(&out[..4], &original[..4]);
            for arg in 0..args_len {
                let writer = clipboards.iter().rev().find(|c| {
                    let start = c.paste_offset as usize;
                    (start..start + 32).contains(&arg)
                });
                let expected = match writer {
                    Some(c) => {
                        let at = c.word_index as usize * 32 + (arg - c.paste_offset as usize);
                        sources[c.result_index as usize][at]
                    }
                    None => original[4 + arg],
                };
                prop_assert_eq!(out[4 + arg], expected, "argument byte {}", arg);
            }
        }
    }
}
