//! RunLengthDecode filter.

use super::StreamDecoder;
use crate::error::Result;

/// RunLengthDecode: a length byte `n` < 128 copies `n + 1` literal bytes,
/// `n` > 128 repeats the next byte `257 - n` times, 128 ends data.
pub struct RunLengthDecoder;

impl StreamDecoder for RunLengthDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 2);
        let mut i = 0;

        while i < input.len() {
            let length = input[i];
            i += 1;
            match length {
                128 => break,
                0..=127 => {
                    let end = (i + length as usize + 1).min(input.len());
                    output.extend_from_slice(&input[i..end]);
                    i = end;
                },
                _ => {
                    if let Some(&byte) = input.get(i) {
                        output.extend(std::iter::repeat(byte).take(257 - length as usize));
                    }
                    i += 1;
                },
            }
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "RunLengthDecode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_repeat_runs() {
        let input = [2, b'a', b'b', b'c', 254, b'x', 128, 9, 9];
        assert_eq!(RunLengthDecoder.decode(&input).unwrap(), b"abcxxx");
    }

    #[test]
    fn test_truncated_literal_run() {
        assert_eq!(RunLengthDecoder.decode(&[5, b'a']).unwrap(), b"a");
    }
}
