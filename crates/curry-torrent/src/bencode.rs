//! Minimal bencode codec covering what `.torrent` files use.

use std::collections::BTreeMap;
use std::ops::Range;

use thiserror::Error;

const MAX_DEPTH: usize = 64;

/// A decoded bencode value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `i<n>e`
    Int(i64),
    /// `<len>:<bytes>`
    Bytes(Vec<u8>),
    /// `l...e`
    List(Vec<Value>),
    /// `d...e`, keys kept sorted.
    Dict(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    /// Build a byte-string value from text.
    #[must_use]
    pub fn text(value: &str) -> Self {
        Self::Bytes(value.as_bytes().to_vec())
    }

    /// Byte-string contents, if this is a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Byte-string contents as UTF-8, if valid.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// List elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary entries, if this is a dictionary.
    #[must_use]
    pub const fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, Self>> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Bencode parse failures with the byte offset they occurred at.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BencodeError {
    /// Input ended inside a value.
    #[error("unexpected end of input")]
    UnexpectedEof {
        /// Offset where more input was expected.
        offset: usize,
    },
    /// A byte that cannot start or continue a value.
    #[error("unexpected byte")]
    UnexpectedByte {
        /// Offending offset.
        offset: usize,
        /// Offending byte.
        byte: u8,
    },
    /// Malformed integer or length prefix.
    #[error("invalid integer")]
    InvalidInteger {
        /// Offset of the integer.
        offset: usize,
    },
    /// Dictionary key that is not a byte string.
    #[error("dictionary key is not a byte string")]
    NonStringKey {
        /// Offset of the key.
        offset: usize,
    },
    /// Bytes left over after the top-level value.
    #[error("trailing data after value")]
    TrailingData {
        /// Offset of the first extra byte.
        offset: usize,
    },
    /// Top-level value is not a dictionary where one is required.
    #[error("top-level value is not a dictionary")]
    NotADictionary,
    /// Lists or dictionaries nested beyond the supported depth.
    #[error("nesting too deep")]
    TooDeep {
        /// Offset where the limit was hit.
        offset: usize,
    },
}

/// One entry of a top-level dictionary, with the byte span its value occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    /// Raw key.
    pub key: Vec<u8>,
    /// Decoded value.
    pub value: Value,
    /// Span of the encoded value inside the input.
    pub span: Range<usize>,
}

/// Decode exactly one value from `input`.
///
/// # Errors
///
/// Returns a [`BencodeError`] for malformed input or trailing bytes.
pub fn decode(input: &[u8]) -> Result<Value, BencodeError> {
    let mut decoder = Decoder { input, pos: 0 };
    let value = decoder.value(0)?;
    decoder.finish()?;
    Ok(value)
}

/// Decode a top-level dictionary, keeping the encoded span of each value.
///
/// The spans let callers hash or re-emit a value byte-for-byte as it was
/// received, even when the producer did not encode canonically.
///
/// # Errors
///
/// Returns a [`BencodeError`] for malformed input, trailing bytes, or a
/// top-level value that is not a dictionary.
pub fn decode_dict_entries(input: &[u8]) -> Result<Vec<DictEntry>, BencodeError> {
    let mut decoder = Decoder { input, pos: 0 };
    if decoder.peek()? != b'd' {
        return Err(BencodeError::NotADictionary);
    }
    decoder.pos += 1;
    let mut entries = Vec::new();
    while decoder.peek()? != b'e' {
        let key = decoder.key()?;
        let start = decoder.pos;
        let value = decoder.value(1)?;
        entries.push(DictEntry {
            key,
            value,
            span: start..decoder.pos,
        });
    }
    decoder.pos += 1;
    decoder.finish()?;
    Ok(entries)
}

/// Encode `value` canonically (dictionary keys sorted).
#[must_use]
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

/// Append the canonical encoding of `value` to `out`.
pub fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(number) => {
            out.push(b'i');
            out.extend_from_slice(number.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(bytes) => encode_bytes(bytes, out),
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(entries) => {
            out.push(b'd');
            for (key, item) in entries {
                encode_bytes(key, out);
                encode_into(item, out);
            }
            out.push(b'e');
        }
    }
}

/// Append a length-prefixed byte string.
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Decoder<'_> {
    fn peek(&self) -> Result<u8, BencodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof { offset: self.pos })
    }

    fn finish(&self) -> Result<(), BencodeError> {
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(BencodeError::TrailingData { offset: self.pos })
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        if depth > MAX_DEPTH {
            return Err(BencodeError::TooDeep { offset: self.pos });
        }
        match self.peek()? {
            b'i' => {
                self.pos += 1;
                let number = self.integer(b'e')?;
                Ok(Value::Int(number))
            }
            b'0'..=b'9' => self.bytes().map(Value::Bytes),
            b'l' => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.peek()? != b'e' {
                    items.push(self.value(depth + 1)?);
                }
                self.pos += 1;
                Ok(Value::List(items))
            }
            b'd' => {
                self.pos += 1;
                let mut entries = BTreeMap::new();
                while self.peek()? != b'e' {
                    let key = self.key()?;
                    let item = self.value(depth + 1)?;
                    entries.insert(key, item);
                }
                self.pos += 1;
                Ok(Value::Dict(entries))
            }
            byte => Err(BencodeError::UnexpectedByte {
                offset: self.pos,
                byte,
            }),
        }
    }

    fn key(&mut self) -> Result<Vec<u8>, BencodeError> {
        match self.peek()? {
            b'0'..=b'9' => self.bytes(),
            _ => Err(BencodeError::NonStringKey { offset: self.pos }),
        }
    }

    fn bytes(&mut self) -> Result<Vec<u8>, BencodeError> {
        let offset = self.pos;
        let length = self.integer(b':')?;
        let length = usize::try_from(length).map_err(|_| BencodeError::InvalidInteger { offset })?;
        let end = self
            .pos
            .checked_add(length)
            .filter(|end| *end <= self.input.len())
            .ok_or(BencodeError::UnexpectedEof {
                offset: self.input.len(),
            })?;
        let bytes = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    /// Parse digits up to `terminator`, consuming the terminator.
    fn integer(&mut self, terminator: u8) -> Result<i64, BencodeError> {
        let offset = self.pos;
        let rest = &self.input[self.pos..];
        let len = rest
            .iter()
            .position(|byte| *byte == terminator)
            .ok_or(BencodeError::UnexpectedEof {
                offset: self.input.len(),
            })?;
        let digits = std::str::from_utf8(&rest[..len])
            .map_err(|_| BencodeError::InvalidInteger { offset })?;
        let canonical = !digits.is_empty()
            && digits != "-0"
            && !(digits.len() > 1 && digits.starts_with('0'))
            && !digits.starts_with("-0");
        if !canonical {
            return Err(BencodeError::InvalidInteger { offset });
        }
        let number = digits
            .parse::<i64>()
            .map_err(|_| BencodeError::InvalidInteger { offset })?;
        self.pos += len + 1;
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_structures() {
        let value = decode(b"d8:announce13:http://a/x/an4:infod4:name3:abc6:lengthi42eee")
            .expect("valid bencode");
        let root = value.as_dict().expect("dict");
        assert_eq!(
            root.get(b"announce".as_slice()).and_then(Value::as_str),
            Some("http://a/x/an")
        );
        let info = root
            .get(b"info".as_slice())
            .and_then(Value::as_dict)
            .expect("info dict");
        assert_eq!(info.get(b"length".as_slice()), Some(&Value::Int(42)));
    }

    #[test]
    fn encoding_sorts_dictionary_keys() {
        let mut entries = BTreeMap::new();
        entries.insert(b"zeta".to_vec(), Value::Int(-3));
        entries.insert(
            b"alpha".to_vec(),
            Value::List(vec![Value::text("x"), Value::Int(0)]),
        );
        assert_eq!(
            encode(&Value::Dict(entries)),
            b"d5:alphal1:xi0ee4:zetai-3ee".to_vec()
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            decode(b"i03e"),
            Err(BencodeError::InvalidInteger { offset: 1 })
        );
        assert_eq!(
            decode(b"5:abc"),
            Err(BencodeError::UnexpectedEof { offset: 5 })
        );
        assert_eq!(
            decode(b"i1ei2e"),
            Err(BencodeError::TrailingData { offset: 3 })
        );
        assert_eq!(
            decode(b"di1ei2ee"),
            Err(BencodeError::NonStringKey { offset: 1 })
        );
        assert!(matches!(
            decode(b"x"),
            Err(BencodeError::UnexpectedByte { byte: b'x', .. })
        ));
    }

    #[test]
    fn dict_entries_keep_original_spans() {
        let input = b"d4:infod4:name1:a6:lengthi1ee3:fooi7ee";
        let entries = decode_dict_entries(input).expect("dict");
        let info = entries
            .iter()
            .find(|entry| entry.key == b"info")
            .expect("info entry");
        assert_eq!(&input[info.span.clone()], b"d4:name1:a6:lengthi1ee");
        assert_eq!(
            decode_dict_entries(b"li1ee"),
            Err(BencodeError::NotADictionary)
        );
    }

    #[test]
    fn rejects_runaway_nesting() {
        let mut input = vec![b'l'; MAX_DEPTH + 2];
        input.extend(std::iter::repeat_n(b'e', MAX_DEPTH + 2));
        assert!(matches!(decode(&input), Err(BencodeError::TooDeep { .. })));
    }
}
