//! Native decoder for P.A.C.K.E.R. packed scripts

use crate::core::unpacker::{detect, Evaluator};
use crate::error::DecodeError;
use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

const ALPHABET_62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHABET_95: &str = r##" !"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\]^_`abcdefghijklmnopqrstuvwxyz{|}~"##;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

// Full argument list first, then the form without the trailing `e, d` arguments.
static ARGS_RE: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        RegexBuilder::new(
            r"\}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\), *(\d+), *(.*)\)\)",
        )
        .dot_matches_new_line(true)
        .build()
        .unwrap(),
        RegexBuilder::new(r"\}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\)")
            .dot_matches_new_line(true)
            .build()
            .unwrap(),
    ]
});

static DICT_62: LazyLock<HashMap<char, u64>> = LazyLock::new(|| alphabet_dict(ALPHABET_62));
static DICT_95: LazyLock<HashMap<char, u64>> = LazyLock::new(|| alphabet_dict(ALPHABET_95));

/// Evaluator that decodes the packer's argument list without running any script.
///
/// Text that does not carry the packer marker is reported as "eval never
/// called", so it passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackerEvaluator;

impl PackerEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for PackerEvaluator {
    fn evaluate(&self, packed: &str) -> Result<Option<String>, DecodeError> {
        if !detect(packed) {
            debug!("No packer marker, nothing to decode");
            return Ok(None);
        }
        decode(packed).map(Some)
    }
}

/// Arguments handed to the packer's bootstrap function
#[derive(Debug, Clone, PartialEq)]
pub struct PackerArgs<'a> {
    /// Encoded payload with escapes still in place
    pub payload: &'a str,
    /// Radix of the word tokens
    pub radix: u32,
    /// Declared symbol count
    pub count: usize,
    /// Symbol table, indexed by decoded token
    pub symtab: Vec<&'a str>,
}

impl<'a> PackerArgs<'a> {
    /// Pull the bootstrap arguments out of packed source
    pub fn parse(source: &'a str) -> Result<Self, DecodeError> {
        ARGS_RE
            .iter()
            .find_map(|re| re.captures(source).and_then(|caps| Self::from_captures(&caps)))
            .ok_or(DecodeError::Malformed("unexpected bootstrap argument structure"))
    }

    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let payload = caps.get(1)?.as_str();
        let radix = match caps.get(2)?.as_str() {
            "[]" => 62,
            radix => radix.parse::<u32>().ok()?,
        };
        let count = caps.get(3)?.as_str().parse::<usize>().ok()?;
        let symtab = caps.get(4)?.as_str().split('|').collect();

        Some(Self {
            payload,
            radix,
            count,
            symtab,
        })
    }
}

/// Decode packed source into the payload string it would hand to `eval`
pub fn decode(source: &str) -> Result<String, DecodeError> {
    let args = PackerArgs::parse(source)?;

    if args.count != args.symtab.len() {
        return Err(DecodeError::SymbolTable {
            expected: args.count,
            found: args.symtab.len(),
        });
    }
    if !(2..=95).contains(&args.radix) {
        return Err(DecodeError::Malformed("unsupported radix"));
    }

    debug!(
        "Decoding packer payload: radix {}, {} symbols",
        args.radix, args.count
    );

    let payload = args.payload.replace("\\\\", "\\").replace("\\'", "'");
    let decoded = WORD_RE.replace_all(&payload, |caps: &Captures| {
        let word = &caps[0];
        unbase(args.radix, word)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| args.symtab.get(idx).copied())
            .filter(|sym| !sym.is_empty())
            .unwrap_or(word)
            .to_string()
    });

    Ok(decoded.into_owned())
}

/// Convert a token back to its symbol table index
fn unbase(radix: u32, token: &str) -> Option<u64> {
    match radix {
        2..=36 => u64::from_str_radix(token, radix).ok(),
        37..=62 => dict_convert(radix, token, &DICT_62),
        _ => dict_convert(radix, token, &DICT_95),
    }
}

fn dict_convert(radix: u32, token: &str, dict: &HashMap<char, u64>) -> Option<u64> {
    token
        .chars()
        .rev()
        .enumerate()
        .try_fold(0u64, |acc, (i, ch)| {
            let digit = *dict.get(&ch)?;
            if digit >= u64::from(radix) {
                return None;
            }
            let place = u64::from(radix).checked_pow(u32::try_from(i).ok()?)?;
            acc.checked_add(place.checked_mul(digit)?)
        })
}

fn alphabet_dict(alphabet: &str) -> HashMap<char, u64> {
    alphabet
        .chars()
        .enumerate()
        .map(|(idx, ch)| (ch, idx as u64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unpacker::unpack_with;

    static SIMPLE: &str = "eval(function(p,a,c,k,e,r){e=String;if(!''\
    .replace(/^/,String)){while(c--)r[c]=k[c]||c;k=[function(e){return r[e]}];e=\
    function(){return'\\w+'};c=1};while(c--)if(k[c])p=p.replace(new RegExp('\\b'+\
    e(c)+'\\b','g'),k[c]);return p}('1 0=2;3(0)',4,4,'x|var|5|alert'.split('|'),0,{}))";

    #[test]
    fn test_parse_args() {
        let args = PackerArgs::parse(SIMPLE).unwrap();
        assert_eq!(args.payload, "1 0=2;3(0)");
        assert_eq!(args.symtab, ["x", "var", "5", "alert"]);
        assert_eq!(args.radix, 4);
        assert_eq!(args.count, 4);
    }

    #[test]
    fn test_decode_simple() {
        assert_eq!(decode(SIMPLE).unwrap(), "var x=5;alert(x)");
    }

    #[test]
    fn test_decode_base62() {
        let packed = "eval(function(p,a,c,k,e,d){return p}('0 2=1;A(2)',62,37,\
            'var|7|||||||||||||||||||||||||||||||||||log'.split('|'),0,{}))";
        assert_eq!(decode(packed).unwrap(), "var 2=7;log(2)");
    }

    #[test]
    fn test_unescapes_payload_quotes() {
        let packed = r"eval(function(p,a,c,k,e,d){return p}('0(\'1\')',36,2,'alert|hi'.split('|'),0,{}))";
        assert_eq!(decode(packed).unwrap(), "alert('hi')");
    }

    #[test]
    fn test_symbol_table_mismatch() {
        let packed = "eval(function(p,a,c,k,e,d){return p}('0 1',36,5,'a|b'.split('|'),0,{}))";
        assert_eq!(
            decode(packed).unwrap_err(),
            DecodeError::SymbolTable {
                expected: 5,
                found: 2
            }
        );
    }

    #[test]
    fn test_malformed_arguments() {
        let err = decode("eval(function(p,a,c,k,e,d){return p}(oops))").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_passthrough_for_plain_script() {
        let evaluator = PackerEvaluator::new();
        assert_eq!(evaluator.evaluate("var a = 1;").unwrap(), None);
    }

    #[test]
    fn test_unbase() {
        assert_eq!(unbase(36, "1l"), Some(57));
        assert_eq!(unbase(36, "x_y"), None);
        assert_eq!(unbase(62, "Z"), Some(61));
        assert_eq!(unbase(62, "10"), Some(62));
        assert_eq!(unbase(40, "Z"), None);
    }

    #[test]
    fn test_fixture_matches_reference_layout() {
        let packed = include_str!("../../tests/fixtures/packed_player.js");
        let expected = include_str!("../../tests/fixtures/packed_player.unpacked.js");

        let source = unpack_with(&PackerEvaluator::new(), packed).unwrap();
        assert_eq!(source.as_str(), expected);
    }

    #[test]
    fn test_embed_fixture_matches_reference_layout() {
        let packed = include_str!("../../tests/fixtures/packed_embed.js");
        let expected = include_str!("../../tests/fixtures/packed_embed.unpacked.js");

        let source = unpack_with(&PackerEvaluator::new(), packed).unwrap();
        assert_eq!(source.as_str(), expected);
    }
}
