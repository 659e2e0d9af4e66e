use crate::error::{ConfigError, DecodeError};
use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;
use typed_builder::TypedBuilder;

/// Symbols used by default. Visually ambiguous characters (`0`, `1`, `I`, `O`, `l`)
/// are left out and folded back in through [`DEFAULT_CONFUSABLES`].
pub const DEFAULT_ALPHABET: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz$";

pub const DEFAULT_ALT_PREFIX: char = '_';

pub const DEFAULT_CONFUSABLES: [(char, char); 5] =
    [('0', 'o'), ('O', 'o'), ('1', 'i'), ('I', 'i'), ('l', 'i')];

/// Configures an [`IdCodec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct CodecSettings {
    /// Ordered symbol set; a symbol's position is its digit value.
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    pub alphabet: String,
    /// Marks the alternate encoding. Must not be an alphabet symbol.
    #[builder(default = DEFAULT_ALT_PREFIX)]
    pub alt_prefix: char,
    /// Decode-time substitutions, `source -> alphabet symbol`.
    #[builder(default = BTreeMap::from(DEFAULT_CONFUSABLES))]
    pub confusables: BTreeMap<char, char>,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Which of the two renderings of an id to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Primary,
    /// Digits mirrored (`N-1-d`) and prefixed with the alt prefix.
    Alternate,
}

/// Bijective base-N codec between row ids and short codes.
///
/// `0` encodes to the empty string, which never decodes. Row ids start at 1,
/// so every stored row has a non-empty code in both encodings.
#[derive(Debug)]
pub struct IdCodec {
    symbols: Vec<char>,
    alt_prefix: char,
    confusables: BTreeMap<char, char>,
    max_len: usize,
    decode_map: OnceLock<HashMap<char, u64>>,
}

impl IdCodec {
    pub fn new(settings: CodecSettings) -> Result<Self, ConfigError> {
        let symbols: Vec<char> = settings.alphabet.chars().collect();
        if symbols.len() < 2 {
            return Err(ConfigError::AlphabetTooShort(symbols.len()));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for &symbol in &symbols {
            if !seen.insert(symbol) {
                return Err(ConfigError::DuplicateSymbol(symbol));
            }
        }

        if seen.contains(&settings.alt_prefix) {
            return Err(ConfigError::AltPrefixInAlphabet(settings.alt_prefix));
        }
        if settings.confusables.contains_key(&settings.alt_prefix) {
            return Err(ConfigError::AltPrefixInMapping(settings.alt_prefix));
        }
        for (&from, &to) in &settings.confusables {
            if seen.contains(&from) {
                return Err(ConfigError::MappingShadowsSymbol(from));
            }
            if !seen.contains(&to) {
                return Err(ConfigError::UnknownMappingTarget { from, to });
            }
        }

        let base = symbols.len() as u64;
        let mut max_len = 0;
        let mut rest = u64::MAX;
        while rest > 0 {
            rest /= base;
            max_len += 1;
        }

        Ok(Self {
            symbols,
            alt_prefix: settings.alt_prefix,
            confusables: settings.confusables,
            max_len,
            decode_map: OnceLock::new(),
        })
    }

    /// Number of symbols in the alphabet.
    pub fn base(&self) -> usize {
        self.symbols.len()
    }

    pub fn alt_prefix(&self) -> char {
        self.alt_prefix
    }

    pub fn confusables(&self) -> &BTreeMap<char, char> {
        &self.confusables
    }

    /// Longest digit string (excluding the alt prefix) that [`decode`](Self::decode) accepts.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn encode(&self, id: u64) -> ShortCode {
        self.encode_with(id, Encoding::Primary)
    }

    pub fn encode_alt(&self, id: u64) -> ShortCode {
        self.encode_with(id, Encoding::Alternate)
    }

    pub fn encode_with(&self, id: u64, encoding: Encoding) -> ShortCode {
        let base = self.symbols.len() as u64;
        let mirrored = encoding == Encoding::Alternate;

        let mut digits = Vec::with_capacity(self.max_len);
        let mut rest = id;
        while rest > 0 {
            let digit = (rest % base) as usize;
            rest /= base;
            let index = if mirrored {
                self.symbols.len() - 1 - digit
            } else {
                digit
            };
            digits.push(self.symbols[index]);
        }

        let mut code = String::with_capacity(digits.len() + 1);
        if mirrored {
            code.push(self.alt_prefix);
        }
        code.extend(digits.iter().rev());
        ShortCode::new_unchecked(code)
    }

    /// Decodes either encoding back to its id, folding confusable characters.
    pub fn decode(&self, code: &str) -> Result<u64, DecodeError> {
        let (digits, mirrored) = match code.strip_prefix(self.alt_prefix) {
            Some(rest) => (rest, true),
            None => (code, false),
        };

        if digits.is_empty() {
            return Err(DecodeError::Empty);
        }

        let len = digits.chars().count();
        if len > self.max_len {
            return Err(DecodeError::TooLong {
                len,
                max: self.max_len,
            });
        }

        let map = self.decode_map();
        let base = self.symbols.len() as u64;
        let mut id: u64 = 0;
        for symbol in digits.chars() {
            let index = *map.get(&symbol).ok_or(DecodeError::UnknownSymbol(symbol))?;
            let digit = if mirrored { base - 1 - index } else { index };
            id = id
                .checked_mul(base)
                .and_then(|value| value.checked_add(digit))
                .ok_or(DecodeError::Overflow)?;
        }

        Ok(id)
    }

    /// Every spelling of `code` that decodes to the same id.
    pub fn confusable_variants(&self, code: &ShortCode) -> BTreeSet<String> {
        expand_confusable_variants(code.as_str(), &self.confusables)
    }

    fn decode_map(&self) -> &HashMap<char, u64> {
        self.decode_map.get_or_init(|| {
            let mut map: HashMap<char, u64> = self
                .symbols
                .iter()
                .enumerate()
                .map(|(index, &symbol)| (symbol, index as u64))
                .collect();
            for (&from, to) in &self.confusables {
                if let Some(&index) = map.get(to) {
                    map.insert(from, index);
                }
            }
            map
        })
    }
}

/// Cartesian product over positions of `{c} ∪ {s : mapping[s] == c}`.
///
/// The mapping is many-to-one, so one canonical character can fan out to
/// several sources.
pub fn expand_confusable_variants(code: &str, mapping: &BTreeMap<char, char>) -> BTreeSet<String> {
    let mut variants = vec![String::with_capacity(code.len())];

    for symbol in code.chars() {
        let options: Vec<char> = std::iter::once(symbol)
            .chain(
                mapping
                    .iter()
                    .filter(|(_, &to)| to == symbol)
                    .map(|(&from, _)| from),
            )
            .collect();

        variants = variants
            .iter()
            .flat_map(|prefix| {
                options.iter().map(move |&option| {
                    let mut variant = prefix.clone();
                    variant.push(option);
                    variant
                })
            })
            .collect();
    }

    variants.into_iter().collect()
}
