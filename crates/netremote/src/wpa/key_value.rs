//! `key=value` extraction from control-socket replies.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Whether a property must be present for a reply to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Where an extracted value ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractMode {
    /// The value ends at the next newline or at the end of the input.
    #[default]
    Line,
    /// The value extends to the end of the input.
    Remainder,
}

/// One property to extract from a reply.
///
/// The key includes the trailing `=` (`"ssid="`). Values borrow from the
/// reply text and are resolved at most once: after a successful
/// [`try_parse`](Self::try_parse) further calls return the cached slice.
///
/// An indexed pair with key `bss=` collects every `bss[N]=value` line,
/// ordered by `N`.
///
/// Keys match exactly unless the pair is built with
/// [`ignore_case`](Self::ignore_case).
#[derive(Debug, Clone)]
pub struct KeyValuePair<'a> {
    key: Cow<'static, str>,
    presence: Presence,
    mode: ExtractMode,
    indexed: bool,
    ignore_case: bool,
    values: Option<Vec<&'a str>>,
}

impl<'a> KeyValuePair<'a> {
    /// Create a pair for `key`, which must be non-empty and end with `=`.
    pub fn new(key: impl Into<Cow<'static, str>>, presence: Presence) -> Result<Self> {
        let key = key.into();
        if !key.ends_with('=') {
            return Err(Error::MalformedKeySpec {
                key: key.into_owned(),
            });
        }

        Ok(Self {
            key,
            presence,
            mode: ExtractMode::Line,
            indexed: false,
            ignore_case: false,
            values: None,
        })
    }

    /// Shorthand for a required pair.
    pub fn required(key: impl Into<Cow<'static, str>>) -> Result<Self> {
        Self::new(key, Presence::Required)
    }

    /// Shorthand for an optional pair.
    pub fn optional(key: impl Into<Cow<'static, str>>) -> Result<Self> {
        Self::new(key, Presence::Optional)
    }

    /// Set the extraction mode.
    pub fn mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }

    /// Match `key[N]=` lines instead of `key=`.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Match the key regardless of ASCII case.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// The key including the trailing `=`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The key without the trailing `=`.
    pub fn name(&self) -> &str {
        &self.key[..self.key.len() - 1]
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn extract_mode(&self) -> ExtractMode {
        self.mode
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.ignore_case
    }

    /// Whether a value has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.values.is_some()
    }

    /// The resolved value. For indexed pairs, the lowest-index value.
    pub fn value(&self) -> Option<&'a str> {
        self.values.as_ref().and_then(|v| v.first().copied())
    }

    /// Every resolved value, in index order for indexed pairs.
    pub fn values(&self) -> &[&'a str] {
        self.values.as_deref().unwrap_or(&[])
    }

    /// Look up the key in `input` and resolve the value.
    ///
    /// Returns `None` if the key is absent. Whether that is an error is up to
    /// the caller.
    pub fn try_parse(&mut self, input: &'a str) -> Option<&'a str> {
        if self.values.is_none() {
            let values = if self.indexed {
                self.find_indexed(input)
            } else {
                self.find(input).map(|v| vec![v])
            };
            self.values = values.filter(|v| !v.is_empty());
        }
        self.value()
    }

    fn find(&self, input: &'a str) -> Option<&'a str> {
        // ASCII lowercasing keeps byte offsets, so a position found in the
        // lowered text indexes the original.
        let pos = if self.ignore_case {
            locate(&input.to_ascii_lowercase(), &self.key.to_ascii_lowercase())?
        } else {
            locate(input, &self.key)?
        };
        let start = pos + self.key.len();
        let rest = &input[start..];
        let value = match self.mode {
            ExtractMode::Line => rest.split('\n').next().unwrap_or(rest),
            ExtractMode::Remainder => rest,
        };
        Some(value.strip_suffix('\r').unwrap_or(value))
    }

    fn find_indexed(&self, input: &'a str) -> Option<Vec<&'a str>> {
        let name = self.name();
        let mut found: Vec<(u32, &'a str)> = input
            .lines()
            .filter_map(|line| {
                let prefix = line.get(..name.len())?;
                let matches = if self.ignore_case {
                    prefix.eq_ignore_ascii_case(name)
                } else {
                    prefix == name
                };
                if !matches {
                    return None;
                }
                let rest = line[name.len()..].strip_prefix('[')?;
                let (index, value) = rest.split_once("]=")?;
                Some((index.parse().ok()?, value))
            })
            .collect();
        found.sort_by_key(|(index, _)| *index);
        Some(found.into_iter().map(|(_, value)| value).collect())
    }
}

/// Byte offset of `key` in `input`, preferring an occurrence at the start of
/// a line so that `ssid=` does not match inside `bssid=`.
fn locate(input: &str, key: &str) -> Option<usize> {
    let mut first = None;
    for (pos, _) in input.match_indices(key) {
        if pos == 0 || input.as_bytes()[pos - 1] == b'\n' {
            return Some(pos);
        }
        first.get_or_insert(pos);
    }
    first
}
