//! Line-oriented parser for procfs `Key: value [unit]` files.
//!
//! `/proc/<pid>/smaps_rollup` and `/proc/<pid>/status` print one counter per
//! line. An implementor of [`KeyValueStat`] registers a setter per key it
//! cares about; everything else on the line (the unit, trailing columns) is
//! ignored.
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use memrollup_stats::rollup::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Swap {
//!     swap: u64,
//!     swap_pss: u64,
//! }
//!
//! static SETTERS: LazyLock<HashMap<&'static str, fn(&mut Swap, u64)>> = LazyLock::new(|| {
//!     let mut m: HashMap<&'static str, fn(&mut Swap, u64)> = HashMap::new();
//!     m.insert("Swap", |s, v| s.swap = v);
//!     m.insert("SwapPss", |s, v| s.swap_pss = v);
//!     m
//! });
//!
//! impl KeyValueStat for Swap {
//!     const KEY_TERMINATOR: Option<char> = Some(':');
//!     const SKIP_LINES: usize = 0;
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &SETTERS
//!     }
//! }
//!
//! let stat = Swap::from_reader(&mut "Swap: 12 kB\nSwapPss: 3 kB\n".as_bytes()).unwrap();
//! assert_eq!((stat.swap, stat.swap_pss), (12, 3));
//! ```

use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead};
use std::num::ParseIntError;

use super::StatParseError;

type Handlers<S> = HashMap<&'static str, fn(&mut S, u64)>;

/// A stat that is filled from a `Key: value [unit]` file.
pub trait KeyValueStat: Default + 'static {
    /// Suffix every key carries, stripped before lookup (`Rss:` is looked up
    /// as `Rss`). A token without it is handed to [`Self::on_unknown_key`].
    const KEY_TERMINATOR: Option<char>;

    /// Header lines to discard before parsing.
    const SKIP_LINES: usize;

    /// Whether a key may repeat, the last value winning. Otherwise a repeated
    /// key fails with [`StatParseError::DuplicateField`] and parsing stops as
    /// soon as every known key has been seen.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Setters of the known keys.
    fn field_handlers() -> &'static Handlers<Self>;

    /// Reads `buf` to the end (or until every key was seen) and builds the stat.
    ///
    /// Line numbers in errors count from the first line after the skipped header.
    ///
    /// # Errors
    ///
    /// Returns the read error, or a [`StatParseError`] wrapped as
    /// [`io::ErrorKind::InvalidData`].
    fn from_reader<R: BufRead>(buf: &mut R) -> io::Result<Self> {
        let handlers = Self::field_handlers();
        let mut stat = Self::default();
        let mut seen = HashSet::with_capacity(handlers.len());
        let mut line = String::new();

        for _ in 0..Self::SKIP_LINES {
            if buf.read_line(&mut line)? == 0 {
                return Ok(stat);
            }
            line.clear();
        }

        let mut lineno = 0;
        loop {
            line.clear();
            if buf.read_line(&mut line)? == 0 {
                break;
            }
            lineno += 1;
            Self::parse_line(&mut stat, &line, lineno, handlers, &mut seen)?;
            if !Self::ALLOW_DUPLICATE_KEYS && seen.len() == handlers.len() {
                break;
            }
        }

        Ok(stat)
    }

    /// Applies one line. Lines with fewer than two tokens are skipped.
    ///
    /// # Errors
    ///
    /// See [`Self::parse_and_set`].
    fn parse_line(
        stat: &mut Self,
        line: &str,
        lineno: usize,
        handlers: &Handlers<Self>,
        seen: &mut HashSet<&'static str>,
    ) -> io::Result<()> {
        let mut tokens = line.split_whitespace();
        let (Some(raw_key), Some(val)) = (tokens.next(), tokens.next()) else {
            return Ok(());
        };

        match Self::KEY_TERMINATOR.map(|t| raw_key.strip_suffix(t)) {
            None => Self::parse_and_set(raw_key, val, stat, lineno, handlers, seen),
            Some(Some(key)) => Self::parse_and_set(key, val, stat, lineno, handlers, seen),
            Some(None) => Self::on_unknown_key(raw_key, val, lineno),
        }
    }

    /// Parses `val` and hands it to the setter registered for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::DuplicateField`] for a repeated key when
    /// duplicates are not allowed, or whatever the hooks return.
    fn parse_and_set(
        key: &str,
        val: &str,
        stat: &mut Self,
        lineno: usize,
        handlers: &Handlers<Self>,
        seen: &mut HashSet<&'static str>,
    ) -> io::Result<()> {
        let Some((&known, setter)) = handlers.get_key_value(key) else {
            return Self::on_unknown_key(key, val, lineno);
        };
        let value = match val.parse::<u64>() {
            Ok(value) => value,
            Err(source) => return Self::on_invalid_value(key, val, lineno, source),
        };

        if !Self::ALLOW_DUPLICATE_KEYS && !seen.insert(known) {
            return Err(StatParseError::DuplicateField {
                field: known.to_owned(),
                line: lineno,
            }
            .into());
        }
        setter(stat, value);
        Ok(())
    }

    /// Hook for keys without a setter. Ignores them by default.
    #[inline]
    fn on_unknown_key(_key: &str, _val: &str, _lineno: usize) -> io::Result<()> {
        Ok(())
    }

    /// Hook for values of known keys that are not a `u64`.
    ///
    /// # Errors
    ///
    /// Fails with [`StatParseError::InvalidKeyValue`] by default.
    #[inline]
    fn on_invalid_value(
        key: &str,
        val: &str,
        lineno: usize,
        source: ParseIntError,
    ) -> io::Result<()> {
        Err(StatParseError::InvalidKeyValue {
            key: key.to_owned(),
            value: val.to_owned(),
            line: lineno,
            source,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::error::unwrap_parse_error;
    use std::sync::LazyLock;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct StrictStat {
        threads: u64,
        vm_rss: u64,
    }

    type Setter = fn(&mut StrictStat, u64);

    static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
        let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);
        m.insert("Threads", |s, v| s.threads = v);
        m.insert("VmRSS", |s, v| s.vm_rss = v);
        m
    });

    impl KeyValueStat for StrictStat {
        const KEY_TERMINATOR: Option<char> = Some(':');
        const SKIP_LINES: usize = 1;
        const ALLOW_DUPLICATE_KEYS: bool = false;

        fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
            &SETTERS
        }
    }

    #[test]
    fn test_skips_leading_lines() {
        let data = "\
Threads: 99
Threads: 4
VmRSS: 2048 kB
";
        let stat = StrictStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(
            stat,
            StrictStat {
                threads: 4,
                vm_rss: 2048
            }
        );
    }

    #[test]
    fn test_invalid_value_is_rejected_by_default() {
        let data = "\
header
Threads: 4
VmRSS: lots kB
";
        let err = StrictStat::from_reader(&mut data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        match unwrap_parse_error(&err) {
            StatParseError::InvalidKeyValue {
                key, value, line, ..
            } => {
                assert_eq!(key, "VmRSS");
                assert_eq!(value, "lots");
                assert_eq!(*line, 2);
            }
            other => panic!("Expected InvalidKeyValue error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let data = "\
header
Threads: 4
Threads: 5
";
        let err = StrictStat::from_reader(&mut data.as_bytes()).unwrap_err();
        match unwrap_parse_error(&err) {
            StatParseError::DuplicateField { field, line } => {
                assert_eq!(field, "Threads");
                assert_eq!(*line, 2);
            }
            other => panic!("Expected DuplicateField error, got {other:?}"),
        }
    }

    #[test]
    fn test_key_without_terminator_is_unknown() {
        let data = "\
header
Threads 4
VmRSS: 16 kB
";
        let stat = StrictStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.threads, 0);
        assert_eq!(stat.vm_rss, 16);
    }

    #[test]
    fn test_short_lines_are_ignored() {
        let data = "\
header

Threads:
VmRSS: 16 kB
";
        let stat = StrictStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.threads, 0);
        assert_eq!(stat.vm_rss, 16);
    }
}
