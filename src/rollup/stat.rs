//! Parsing of `/proc/<pid>/smaps_rollup`.
//!
//! The rollup starts with a pseudo mapping header followed by one
//! `Key:   value kB` line per counter:
//!
//! ```text
//! 55d0c8a4a000-7ffd3b7fe000 ---p 00000000 00:00 0                          [rollup]
//! Rss:                4436 kB
//! Pss:                1210 kB
//! Shared_Clean:       3112 kB
//! Shared_Dirty:          0 kB
//! Private_Clean:       204 kB
//! Private_Dirty:      1120 kB
//! ```
//!
//! Only the six counters above are kept. Unknown keys and malformed values are
//! skipped, so a counter the kernel did not report stays `None`. A repeated
//! key overwrites the earlier value.

use std::collections::HashMap;
use std::num::ParseIntError;
use std::sync::LazyLock;

use super::parser::KeyValueStat;

/// Memory counters from a single `smaps_rollup` read, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollupStat {
    /// Resident set size.
    pub rss: Option<u64>,
    /// Proportional set size.
    pub pss: Option<u64>,
    pub shared_clean: Option<u64>,
    pub shared_dirty: Option<u64>,
    pub private_clean: Option<u64>,
    pub private_dirty: Option<u64>,
}

impl RollupStat {
    fn set_rss(&mut self, v: u64) {
        self.rss = Some(v);
    }

    fn set_pss(&mut self, v: u64) {
        self.pss = Some(v);
    }

    fn set_shared_clean(&mut self, v: u64) {
        self.shared_clean = Some(v);
    }

    fn set_shared_dirty(&mut self, v: u64) {
        self.shared_dirty = Some(v);
    }

    fn set_private_clean(&mut self, v: u64) {
        self.private_clean = Some(v);
    }

    fn set_private_dirty(&mut self, v: u64) {
        self.private_dirty = Some(v);
    }

    /// Unique set size: private clean plus private dirty.
    ///
    /// `None` unless both private counters were reported.
    pub fn uss(&self) -> Option<u64> {
        self.private_clean?.checked_add(self.private_dirty?)
    }

}

type Setter = fn(&mut RollupStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(6);

    m.insert("Rss", RollupStat::set_rss);
    m.insert("Pss", RollupStat::set_pss);
    m.insert("Shared_Clean", RollupStat::set_shared_clean);
    m.insert("Shared_Dirty", RollupStat::set_shared_dirty);
    m.insert("Private_Clean", RollupStat::set_private_clean);
    m.insert("Private_Dirty", RollupStat::set_private_dirty);

    m
});

impl KeyValueStat for RollupStat {
    const KEY_TERMINATOR: Option<char> = Some(':');
    const SKIP_LINES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = true;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }

    fn on_invalid_value(
        key: &str,
        val: &str,
        lineno: usize,
        source: ParseIntError,
    ) -> std::io::Result<()> {
        log::trace!(
            "skipping malformed rollup value: key={key}, value={val}, line={lineno}, error={source}"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLLUP: &str = "\
55d0c8a4a000-7ffd3b7fe000 ---p 00000000 00:00 0                          [rollup]
Rss:                4436 kB
Pss:                1210 kB
Pss_Anon:            980 kB
Pss_File:            230 kB
Pss_Shmem:             0 kB
Shared_Clean:       3112 kB
Shared_Dirty:          0 kB
Private_Clean:       204 kB
Private_Dirty:      1120 kB
Referenced:         4436 kB
Anonymous:           980 kB
Swap:                  0 kB
SwapPss:               0 kB
Locked:                0 kB
";

    #[test]
    fn test_parse_complete_rollup() {
        let stat = RollupStat::from_reader(&mut ROLLUP.as_bytes()).unwrap();
        assert_eq!(stat.rss, Some(4436));
        assert_eq!(stat.pss, Some(1210));
        assert_eq!(stat.shared_clean, Some(3112));
        assert_eq!(stat.shared_dirty, Some(0));
        assert_eq!(stat.private_clean, Some(204));
        assert_eq!(stat.private_dirty, Some(1120));
        assert_eq!(stat.uss(), Some(1324));
    }

    #[test]
    fn test_parse_empty_rollup() {
        let stat = RollupStat::from_reader(&mut "".as_bytes()).unwrap();
        assert_eq!(stat, RollupStat::default());
        assert_eq!(stat.uss(), None);
    }

    #[test]
    fn test_pss_variants_do_not_shadow_pss() {
        let data = "Pss_Anon: 5 kB\nPss: 7 kB\nPss_File: 9 kB\n";
        let stat = RollupStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.pss, Some(7));
    }

    #[test]
    fn test_malformed_value_is_skipped() {
        let data = "\
Rss: 100 kB
Private_Clean: ?? kB
Private_Dirty: 40 kB
";
        let stat = RollupStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.rss, Some(100));
        assert_eq!(stat.private_clean, None);
        assert_eq!(stat.private_dirty, Some(40));
        assert_eq!(stat.uss(), None);
    }

    #[test]
    fn test_uss_requires_both_private_counters() {
        let only_dirty = RollupStat {
            private_dirty: Some(8),
            ..RollupStat::default()
        };
        assert_eq!(only_dirty.uss(), None);

        let both = RollupStat {
            private_clean: Some(0),
            private_dirty: Some(8),
            ..RollupStat::default()
        };
        assert_eq!(both.uss(), Some(8));
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let data = "Rss: 10 kB\nRss: 11 kB\nPss: 5 kB\n";
        let stat = RollupStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.rss, Some(11));
        assert_eq!(stat.pss, Some(5));
    }

    #[test]
    fn test_all_values_malformed() {
        let data = "Rss: x kB\nPss: y kB\n";
        let stat = RollupStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat, RollupStat::default());
    }

    #[test]
    fn test_extra_whitespace() {
        let data = "    Rss:\t\t  512   kB\n  Pss:  256 kB  \n";
        let stat = RollupStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.rss, Some(512));
        assert_eq!(stat.pss, Some(256));
    }
}
