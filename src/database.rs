//! Remote database: an ordered collection of parsed remotes plus the
//! reserved internal pseudo-remote used to report end-of-stream.
//!
//! Grounded in `config_file.c`'s `read_config` top level (which returns a
//! `struct ir_remote *` list) and the `lirc` pseudo-remote referenced by
//! `hw-default.c`/`release_map`'s `__EOF` sentinel.

use crate::errors::{Error, Result};
use crate::remote::{IrNcode, Remote};

/// Name of the reserved pseudo-remote carrying the `__EOF` sentinel code.
pub const INTERNAL_REMOTE_NAME: &str = "lirc";
/// Name of the sentinel code reported when a driver-level EOF is seen.
pub const EOF_CODE_NAME: &str = "__EOF";

/// An ordered collection of parsed remotes, as produced by [`crate::parser`]
/// and consumed by [`crate::decode`] and [`crate::transmit`].
#[derive(Debug, Clone, Default)]
pub struct RemoteDatabase {
    remotes: Vec<Remote>,
}

impl RemoteDatabase {
    pub fn new() -> Self {
        RemoteDatabase { remotes: Vec::new() }
    }

    /// Build a database from already-parsed remotes, appending the
    /// reserved internal `lirc` remote carrying `__EOF`.
    pub fn from_remotes(mut remotes: Vec<Remote>) -> Self {
        remotes.push(internal_remote());
        RemoteDatabase { remotes }
    }

    pub fn push(&mut self, remote: Remote) {
        self.remotes.push(remote);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Remote> {
        self.remotes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Remote> {
        self.remotes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    /// Case-insensitive lookup by remote name.
    pub fn get(&self, name: &str) -> Option<&Remote> {
        self.remotes.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Look up a button by remote and button name, the `irsend SEND_ONCE
    /// <remote> <button>` shape, failing with [`Error::UnknownRemote`]/
    /// [`Error::UnknownButton`] rather than a bare `None`.
    pub fn find_button(&self, remote_name: &str, button_name: &str) -> Result<(&Remote, &IrNcode)> {
        let remote = self.get(remote_name).ok_or_else(|| Error::UnknownRemote(remote_name.to_string()))?;
        let code = remote.code_by_name(button_name).ok_or_else(|| Error::UnknownButton {
            remote: remote_name.to_string(),
            button: button_name.to_string(),
        })?;
        Ok((remote, code))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Remote> {
        self.remotes.iter_mut().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Stable-sort remotes cheapest-to-match first: non-raw before raw,
    /// then fewer bits, then fewer codes. Skipped entirely if any remote
    /// has `manual_sort` set, matching the original's commented-out
    /// `sort_by_bit_count` call site that config authors can opt back
    /// into per-remote.
    pub fn sort_by_cost(&mut self) {
        if self.remotes.iter().any(|r| r.manual_sort) {
            log::debug!("sort_by_cost: skipped, a remote has manual_sort set");
            return;
        }
        self.remotes.sort_by_key(|r| (r.is_raw(), r.bits, r.codes.len()));
        log::debug!("sort_by_cost: reordered {} remotes cheapest-to-match first", self.remotes.len());
    }
}

fn internal_remote() -> Remote {
    let mut remote = Remote::new(INTERNAL_REMOTE_NAME);
    remote.codes.push(IrNcode::new(EOF_CODE_NAME, 0));
    remote
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_with(name: &str, bits: u32, num_codes: usize) -> Remote {
        let mut r = Remote::new(name);
        r.bits = bits;
        for i in 0..num_codes {
            r.codes.push(IrNcode::new(format!("KEY_{i}"), i as u64));
        }
        r
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let db = RemoteDatabase::from_remotes(vec![remote_with("Sony", 12, 1)]);
        assert!(db.get("sony").is_some());
        assert!(db.get("SONY").is_some());
    }

    #[test]
    fn internal_remote_carries_eof_code() {
        let db = RemoteDatabase::from_remotes(vec![]);
        let internal = db.get(INTERNAL_REMOTE_NAME).expect("internal remote present");
        assert!(internal.code_by_name(EOF_CODE_NAME).is_some());
    }

    #[test]
    fn sort_by_cost_orders_non_raw_before_raw_and_by_bits() {
        let mut big = remote_with("big", 32, 5);
        big.flags = crate::remote::RemoteFlags::empty();
        let mut raw = remote_with("raw", 0, 1);
        raw.flags = crate::remote::RemoteFlags::RAW_CODES;
        let small = remote_with("small", 8, 1);

        let mut db = RemoteDatabase::from_remotes(vec![big, raw, small]);
        db.sort_by_cost();

        let names: Vec<&str> = db.iter().map(|r| r.name.as_str()).collect();
        let raw_pos = names.iter().position(|n| *n == "raw").unwrap();
        let small_pos = names.iter().position(|n| *n == "small").unwrap();
        let big_pos = names.iter().position(|n| *n == "big").unwrap();
        assert!(small_pos < big_pos);
        assert!(big_pos < raw_pos);
    }

    #[test]
    fn find_button_resolves_remote_and_button() {
        let db = RemoteDatabase::from_remotes(vec![remote_with("sony", 12, 2)]);
        let (remote, code) = db.find_button("sony", "KEY_0").expect("should resolve");
        assert_eq!(remote.name, "sony");
        assert_eq!(code.code, 0);
    }

    #[test]
    fn find_button_reports_unknown_remote() {
        let db = RemoteDatabase::from_remotes(vec![remote_with("sony", 12, 1)]);
        let err = db.find_button("missing", "KEY_0").unwrap_err();
        assert!(matches!(err, crate::errors::Error::UnknownRemote(name) if name == "missing"));
    }

    #[test]
    fn find_button_reports_unknown_button() {
        let db = RemoteDatabase::from_remotes(vec![remote_with("sony", 12, 1)]);
        let err = db.find_button("sony", "KEY_MISSING").unwrap_err();
        assert!(matches!(err, crate::errors::Error::UnknownButton { remote, button }
            if remote == "sony" && button == "KEY_MISSING"));
    }

    #[test]
    fn sort_by_cost_skipped_when_manual_sort_set() {
        let mut manual = remote_with("manual", 32, 1);
        manual.manual_sort = true;
        let small = remote_with("small", 8, 1);

        let mut db = RemoteDatabase::from_remotes(vec![manual, small]);
        let before: Vec<String> = db.iter().map(|r| r.name.clone()).collect();
        db.sort_by_cost();
        let after: Vec<String> = db.iter().map(|r| r.name.clone()).collect();
        assert_eq!(before, after);
    }
}
