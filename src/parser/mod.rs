//! Keymap / remote configuration parser (component B).
//!
//! Line-oriented, section-stack grammar. Grounded in
//! `original_source/liblircd/src/config_file.c`: `read_config_recursive`
//! implements the token loop below, `defineRemote` the per-keyword
//! dispatch, `parseFlags` the flag-name lookup, `sanityChecks` and the
//! post-loop normalization in the same function the corresponding passes
//! here.

use std::path::{Path, PathBuf};

use crate::duration::{gen_mask, reverse};
use crate::errors::{Error, Result};
use crate::remote::{IrNcode, Parity, Remote, RemoteFlags};

const MAX_LINE_LEN: usize = 4096;
const MAX_INCLUDES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Remote,
    Codes,
    RawCodes,
    RawName,
}

struct RawCode {
    name: String,
    signals: Vec<u32>,
}

/// Parse a remote-definition document held entirely in memory. `include`
/// directives are rejected (there is no base directory to resolve them
/// against); use [`parse_file`] when includes must be honored.
pub fn parse_str(text: &str) -> Result<Vec<Remote>> {
    parse_text(text, None, 0)
}

/// Parse a remote-definition file from disk, resolving `include`
/// directives relative to the including file's directory and expanding
/// glob patterns, to a maximum include depth of 10.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Remote>> {
    parse_file_at_depth(path.as_ref(), 0)
}

fn parse_file_at_depth(path: &Path, depth: usize) -> Result<Vec<Remote>> {
    let text = std::fs::read_to_string(path)?;
    parse_text(&text, Some(path), depth)
}

fn parse_text(text: &str, source: Option<&Path>, depth: usize) -> Result<Vec<Remote>> {
    let mut remotes: Vec<Remote> = Vec::new();
    let mut mode = Mode::None;
    let mut current: Option<Remote> = None;
    let mut codes: Vec<IrNcode> = Vec::new();
    let mut raw_codes: Vec<RawCode> = Vec::new();
    let mut raw_name: Option<String> = None;
    let mut raw_signals: Vec<u32> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw_line.len() > MAX_LINE_LEN {
            return Err(Error::parse(line_no, "line too long in config file"));
        }
        let line = raw_line.trim_end_matches('\r');
        if line.trim_start().starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        let val = tokens.next();
        let val2 = tokens.next();
        log::trace!("line {line_no}: {key} {val:?} {val2:?}");

        let Some(val) = val else {
            // A bare token is only legal while accumulating raw signal
            // values that wrapped onto their own line.
            if mode == Mode::RawName {
                raw_signals.push(parse_u32(key, line_no)?);
                continue;
            }
            return Err(Error::parse(line_no, "unexpected bare token"));
        };

        if key.eq_ignore_ascii_case("include") {
            let Some(base) = source else {
                return Err(Error::parse(line_no, "include used without a file context"));
            };
            if depth >= MAX_INCLUDES {
                return Err(Error::parse(line_no, "too many files included"));
            }
            let included = resolve_includes(base, val)?;
            for child in included {
                let mut child_remotes = parse_file_at_depth(&child, depth + 1)?;
                remotes.append(&mut child_remotes);
            }
            continue;
        }

        if key.eq_ignore_ascii_case("begin") {
            if val.eq_ignore_ascii_case("remote") {
                require_mode(mode, Mode::None, "begin remote", line_no)?;
                mode = Mode::Remote;
                current = Some(Remote::new(""));
            } else if val.eq_ignore_ascii_case("codes") {
                require_mode(mode, Mode::Remote, "begin codes", line_no)?;
                if !current.as_ref().unwrap().codes.is_empty() {
                    return Err(Error::parse(line_no, "codes are already defined"));
                }
                codes.clear();
                mode = Mode::Codes;
            } else if val.eq_ignore_ascii_case("raw_codes") {
                require_mode(mode, Mode::Remote, "begin raw_codes", line_no)?;
                if !current.as_ref().unwrap().codes.is_empty() {
                    return Err(Error::parse(line_no, "codes are already defined"));
                }
                current.as_mut().unwrap().flags |= RemoteFlags::RAW_CODES;
                raw_codes.clear();
                mode = Mode::RawCodes;
            } else {
                return Err(Error::parse(line_no, format!("unknown section \"{val}\"")));
            }
            continue;
        }

        if key.eq_ignore_ascii_case("end") {
            if val.eq_ignore_ascii_case("codes") {
                require_mode(mode, Mode::Codes, "end codes", line_no)?;
                current.as_mut().unwrap().codes = std::mem::take(&mut codes);
                mode = Mode::Remote;
            } else if val.eq_ignore_ascii_case("raw_codes") {
                if mode == Mode::RawName {
                    finish_raw_name(&mut raw_codes, &mut raw_name, &mut raw_signals, line_no)?;
                    mode = Mode::RawCodes;
                }
                require_mode(mode, Mode::RawCodes, "end raw_codes", line_no)?;
                current.as_mut().unwrap().codes = raw_codes
                    .drain(..)
                    .map(|rc| IrNcode::with_raw_signals(rc.name, rc.signals))
                    .collect();
                mode = Mode::Remote;
            } else if val.eq_ignore_ascii_case("remote") {
                require_mode(mode, Mode::Remote, "end remote", line_no)?;
                let rem = current.take().unwrap();
                let rem = sanity_check(rem, line_no)?;
                remotes.push(rem);
                mode = Mode::None;
            } else {
                return Err(Error::parse(line_no, format!("unknown section {val}")));
            }
            continue;
        }

        match mode {
            Mode::Remote => {
                let rem = current.as_mut().expect("Remote mode implies an open remote");
                define_remote_field(rem, key, val, val2, line_no)?;
            }
            Mode::Codes => {
                let mut code = IrNcode::new(key, parse_u64(val, line_no)?);
                if let Some(v2) = val2 {
                    if !v2.starts_with('#') {
                        code.chain.successors.push(parse_u64(v2, line_no)?);
                        for extra in tokens {
                            if extra.starts_with('#') {
                                break;
                            }
                            code.chain.successors.push(parse_u64(extra, line_no)?);
                        }
                    }
                }
                codes.push(code);
            }
            Mode::RawCodes | Mode::RawName => {
                if key.eq_ignore_ascii_case("name") {
                    if mode == Mode::RawName {
                        finish_raw_name(&mut raw_codes, &mut raw_name, &mut raw_signals, line_no)?;
                    }
                    raw_name = Some(val.to_string());
                    raw_signals.clear();
                    mode = Mode::RawName;
                } else {
                    if mode == Mode::RawCodes {
                        return Err(Error::parse(line_no, "no name for signal defined"));
                    }
                    raw_signals.push(parse_u32(key, line_no)?);
                    raw_signals.push(parse_u32(val, line_no)?);
                    if let Some(v2) = val2 {
                        raw_signals.push(parse_u32(v2, line_no)?);
                    }
                    for extra in tokens {
                        raw_signals.push(parse_u32(extra, line_no)?);
                    }
                }
            }
            Mode::None => {
                return Err(Error::parse(line_no, "token outside of any section"));
            }
        }
    }

    if mode != Mode::None {
        return Err(Error::parse(usize::MAX, "unexpected end of file"));
    }

    for rem in &mut remotes {
        normalize(rem);
    }
    Ok(remotes)
}

fn require_mode(actual: Mode, expected: Mode, what: &str, line: usize) -> Result<()> {
    if actual != expected {
        Err(Error::parse(line, format!("\"{what}\" isn't valid at this position")))
    } else {
        Ok(())
    }
}

fn finish_raw_name(
    raw_codes: &mut Vec<RawCode>,
    raw_name: &mut Option<String>,
    raw_signals: &mut Vec<u32>,
    line: usize,
) -> Result<()> {
    if let Some(name) = raw_name.take() {
        if raw_signals.len() % 2 == 0 {
            return Err(Error::parse(line, "bad signal length"));
        }
        raw_codes.push(RawCode {
            name,
            signals: std::mem::take(raw_signals),
        });
    }
    Ok(())
}

fn resolve_includes(including_file: &Path, pattern_token: &str) -> Result<Vec<PathBuf>> {
    let pattern = pattern_token
        .trim()
        .trim_matches(|c| c == '"' || c == '<' || c == '>');
    let base_dir = including_file.parent().unwrap_or_else(|| Path::new("."));
    let joined = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        base_dir.join(pattern).to_string_lossy().into_owned()
    };
    let mut found = Vec::new();
    for entry in glob::glob(&joined).map_err(|e| Error::ProtocolError(e.to_string()))? {
        found.push(entry.map_err(|e| Error::ProtocolError(e.to_string()))?);
    }
    if found.is_empty() {
        found.push(PathBuf::from(joined));
    }
    Ok(found)
}

fn define_remote_field(
    rem: &mut Remote,
    key: &str,
    val: &str,
    val2: Option<&str>,
    line: usize,
) -> Result<()> {
    let lower = key.to_ascii_lowercase();
    match lower.as_str() {
        "name" => {
            log::info!("Using remote: {val}.");
            rem.name = val.to_string();
        }
        "driver" => rem.driver = Some(val.to_string()),
        "bits" => rem.bits = parse_i32(val, line)? as u32,
        "flags" => {
            for part in val.split('|') {
                let flag = RemoteFlags::from_name(part)
                    .ok_or_else(|| Error::parse(line, format!("unknown flag: \"{part}\"")))?;
                let incoming = rem.flags | flag;
                if (incoming & crate::remote::flags::PROTOCOL_MASK).has_multiple_protocols() {
                    return Err(Error::parse(line, format!("multiple protocols given in flags: \"{part}\"")));
                }
                rem.flags = incoming;
            }
        }
        "eps" => rem.eps = parse_i32(val, line)?,
        "aeps" => rem.aeps = parse_u32(val, line)?,
        "plead" => rem.plead = parse_u32(val, line)?,
        "ptrail" => rem.ptrail = parse_u32(val, line)?,
        "pre_data_bits" => rem.pre_data_bits = parse_i32(val, line)? as u32,
        "pre_data" => rem.pre_data = parse_u64(val, line)?,
        "post_data_bits" => rem.post_data_bits = parse_i32(val, line)? as u32,
        "post_data" => rem.post_data = parse_u64(val, line)?,
        "gap" => {
            rem.gap = parse_u32(val, line)?;
            if let Some(v2) = val2 {
                rem.gap2 = parse_u32(v2, line)?;
            }
        }
        "repeat_gap" => rem.repeat_gap = parse_u32(val, line)?,
        "repeat_mask" => rem.repeat_mask = parse_u64(val, line)?,
        // "toggle_bit"/"repeat_bit" are obsolete aliases for the same raw
        // 1-based bit position; normalize() folds it into toggle_bit_mask
        // (or rc6_mask, for RC-6 remotes) once the frame's total bit
        // count is known.
        "toggle_bit" | "repeat_bit" => rem.toggle_bit = parse_i32(val, line)? as u32,
        "toggle_bit_mask" => rem.toggle_bit_mask = parse_u64(val, line)?,
        "toggle_mask" => rem.toggle_mask = parse_u64(val, line)?,
        "rc6_mask" => rem.rc6_mask = parse_u64(val, line)?,
        "ignore_mask" => rem.ignore_mask = parse_u64(val, line)?,
        "manual_sort" => rem.manual_sort = parse_i32(val, line)? != 0,
        "suppress_repeat" => rem.suppress_repeat = parse_i32(val, line)? as u32,
        "min_repeat" => rem.min_repeat = parse_i32(val, line)? as u32,
        "min_code_repeat" => rem.min_code_repeat = parse_i32(val, line)? as u32,
        "frequency" => rem.freq = parse_u32(val, line)?,
        "duty_cycle" => rem.duty_cycle = parse_u32(val, line)?,
        "baud" => rem.baud = parse_u32(val, line)?,
        "serial_mode" => parse_serial_mode(rem, val, line)?,
        "header" => {
            let v2 = require_val2(val2, key, line)?;
            rem.phead = parse_u32(val, line)?;
            rem.shead = parse_u32(v2, line)?;
        }
        "three" => {
            let v2 = require_val2(val2, key, line)?;
            rem.pthree = parse_u32(val, line)?;
            rem.sthree = parse_u32(v2, line)?;
        }
        "two" => {
            let v2 = require_val2(val2, key, line)?;
            rem.ptwo = parse_u32(val, line)?;
            rem.stwo = parse_u32(v2, line)?;
        }
        "one" => {
            let v2 = require_val2(val2, key, line)?;
            rem.pone = parse_u32(val, line)?;
            rem.sone = parse_u32(v2, line)?;
        }
        "zero" => {
            let v2 = require_val2(val2, key, line)?;
            rem.pzero = parse_u32(val, line)?;
            rem.szero = parse_u32(v2, line)?;
        }
        "foot" => {
            let v2 = require_val2(val2, key, line)?;
            rem.pfoot = parse_u32(val, line)?;
            rem.sfoot = parse_u32(v2, line)?;
        }
        "repeat" => {
            let v2 = require_val2(val2, key, line)?;
            rem.prepeat = parse_u32(val, line)?;
            rem.srepeat = parse_u32(v2, line)?;
        }
        "pre" => {
            let v2 = require_val2(val2, key, line)?;
            rem.pre_p = parse_u32(val, line)?;
            rem.pre_s = parse_u32(v2, line)?;
        }
        "post" => {
            let v2 = require_val2(val2, key, line)?;
            rem.post_p = parse_u32(val, line)?;
            rem.post_s = parse_u32(v2, line)?;
        }
        _ => {
            return Err(Error::parse(line, format!("unknown definition or too few arguments: \"{key} {val}\"")));
        }
    }
    Ok(())
}

fn require_val2<'a>(val2: Option<&'a str>, key: &str, line: usize) -> Result<&'a str> {
    val2.ok_or_else(|| Error::parse(line, format!("\"{key}\" requires two values")))
}

fn parse_serial_mode(rem: &mut Remote, val: &str, line: usize) -> Result<()> {
    let bytes = val.as_bytes();
    if bytes.is_empty() || !(b'5'..=b'9').contains(&bytes[0]) {
        return Err(Error::parse(line, "bad bit count"));
    }
    rem.bits_in_byte = (bytes[0] - b'0') as u32;
    let parity_char = *bytes.get(1).ok_or_else(|| Error::parse(line, "missing parity"))? as char;
    rem.parity = match parity_char.to_ascii_uppercase() {
        'N' => Parity::None,
        'E' => Parity::Even,
        'O' => Parity::Odd,
        _ => return Err(Error::parse(line, "unsupported parity mode")),
    };
    let rest = &val[2..];
    rem.stop_bits = if rest == "1.5" {
        3
    } else {
        parse_u32(rest, line)? * 2
    };
    Ok(())
}

fn sanity_check(mut rem: Remote, line: usize) -> Result<Remote> {
    if rem.name.is_empty() {
        return Err(Error::parse(line, "missing remote name"));
    }
    if rem.gap == 0 {
        log::warn!("{}: gap value missing or invalid", rem.name);
    }
    if rem.has_repeat_gap() && rem.is_const() {
        log::warn!("{}: repeat_gap ignored (CONST_LENGTH is set)", rem.name);
    }
    if rem.is_raw() {
        return Ok(rem);
    }
    if rem.pre_data & gen_mask(rem.pre_data_bits) != rem.pre_data {
        log::warn!("{}: invalid pre_data", rem.name);
        rem.pre_data &= gen_mask(rem.pre_data_bits);
    }
    if rem.post_data & gen_mask(rem.post_data_bits) != rem.post_data {
        log::warn!("{}: invalid post_data", rem.name);
        rem.post_data &= gen_mask(rem.post_data_bits);
    }
    if rem.codes.is_empty() {
        return Err(Error::parse(line, format!("{}: no codes", rem.name)));
    }
    for code in &mut rem.codes {
        if code.code & gen_mask(rem.bits) != code.code {
            log::warn!("{}: invalid code: {}", rem.name, code.name);
            code.code &= gen_mask(rem.bits);
        }
    }
    check_ncode_dups(&rem.name, &rem.codes);
    Ok(rem)
}

/// Warns (never rejects) on two kinds of duplication within one remote's
/// code table: the same button name defined twice, and two different
/// buttons sharing the same primary code value.
fn check_ncode_dups(remote_name: &str, codes: &[IrNcode]) {
    for i in 0..codes.len() {
        for j in 0..i {
            if codes[i].name.eq_ignore_ascii_case(&codes[j].name) {
                log::warn!("{remote_name}: multiple definitions of: {}", codes[i].name);
            }
            if codes[i].code == codes[j].code {
                log::warn!("{remote_name}: multiple values for same code: {}", codes[i].name);
            }
        }
    }
}

/// Post-parse normalization: reverse handling, RC-6 mask backfill,
/// toggle_bit folding, serial defaults, min_code_repeat sanity.
/// Grounded in `config_file.c::read_config_recursive`'s post-loop.
fn normalize(rem: &mut Remote) {
    if !rem.is_raw() && rem.flags.contains(RemoteFlags::REVERSE) {
        if rem.has_pre() {
            rem.pre_data = reverse(rem.pre_data, rem.pre_data_bits);
        }
        if rem.has_post() {
            rem.post_data = reverse(rem.post_data, rem.post_data_bits);
        }
        for code in &mut rem.codes {
            code.code = reverse(code.code, rem.bits);
        }
        rem.flags.remove(RemoteFlags::REVERSE);
        rem.flags.insert(RemoteFlags::COMPAT_REVERSE);
    }

    if rem.flags.contains(RemoteFlags::RC6) && rem.rc6_mask == 0 && rem.toggle_bit > 0 {
        let all_bits = rem.bit_count();
        rem.rc6_mask = 1u64 << (all_bits - rem.toggle_bit);
    }
    if rem.toggle_bit > 0 {
        let all_bits = rem.bit_count();
        if rem.has_toggle_bit_mask() {
            log::warn!("{}: uses both toggle_bit and toggle_bit_mask", rem.name);
        } else {
            rem.toggle_bit_mask = 1u64 << (all_bits - rem.toggle_bit);
        }
        rem.toggle_bit = 0;
    }

    if rem.toggle_bit_mask != 0 {
        if !rem.is_raw() && !rem.codes.is_empty() {
            let mut state = rem.codes[0].code & rem.toggle_bit_mask;
            if state != 0 {
                state ^= rem.toggle_bit_mask;
            }
            rem.runtime.toggle_bit_mask_state = state;
        }
    }

    if rem.is_serial() {
        if rem.baud > 0 {
            let base = 1_000_000 / rem.baud;
            if rem.pzero == 0 && rem.szero == 0 {
                rem.pzero = base;
            }
            if rem.pone == 0 && rem.sone == 0 {
                rem.sone = base;
            }
        }
        if rem.bits_in_byte == 0 {
            rem.bits_in_byte = 8;
        }
    }

    if rem.min_code_repeat > 0 && (!rem.has_repeat() || rem.min_code_repeat > rem.min_repeat) {
        log::warn!("{}: invalid min_code_repeat value", rem.name);
        rem.min_code_repeat = 0;
    }

    crate::transmit::calculate_signal_lengths(rem);
}

fn parse_unsigned(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8).ok()
    } else {
        s.parse::<u64>().ok()
    }
}

fn parse_u64(tok: &str, line: usize) -> Result<u64> {
    parse_unsigned(tok).ok_or_else(|| Error::parse(line, format!("\"{tok}\": must be a valid number")))
}

fn parse_u32(tok: &str, line: usize) -> Result<u32> {
    let v = parse_unsigned(tok).ok_or_else(|| Error::parse(line, format!("\"{tok}\": must be a valid number")))?;
    u32::try_from(v).map_err(|_| Error::parse(line, format!("\"{tok}\": out of range")))
}

fn parse_i32(tok: &str, line: usize) -> Result<i32> {
    let (neg, body) = match tok.strip_prefix('-') {
        Some(b) => (true, b),
        None => (false, tok.strip_prefix('+').unwrap_or(tok)),
    };
    let mag = parse_unsigned(body).ok_or_else(|| Error::parse(line, format!("\"{tok}\": must be a valid number")))?;
    let v = i64::try_from(mag).map_err(|_| Error::parse(line, format!("\"{tok}\": out of range")))?;
    let v = if neg { -v } else { v };
    i32::try_from(v).map_err(|_| Error::parse(line, format!("\"{tok}\": out of range")))
}
