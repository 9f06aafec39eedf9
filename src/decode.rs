//! Decoder state machine (component E): the structured descent that turns
//! a [`ReceiveBuffer`] of timed edges into a matched `(remote, button,
//! scancode, repeat)` tuple.
//!
//! Grounded in `ir_remote.c`'s `get_ir_code`/`get_pulse_data`/family
//! readers (`get_rc5`/`get_rc6`/`get_rcmm`/`get_grundig`/`get_xmp`) and
//! `match_ir_code`'s toggle/repeat bookkeeping.

use std::time::Instant;

use crate::database::{RemoteDatabase, EOF_CODE_NAME, INTERNAL_REMOTE_NAME};
use crate::duration::{is_within, Edge};
use crate::errors::Error;
use crate::receive::ReceiveBuffer;
use crate::remote::{IrNcode, Parity, ProtocolFamily, Remote, ToggleState};

/// Tuning knobs for [`decode`].
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Driver-reported timing resolution, widening every tolerance check.
    pub driver_resolution: u32,
    /// When a frame decodes to a bit pattern with no matching button,
    /// register it as a new button on the fly instead of discarding it.
    /// Off by default: most callers want unknown codes to be an error
    /// signal, not silent growth of the table.
    pub dynamic_codes: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            driver_resolution: 0,
            dynamic_codes: false,
        }
    }
}

/// One successfully decoded button press or repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub remote: String,
    pub button: String,
    pub scancode: u64,
    pub repeat: u32,
}

/// Try every remote in `db` against the next frame available in `buf`,
/// returning the first match. Leaves `buf` positioned after the matched
/// frame; a non-match tries the next remote from the same starting
/// point, matching the original's "walk the whole remote list" sweep.
pub fn decode(buf: &mut ReceiveBuffer, db: &mut RemoteDatabase, opts: &DecodeOptions) -> Option<Decoded> {
    for remote in db.iter_mut() {
        if remote.name == INTERNAL_REMOTE_NAME {
            // The reserved `__EOF` pseudo-remote carries no protocol
            // flags and no timing fields, so every real frame would
            // spuriously match it as an empty space-encoded frame of
            // zero bits. It is never matched as an ordinary remote; see
            // the genuine-EOF check below instead.
            continue;
        }
        log::trace!("decode: trying remote {}", remote.name);
        buf.mark();

        if remote.has_repeat() && match_repeat_frame(remote, buf, opts.driver_resolution) {
            if let Some(last_idx) = remote.runtime.last_code {
                remote.runtime.reps += 1;
                remote.runtime.last_send = Some(Instant::now());
                remote.runtime.min_remaining_gap = remote.min_gap();
                remote.runtime.max_remaining_gap = if remote.has_repeat_gap() { remote.repeat_gap } else { remote.max_gap() };
                let code = &remote.codes[last_idx];
                log::debug!("decode: {} matched hardware repeat of {} (reps {})", remote.name, code.name, remote.runtime.reps);
                return Some(Decoded {
                    remote: remote.name.clone(),
                    button: code.name.clone(),
                    scancode: code.code,
                    repeat: remote.runtime.reps,
                });
            }
            buf.rewind();
            continue;
        }
        buf.rewind();
        buf.mark();

        if remote.is_raw() {
            if let Some(idx) = match_raw(remote, buf, opts.driver_resolution) {
                record_match(remote, idx);
                let code = &remote.codes[idx];
                log::debug!("decode: {} matched raw button {}", remote.name, code.name);
                return Some(Decoded {
                    remote: remote.name.clone(),
                    button: code.name.clone(),
                    scancode: code.code,
                    repeat: remote.runtime.reps,
                });
            }
            buf.rewind();
            log::debug!("decode: {} did not match (raw)", remote.name);
            continue;
        }

        let Some(mut raw_code) = match_structured(remote, buf, opts.driver_resolution) else {
            buf.rewind();
            log::debug!("decode: {} did not match (structured)", remote.name);
            continue;
        };

        // Mirrors `match_ir_code`'s toggle_mask XOR-fold: a remote whose
        // `toggle_mask` is set emits two complementary codes for the same
        // button, alternating every press. Folding it back in front of
        // the table lookup is what makes both halves resolve to one
        // button. Applied to the main data field only; `pre_data`/
        // `post_data` are validated earlier as exact-match constants and
        // are out of scope for this fold (see DESIGN.md).
        if remote.has_toggle_mask() && remote.runtime.toggle_mask_state.is_odd() {
            raw_code ^= remote.toggle_mask;
        }

        let lookup_mask = !(remote.ignore_mask | remote.toggle_bit_mask);
        let masked = raw_code & lookup_mask;
        let found = remote
            .codes
            .iter()
            .position(|c| (c.code & lookup_mask) == masked)
            .or_else(|| {
                // `repeat_mask`: a hardware repeat frame carries the
                // original code XORed with this mask instead of resending
                // it unchanged. Retried as a fallback match, mirroring
                // the original's `all == code || all ^ repeat_mask ==
                // code` alternate-match search.
                if !remote.has_repeat_mask() {
                    return None;
                }
                let repeat_masked = (raw_code ^ remote.repeat_mask) & lookup_mask;
                remote.codes.iter().position(|c| (c.code & lookup_mask) == repeat_masked)
            })
            .or_else(|| {
                // Chained multi-frame buttons: the frame we just decoded
                // may be a later link in some other button's chain rather
                // than a standalone code.
                remote.codes.iter().position(|c| c.chain.successors.iter().any(|&s| (s & lookup_mask) == masked))
            });

        let idx = match found {
            Some(idx) => idx,
            None if opts.dynamic_codes => {
                let name = format!("{raw_code:X}");
                log::warn!("decode: {} saw unregistered code {raw_code:#x}, registering dynamically as {name}", remote.name);
                remote.codes.push(IrNcode::new(name, raw_code));
                remote.codes.len() - 1
            }
            None => {
                buf.rewind();
                log::debug!("decode: {} decoded {raw_code:#x} but no button matches it", remote.name);
                continue;
            }
        };

        if remote.has_toggle_bit_mask() {
            let prev = remote.runtime.toggle_bit_mask_state;
            remote.runtime.toggle_bit_mask_state = raw_code & remote.toggle_bit_mask;
            if prev != 0 && prev == remote.runtime.toggle_bit_mask_state && remote.runtime.last_code != Some(idx) {
                log::warn!("decode: {} toggle bit unchanged across a different button press", remote.name);
            }
        }
        record_match(remote, idx);
        let code = &remote.codes[idx];
        log::debug!("decode: {} matched button {} (reps {})", remote.name, code.name, remote.runtime.reps);
        return Some(Decoded {
            remote: remote.name.clone(),
            button: code.name.clone(),
            scancode: code.code,
            repeat: remote.runtime.reps,
        });
    }

    // No remote matched. If the driver has reported a genuine stream
    // termination (not merely "no more edges buffered right now") and
    // there is no leftover partial frame sitting in `buf`, report it via
    // the reserved internal pseudo-remote rather than silently returning
    // `None` forever.
    if buf.is_empty() && matches!(buf.terminal(), Some(Edge::Timeout) | Some(Edge::EndOfStream)) {
        if let Some(remote) = db.get(INTERNAL_REMOTE_NAME) {
            if let Some(code) = remote.code_by_name(EOF_CODE_NAME) {
                log::debug!("decode: driver reported end of stream, reporting {INTERNAL_REMOTE_NAME}/{EOF_CODE_NAME}");
                return Some(Decoded {
                    remote: remote.name.clone(),
                    button: code.name.clone(),
                    scancode: code.code,
                    repeat: 0,
                });
            }
        }
    }
    None
}

/// Mirrors `map_gap`/`get_code`'s repeat-vs-new-press classification: a
/// button seen again is only a *repeat* if the code index matches the
/// previous press AND the elapsed time since then is still within the
/// window `max_remaining_gap` computed after that previous press. Without
/// the gap check, releasing and quickly re-pressing the same button would
/// be misread as a continued repeat.
fn record_match(remote: &mut Remote, idx: usize) {
    let now = Instant::now();
    let within_gap = remote
        .runtime
        .last_send
        .map(|last| now.duration_since(last).as_micros() as u32 <= remote.runtime.max_remaining_gap)
        .unwrap_or(false);
    let is_repeat = within_gap && remote.runtime.last_code == Some(idx);
    remote.runtime.reps = if is_repeat { remote.runtime.reps + 1 } else { 0 };
    remote.runtime.last_code = Some(idx);
    remote.runtime.toggle_mask_state = remote.runtime.toggle_mask_state.advance();
    remote.runtime.last_send = Some(now);
    remote.runtime.min_remaining_gap = remote.min_gap();
    remote.runtime.max_remaining_gap = if is_repeat && remote.has_repeat_gap() {
        remote.repeat_gap
    } else {
        remote.max_gap()
    };
}

/// Match the short hardware-repeat frame (`prepeat`/`srepeat`, optionally
/// preceded by a repeated header). Carries no data bits: a match here
/// just extends the previously decoded button's repeat count.
fn match_repeat_frame(remote: &Remote, buf: &mut ReceiveBuffer, driver_res: u32) -> bool {
    if remote.repeat_header() && remote.has_header() {
        let Some(h) = buf.next() else { return false };
        if !h.is_pulse() || !is_within(h.magnitude, remote.phead, remote, driver_res) {
            return false;
        }
        let Some(s) = buf.next() else { return false };
        if !s.is_space() || !is_within(s.magnitude, remote.shead, remote, driver_res) {
            return false;
        }
    }
    let Some(p) = buf.next() else { return false };
    if !p.is_pulse() || !is_within(p.magnitude, remote.prepeat, remote, driver_res) {
        return false;
    }
    let Some(s) = buf.next() else { return false };
    s.is_space() && is_within(s.magnitude, remote.srepeat, remote, driver_res)
}

/// Elementwise-match a raw remote's stored signal arrays against the
/// buffer, trying each button in table order.
fn match_raw(remote: &Remote, buf: &mut ReceiveBuffer, driver_res: u32) -> Option<usize> {
    'candidates: for (idx, code) in remote.codes.iter().enumerate() {
        buf.mark();
        for (i, &expected) in code.signals.iter().enumerate() {
            let want_pulse = i % 2 == 0;
            let Some(d) = buf.next() else {
                buf.rewind();
                continue 'candidates;
            };
            if d.is_pulse() != want_pulse || !is_within(d.magnitude, expected, remote, driver_res) {
                buf.rewind();
                continue 'candidates;
            }
        }
        return Some(idx);
    }
    None
}

/// Header through foot, in order, for any non-raw family. Returns the
/// main data field's bits (not including pre/post, which are checked
/// against the remote's fixed `pre_data`/`post_data` rather than
/// returned).
fn match_structured(remote: &Remote, buf: &mut ReceiveBuffer, driver_res: u32) -> Option<u64> {
    let family = remote.protocol_family()?;
    log::trace!("{}: descending as {family:?}", remote.name);

    if remote.has_header() {
        log::trace!("{}: header", remote.name);
        let h = buf.next()?;
        if !h.is_pulse() || !is_within(h.magnitude, remote.phead, remote, driver_res) {
            return None;
        }
        let s = buf.next()?;
        if !s.is_space() || !is_within(s.magnitude, remote.shead, remote, driver_res) {
            return None;
        }
    }
    if remote.plead != 0 {
        let p = buf.next()?;
        if !p.is_pulse() || !is_within(p.magnitude, remote.plead, remote, driver_res) {
            return None;
        }
    }
    if remote.has_pre() {
        log::trace!("{}: pre", remote.name);
        if remote.pre_p != 0 || remote.pre_s != 0 {
            let p = buf.next()?;
            if !p.is_pulse() || !is_within(p.magnitude, remote.pre_p, remote, driver_res) {
                return None;
            }
            let s = buf.next()?;
            if !s.is_space() || !is_within(s.magnitude, remote.pre_s, remote, driver_res) {
                return None;
            }
        }
        let pre = read_bits(buf, remote, driver_res, remote.pre_data_bits, family)?;
        if pre != remote.pre_data {
            return None;
        }
    }

    log::trace!("{}: data", remote.name);
    let data = read_bits(buf, remote, driver_res, remote.bits, family)?;

    if remote.has_post() {
        log::trace!("{}: post", remote.name);
        let post = read_bits(buf, remote, driver_res, remote.post_data_bits, family)?;
        if post != remote.post_data {
            return None;
        }
        if remote.post_p != 0 || remote.post_s != 0 {
            let p = buf.next()?;
            if !p.is_pulse() || !is_within(p.magnitude, remote.post_p, remote, driver_res) {
                return None;
            }
            let s = buf.next()?;
            if !s.is_space() || !is_within(s.magnitude, remote.post_s, remote, driver_res) {
                return None;
            }
        }
    }
    if remote.ptrail != 0 {
        let p = buf.next()?;
        if !p.is_pulse() || !is_within(p.magnitude, remote.ptrail, remote, driver_res) {
            return None;
        }
    }
    if remote.has_foot() {
        log::trace!("{}: foot", remote.name);
        let p = buf.next()?;
        if !p.is_pulse() || !is_within(p.magnitude, remote.pfoot, remote, driver_res) {
            return None;
        }
        let s = buf.next()?;
        if !s.is_space() || !is_within(s.magnitude, remote.sfoot, remote, driver_res) {
            return None;
        }
    }
    Some(data)
}

fn read_bits(buf: &mut ReceiveBuffer, remote: &Remote, driver_res: u32, bits: u32, family: ProtocolFamily) -> Option<u64> {
    if bits == 0 {
        return Some(0);
    }
    match family {
        ProtocolFamily::SpaceFirst => {
            let mut code = 0u64;
            for _ in 0..bits {
                let s = buf.next()?;
                if !s.is_space() {
                    return None;
                }
                let p = buf.next()?;
                if !p.is_pulse() {
                    return None;
                }
                let bit = if is_within(s.magnitude, remote.sone, remote, driver_res) && is_within(p.magnitude, remote.pone, remote, driver_res) {
                    1
                } else if is_within(s.magnitude, remote.szero, remote, driver_res) && is_within(p.magnitude, remote.pzero, remote, driver_res) {
                    0
                } else {
                    return None;
                };
                code = (code << 1) | bit;
            }
            Some(code)
        }
        ProtocolFamily::Rc5 | ProtocolFamily::Rc6 => {
            let half = remote.pone.max(remote.sone).max(1);
            let mut code = 0u64;
            for i in (0..bits).rev() {
                let double_width = remote.has_rc6_mask() && (remote.rc6_mask & (1u64 << i)) != 0;
                let unit = if double_width { half * 2 } else { half };
                let first = buf.next()?;
                let second = buf.next()?;
                let bit = if first.is_space() && second.is_pulse() && is_within(first.magnitude, unit, remote, driver_res) && is_within(second.magnitude, unit, remote, driver_res) {
                    1
                } else if first.is_pulse() && second.is_space() && is_within(first.magnitude, unit, remote, driver_res) && is_within(second.magnitude, unit, remote, driver_res) {
                    0
                } else {
                    return None;
                };
                code = (code << 1) | bit;
            }
            Some(code)
        }
        ProtocolFamily::RcMm => read_four_symbol_bits(buf, remote, driver_res, bits),
        ProtocolFamily::Grundig => read_grundig_bits(buf, remote, driver_res, bits),
        // Bang & Olufsen's real decode alternates its pulse/space
        // thresholds by the previous bit's value. Approximated here with
        // the same four-level symbol reader RC-MM uses. See DESIGN.md.
        ProtocolFamily::BangOlufsen => read_four_symbol_bits(buf, remote, driver_res, bits),
        ProtocolFamily::Xmp => {
            // Nibble-distance symbol: a fixed `pzero`-width pulse, then a
            // space whose distance from `szero` in `sone`-sized steps
            // encodes the nibble, i.e. `szero + n*sone` for `0 <= n < 16`.
            let mut code = 0u64;
            let mut remaining = bits;
            while remaining >= 4 {
                remaining -= 4;
                let p = buf.next()?;
                if !p.is_pulse() || !is_within(p.magnitude, remote.pzero, remote, driver_res) {
                    return None;
                }
                let s = buf.next()?;
                if !s.is_space() {
                    return None;
                }
                let mut found = None;
                for nibble in 0..16u64 {
                    let expected = remote.szero + remote.sone * nibble as u32;
                    if is_within(s.magnitude, expected, remote, driver_res) {
                        found = Some(nibble);
                        break;
                    }
                }
                code = (code << 4) | found?;
            }
            Some(code)
        }
        ProtocolFamily::Serial => decode_serial_bits(buf, remote, driver_res, bits),
        _ => {
            let mut code = 0u64;
            for _ in 0..bits {
                let p = buf.next()?;
                if !p.is_pulse() {
                    return None;
                }
                let s = buf.next()?;
                if !s.is_space() {
                    return None;
                }
                let bit = if is_within(p.magnitude, remote.pone, remote, driver_res) && is_within(s.magnitude, remote.sone, remote, driver_res) {
                    1
                } else if is_within(p.magnitude, remote.pzero, remote, driver_res) && is_within(s.magnitude, remote.szero, remote, driver_res) {
                    0
                } else {
                    return None;
                };
                code = (code << 1) | bit;
            }
            Some(code)
        }
    }
}

/// Shared by RC-MM, Grundig and Bang & Olufsen: a pulse/space pair picked
/// from one of four widths, carrying two bits per symbol. Grundig and BO
/// reuse the same `pzero`/`pone`/`ptwo`/`pthree` width slots RC-MM uses
/// for its own four-level alphabet.
fn read_four_symbol_bits(buf: &mut ReceiveBuffer, remote: &Remote, driver_res: u32, bits: u32) -> Option<u64> {
    let mut code = 0u64;
    let mut remaining = bits;
    while remaining >= 2 {
        remaining -= 2;
        let p = buf.next()?;
        if !p.is_pulse() {
            return None;
        }
        let s = buf.next()?;
        if !s.is_space() {
            return None;
        }
        let widths = [
            (remote.pzero, remote.szero, 0u64),
            (remote.pone, remote.sone, 1u64),
            (remote.ptwo, remote.stwo, 2u64),
            (remote.pthree, remote.sthree, 3u64),
        ];
        let sym = widths
            .into_iter()
            .find(|&(pp, ss, _)| is_within(p.magnitude, pp, remote, driver_res) && is_within(s.magnitude, ss, remote, driver_res))
            .map(|(_, _, v)| v)?;
        code = (code << 2) | sym;
    }
    Some(code)
}

/// Grundig's symbol-pair state machine: each symbol is one (space +
/// pulse) sum classified into one of four widths, traced in the
/// original as `2T`/`3T`/`4T`/`6T`. A lone `6T` symbol emits `00` and
/// resets; otherwise a symbol is held as `laststate` until the next one
/// arrives, and the pair is looked up in a small table (`4T,2T -> 01`,
/// `3T,3T -> 10`, `2T,4T -> 11`); any other pairing is a decode failure.
/// `bits` must be even. Grounded in `receive.c`'s `is_grundig` branch of
/// `get_pulse_data`.
fn read_grundig_bits(buf: &mut ReceiveBuffer, remote: &Remote, driver_res: u32, bits: u32) -> Option<u64> {
    if bits % 2 != 0 {
        return None;
    }
    let mut code = 0u64;
    let mut emitted = 0u32;
    let mut laststate: Option<u8> = None;
    while emitted < bits {
        let s = buf.next()?;
        if !s.is_space() {
            return None;
        }
        let p = buf.next()?;
        if !p.is_pulse() {
            return None;
        }
        let sum = s.magnitude + p.magnitude;
        let widths = [
            (remote.pzero + remote.szero, 0u8),
            (remote.pone + remote.sone, 1u8),
            (remote.ptwo + remote.stwo, 2u8),
            (remote.pthree + remote.sthree, 3u8),
        ];
        let state = widths
            .into_iter()
            .find(|&(target, _)| is_within(sum, target, remote, driver_res))
            .map(|(_, s)| s)?;

        if state == 3 {
            code = (code << 2) | 0b00;
            emitted += 2;
            laststate = None;
            continue;
        }
        let Some(last) = laststate else {
            laststate = Some(state);
            continue;
        };
        let pair_bits = match (last, state) {
            (2, 0) => 0b01,
            (1, 1) => 0b10,
            (0, 2) => 0b11,
            _ => return None,
        };
        code = (code << 2) | pair_bits;
        emitted += 2;
        laststate = None;
    }
    Some(code)
}

/// Reads a baud-quantized edge stream one `bit_time`-sized unit at a
/// time, transparently refilling from the next buffered edge and
/// carrying over whatever magnitude is left unconsumed. A run of several
/// consecutive same-valued bits (and, crucially, a run that spans the
/// boundary between the last data/parity bit and the stop window, since
/// both are just "space" electrically) arrives from `ReceiveBuffer` as a
/// single coalesced edge; this reader is what lets the caller still peel
/// it off one bit-time at a time. Grounded in `receive.c`'s `is_serial`
/// branch, which tracks the same kind of leftover `pending` width across
/// calls; this is a simplified adaptation of that state machine rather
/// than a literal port (see DESIGN.md).
struct UnitReader<'a> {
    buf: &'a mut ReceiveBuffer,
    cur_is_pulse: Option<bool>,
    remaining_units: u32,
}

impl<'a> UnitReader<'a> {
    fn new(buf: &'a mut ReceiveBuffer) -> Self {
        UnitReader { buf, cur_is_pulse: None, remaining_units: 0 }
    }

    /// Consume one unit, refilling from the buffer when exhausted.
    /// Returns the polarity of the unit consumed (`true` = pulse).
    fn next_unit(&mut self, bit_time: u32) -> Option<bool> {
        if self.remaining_units == 0 {
            let d = self.buf.next()?;
            self.remaining_units = ((d.magnitude as f64 / bit_time as f64).round() as u32).max(1);
            self.cur_is_pulse = Some(d.is_pulse());
        }
        self.remaining_units -= 1;
        self.cur_is_pulse
    }
}

/// Baud-quantized UART-style framing, one byte at a time: a one-bit-time
/// pulse start bit, `bits_in_byte` data bits (space = 1, pulse = 0,
/// per `SPEC_FULL.md`'s serial wire convention), an optional parity bit,
/// and a `stop_bits`-wide (in half-bit-time units) space stop window.
fn decode_serial_bits(buf: &mut ReceiveBuffer, remote: &Remote, _driver_res: u32, bits: u32) -> Option<u64> {
    if remote.baud == 0 || remote.bits_in_byte == 0 || bits % remote.bits_in_byte != 0 {
        return None;
    }
    let bit_time = (1_000_000 / remote.baud).max(1);
    let has_parity = remote.parity != Parity::None;
    let mut reader = UnitReader::new(buf);
    let mut code = 0u64;
    let mut bit_no = 0usize;

    for _ in 0..(bits / remote.bits_in_byte) {
        let start_is_pulse = reader.next_unit(bit_time)?;
        if !start_is_pulse {
            Error::bad_timing("serial start bit");
            return None;
        }

        let mut byte_code = 0u64;
        let mut ones = 0u32;
        for _ in 0..remote.bits_in_byte {
            let is_pulse = reader.next_unit(bit_time)?;
            let bit = u64::from(!is_pulse);
            byte_code = (byte_code << 1) | bit;
            ones += bit as u32;
            bit_no += 1;
        }

        if has_parity {
            let parity_is_pulse = reader.next_unit(bit_time)?;
            let parity_bit = u32::from(!parity_is_pulse);
            let even = (ones + parity_bit) % 2 == 0;
            let ok = match remote.parity {
                Parity::Even => even,
                Parity::Odd => !even,
                Parity::None => true,
            };
            if !ok {
                Error::framing(bit_no);
                return None;
            }
            bit_no += 1;
        }

        // Stop window: `stop_bits` half-bit-time units, all space. A
        // trailing half-unit (the "1.5 stop bits" case) is narrower than
        // one quantization step and isn't separately checked.
        let mut stop_half_units = remote.stop_bits;
        while stop_half_units >= 2 {
            stop_half_units -= 2;
            let stop_is_pulse = reader.next_unit(bit_time)?;
            if stop_is_pulse {
                Error::framing(bit_no);
                return None;
            }
        }

        code = (code << remote.bits_in_byte) | byte_code;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RemoteDatabase;
    use crate::remote::RemoteFlags;
    use crate::transmit::encode_once;

    fn space_enc_remote() -> Remote {
        let mut r = Remote::new("living_room");
        r.flags = RemoteFlags::SPACE_ENC;
        r.bits = 8;
        r.pone = 560;
        r.sone = 1690;
        r.pzero = 560;
        r.szero = 560;
        r.phead = 9000;
        r.shead = 4500;
        r.pfoot = 560;
        r.gap = 108000;
        r.codes.push(IrNcode::new("KEY_POWER", 0xA5));
        r.codes.push(IrNcode::new("KEY_VOLUP", 0x5A));
        r
    }

    fn push_frame(buf: &mut ReceiveBuffer, frame: &[u32]) {
        for (i, &v) in frame.iter().enumerate() {
            if i % 2 == 0 {
                buf.push_pulse(v);
            } else {
                buf.push_space(v);
            }
        }
        buf.flush();
    }

    #[test]
    fn decodes_space_enc_button_round_trip() {
        let remote = space_enc_remote();
        let code = remote.code_by_name("KEY_POWER").unwrap().clone();
        let frame = encode_once(&remote, &code, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode");
        assert_eq!(decoded.remote, "living_room");
        assert_eq!(decoded.button, "KEY_POWER");
        assert_eq!(decoded.scancode, 0xA5);
        assert_eq!(decoded.repeat, 0);
    }

    #[test]
    fn ignore_mask_bits_do_not_affect_button_lookup() {
        let mut remote = space_enc_remote();
        remote.ignore_mask = 0x01;
        let registered = remote.code_by_name("KEY_POWER").unwrap().clone();

        // Differs from the registered 0xA5 only in the ignored low bit.
        let noisy = IrNcode::new("KEY_POWER", registered.code ^ 0x01);
        let frame = encode_once(&remote, &noisy, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);
        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode despite ignored bit");
        assert_eq!(decoded.button, "KEY_POWER");
        assert_eq!(decoded.scancode, registered.code);
    }

    #[test]
    fn second_identical_frame_increments_repeat() {
        let remote = space_enc_remote();
        let code = remote.code_by_name("KEY_VOLUP").unwrap().clone();
        let frame = encode_once(&remote, &code, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let first = decode(&mut buf, &mut db, &DecodeOptions::default()).unwrap();
        assert_eq!(first.repeat, 0);
        let second = decode(&mut buf, &mut db, &DecodeOptions::default()).unwrap();
        assert_eq!(second.repeat, 1);
    }

    #[test]
    fn rc5_round_trip() {
        let mut r = Remote::new("rc5_remote");
        r.flags = RemoteFlags::RC5;
        r.bits = 13;
        r.pone = 889;
        r.sone = 889;
        r.gap = 113960;
        r.codes.push(IrNcode::new("KEY_A", 0x1041));

        let code = r.codes[0].clone();
        let frame = encode_once(&r, &code, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![r]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode");
        assert_eq!(decoded.scancode, 0x1041);
    }

    #[test]
    fn raw_round_trip() {
        let mut r = Remote::new("raw_remote");
        r.flags = RemoteFlags::RAW_CODES;
        r.gap = 100000;
        r.codes.push(IrNcode::with_raw_signals("KEY_A", vec![100, 200, 300]));

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &[100, 200, 300]);

        let mut db = RemoteDatabase::from_remotes(vec![r]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode");
        assert_eq!(decoded.button, "KEY_A");
    }

    #[test]
    fn unknown_code_is_dropped_without_dynamic_codes() {
        let remote = space_enc_remote();
        let mut bogus = remote.codes[0].clone();
        bogus.code = 0xFF;
        let frame = encode_once(&remote, &bogus, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        assert!(decode(&mut buf, &mut db, &DecodeOptions::default()).is_none());
    }

    #[test]
    fn unknown_code_is_registered_when_dynamic_codes_enabled() {
        let remote = space_enc_remote();
        let mut bogus = remote.codes[0].clone();
        bogus.code = 0xFF;
        let frame = encode_once(&remote, &bogus, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let opts = DecodeOptions { dynamic_codes: true, ..Default::default() };
        let decoded = decode(&mut buf, &mut db, &opts).expect("should decode dynamically");
        assert_eq!(decoded.scancode, 0xFF);
        assert_eq!(decoded.button, "FF");
    }

    #[test]
    fn hardware_repeat_frame_extends_last_button() {
        let mut remote = space_enc_remote();
        remote.prepeat = 9000;
        remote.srepeat = 2250;
        let code = remote.code_by_name("KEY_POWER").unwrap().clone();
        let first_frame = encode_once(&remote, &code, false).unwrap();
        let repeat_frame = encode_once(&remote, &code, true).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &first_frame);
        push_frame(&mut buf, &repeat_frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let first = decode(&mut buf, &mut db, &DecodeOptions::default()).unwrap();
        assert_eq!(first.repeat, 0);
        let second = decode(&mut buf, &mut db, &DecodeOptions::default()).unwrap();
        assert_eq!(second.button, "KEY_POWER");
        assert_eq!(second.repeat, 1);
    }

    fn grundig_remote() -> Remote {
        let mut r = Remote::new("grundig_remote");
        r.flags = RemoteFlags::GRUNDIG;
        r.eps = 0;
        r.aeps = 5;
        r.pzero = 100;
        r.szero = 50; // 2T = 150
        r.pone = 200;
        r.sone = 100; // 3T = 300
        r.ptwo = 300;
        r.stwo = 150; // 4T = 450
        r.pthree = 600;
        r.sthree = 300; // 6T = 900
        r
    }

    #[test]
    fn grundig_lone_6t_symbol_emits_00() {
        let remote = grundig_remote();
        let mut buf = ReceiveBuffer::new();
        buf.push_space(300);
        buf.push_pulse(600);
        buf.flush();
        let code = read_grundig_bits(&mut buf, &remote, 0, 2).expect("decodes");
        assert_eq!(code, 0b00);
    }

    #[test]
    fn grundig_symbol_pairs_decode_to_the_expected_two_bit_values() {
        let remote = grundig_remote();
        // 4T, 2T -> 0b01
        let mut buf = ReceiveBuffer::new();
        buf.push_space(150);
        buf.push_pulse(300);
        buf.push_space(50);
        buf.push_pulse(100);
        buf.flush();
        assert_eq!(read_grundig_bits(&mut buf, &remote, 0, 2).unwrap(), 0b01);

        // 3T, 3T -> 0b10
        let mut buf = ReceiveBuffer::new();
        buf.push_space(100);
        buf.push_pulse(200);
        buf.push_space(100);
        buf.push_pulse(200);
        buf.flush();
        assert_eq!(read_grundig_bits(&mut buf, &remote, 0, 2).unwrap(), 0b10);

        // 2T, 4T -> 0b11
        let mut buf = ReceiveBuffer::new();
        buf.push_space(50);
        buf.push_pulse(100);
        buf.push_space(150);
        buf.push_pulse(300);
        buf.flush();
        assert_eq!(read_grundig_bits(&mut buf, &remote, 0, 2).unwrap(), 0b11);
    }

    #[test]
    fn grundig_invalid_pair_fails() {
        let remote = grundig_remote();
        // 2T, 3T isn't one of the valid pairings.
        let mut buf = ReceiveBuffer::new();
        buf.push_space(50);
        buf.push_pulse(100);
        buf.push_space(100);
        buf.push_pulse(200);
        buf.flush();
        assert!(read_grundig_bits(&mut buf, &remote, 0, 2).is_none());
    }

    #[test]
    fn grundig_odd_bit_count_is_rejected() {
        let remote = grundig_remote();
        let mut buf = ReceiveBuffer::new();
        assert!(read_grundig_bits(&mut buf, &remote, 0, 3).is_none());
    }

    #[test]
    fn the_internal_lirc_remote_never_false_matches_a_real_frame() {
        let remote = space_enc_remote();
        let code = remote.code_by_name("KEY_POWER").unwrap().clone();
        let frame = encode_once(&remote, &code, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode");
        assert_eq!(decoded.remote, "living_room");
        assert_ne!(decoded.remote, crate::database::INTERNAL_REMOTE_NAME);
    }

    #[test]
    fn genuine_driver_eof_is_reported_once_the_buffer_is_drained() {
        let remote = space_enc_remote();
        let mut buf = ReceiveBuffer::new();
        buf.note_terminal(crate::duration::Edge::Timeout);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should report EOF");
        assert_eq!(decoded.remote, crate::database::INTERNAL_REMOTE_NAME);
        assert_eq!(decoded.button, crate::database::EOF_CODE_NAME);
    }

    #[test]
    fn a_partial_frame_suppresses_the_eof_report() {
        let remote = space_enc_remote();
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(9000); // half a header, frame not finished
        buf.note_terminal(crate::duration::Edge::Timeout);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        assert!(decode(&mut buf, &mut db, &DecodeOptions::default()).is_none());
    }

    #[test]
    fn toggle_mask_is_folded_into_the_code_when_state_is_odd() {
        let mut remote = space_enc_remote();
        remote.toggle_mask = 0x0F;
        remote.runtime.toggle_mask_state = ToggleState::FirstHalf;
        let code = remote.code_by_name("KEY_POWER").unwrap().clone();
        let folded = IrNcode::new("folded", code.code ^ remote.toggle_mask);
        let frame = encode_once(&remote, &folded, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);
        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode via toggle_mask fold");
        assert_eq!(decoded.button, "KEY_POWER");
    }

    #[test]
    fn repeat_mask_xor_is_tried_as_a_fallback_match() {
        let mut remote = space_enc_remote();
        remote.repeat_mask = 0xFF;
        let code = remote.code_by_name("KEY_POWER").unwrap().clone();
        let inverted = IrNcode::new("inverted", code.code ^ remote.repeat_mask);
        let frame = encode_once(&remote, &inverted, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);
        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode via repeat_mask fallback");
        assert_eq!(decoded.button, "KEY_POWER");
    }

    #[test]
    fn chain_successor_code_is_matched_when_primary_lookup_misses() {
        let mut remote = space_enc_remote();
        let mut power = remote.codes[0].clone();
        power.chain.successors.push(0x77);
        remote.codes[0] = power;

        let successor = IrNcode::new("successor_frame", 0x77);
        let frame = encode_once(&remote, &successor, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);
        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode via chain successor");
        assert_eq!(decoded.button, "KEY_POWER");
    }

    #[test]
    fn repeat_count_resets_when_gap_exceeds_max_remaining_gap() {
        let remote = space_enc_remote();
        let code = remote.code_by_name("KEY_VOLUP").unwrap().clone();
        let frame = encode_once(&remote, &code, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![remote]);
        let first = decode(&mut buf, &mut db, &DecodeOptions::default()).unwrap();
        assert_eq!(first.repeat, 0);

        if let Some(r) = db.get_mut("living_room") {
            r.runtime.last_send = Some(std::time::Instant::now() - std::time::Duration::from_secs(1));
        }
        let second = decode(&mut buf, &mut db, &DecodeOptions::default()).unwrap();
        assert_eq!(second.repeat, 0, "a press after a long gap is not a repeat");
    }

    #[test]
    fn xmp_round_trip() {
        let mut r = Remote::new("xmp_remote");
        r.flags = RemoteFlags::XMP;
        r.bits = 8;
        r.pzero = 210;
        r.szero = 210;
        r.sone = 210;
        r.phead = 210;
        r.shead = 3780;
        r.gap = 130000;
        r.codes.push(IrNcode::new("KEY_A", 0xAB));

        let code = r.codes[0].clone();
        let frame = encode_once(&r, &code, false).unwrap();

        let mut buf = ReceiveBuffer::new();
        push_frame(&mut buf, &frame);

        let mut db = RemoteDatabase::from_remotes(vec![r]);
        let decoded = decode(&mut buf, &mut db, &DecodeOptions::default()).expect("should decode");
        assert_eq!(decoded.scancode, 0xAB);
    }

    fn serial_remote() -> Remote {
        let mut r = Remote::new("serial_remote");
        r.flags = RemoteFlags::SERIAL;
        r.baud = 1000;
        r.bits_in_byte = 8;
        r.stop_bits = 2;
        r.bits = 8;
        r
    }

    #[test]
    fn serial_decodes_a_single_byte_with_a_coalesced_trailing_stop() {
        let remote = serial_remote();
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(1000); // start
        buf.push_space(3000); // data bits 1,1,1
        buf.push_pulse(3000); // data bits 0,0,0
        buf.push_space(3000); // data bits 1,1, then the stop window (same polarity)
        buf.flush();
        let code = decode_serial_bits(&mut buf, &remote, 0, 8).expect("decodes");
        assert_eq!(code, 0xE3);
    }

    #[test]
    fn serial_even_parity_checks_out() {
        let mut remote = serial_remote();
        remote.parity = Parity::Even;
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(1000); // start
        buf.push_space(1000); // data bit 1 (MSB)
        buf.push_pulse(7000); // data bits 0000000
        buf.push_space(2000); // parity bit 1, then the stop window
        buf.flush();
        let code = decode_serial_bits(&mut buf, &remote, 0, 8).expect("decodes");
        assert_eq!(code, 0x80);
    }

    #[test]
    fn serial_even_parity_mismatch_is_rejected() {
        let mut remote = serial_remote();
        remote.parity = Parity::Even;
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(1000); // start
        buf.push_space(1000); // data bit 1 (MSB)
        buf.push_pulse(7000); // data bits 0000000
        buf.push_pulse(1000); // wrong-polarity parity bit (coalesces with the data run)
        buf.push_space(1000); // stop
        buf.flush();
        assert!(decode_serial_bits(&mut buf, &remote, 0, 8).is_none());
    }

    #[test]
    fn serial_stop_window_violation_is_rejected() {
        let remote = serial_remote();
        let mut buf = ReceiveBuffer::new();
        buf.push_pulse(1000); // start
        buf.push_space(4000); // data bits 1,1,1,1
        buf.push_pulse(4000); // data bits 0,0,0,0
        buf.push_pulse(1000); // stop window wrongly carries a pulse (coalesces with the data run)
        buf.flush();
        assert!(decode_serial_bits(&mut buf, &remote, 0, 8).is_none());
    }
}
