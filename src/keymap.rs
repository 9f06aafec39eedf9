//! Keymap data model and the low-level BPF-style pulse generators
//! (component H): a scancode-to-keycode table plus the three generic
//! encoder shapes (pulse-distance, pulse-length, Manchester) that most
//! consumer-IR protocols reduce to.
//!
//! Grounded in `keymap.h`'s `struct keymap`/`struct protocol_param`/
//! `struct scancode_entry`/`struct raw_entry`, and `bpf_encoder.c`'s
//! `encode_pulse_distance`/`encode_pulse_length`/`encode_manchester`
//! default parameter tables.

/// One named parameter in a protocol's BPF encoder parameter block, e.g.
/// `header-pulse`, `bit-pulse`, `one-space`. Mirrors `struct
/// protocol_param`'s `name`/`value` pair.
#[derive(Debug, Clone)]
pub struct ProtocolParam {
    pub name: String,
    pub value: i64,
}

/// A single scancode-to-keycode mapping entry, optionally carrying a
/// repeat-period hint. Mirrors `struct scancode_entry`.
#[derive(Debug, Clone)]
pub struct ScancodeEntry {
    pub scancode: u64,
    pub keycode: String,
}

/// A raw pulse/space table entry, for keymaps that specify buttons by
/// exact signal rather than by decoded scancode. Mirrors `struct
/// raw_entry`.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub keycode: String,
    pub signals: Vec<u32>,
}

/// A keymap: a protocol name, the BPF-style parameters needed to
/// encode/decode it, and its button table (scancode-keyed, raw-keyed, or
/// both). Mirrors `struct keymap`.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    pub protocol: String,
    pub params: Vec<ProtocolParam>,
    pub scancodes: Vec<ScancodeEntry>,
    pub raw: Vec<RawEntry>,
}

impl Keymap {
    pub fn new(protocol: impl Into<String>) -> Self {
        Keymap {
            protocol: protocol.into(),
            params: Vec::new(),
            scancodes: Vec::new(),
            raw: Vec::new(),
        }
    }

    /// Looks up a named parameter, mirroring `keymap_param(map, name,
    /// default)`'s override-or-default behavior (the caller supplies the
    /// default since this function only knows about explicit overrides).
    pub fn param(&self, name: &str) -> Option<i64> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }

    fn param_or(&self, name: &str, default: i64) -> i64 {
        self.param(name).unwrap_or(default)
    }

    pub fn keycode_for(&self, scancode: u64) -> Option<&str> {
        self.scancodes.iter().find(|e| e.scancode == scancode).map(|e| e.keycode.as_str())
    }
}

/// Parameters for a pulse-distance encoding: bit value is carried by
/// space width (long space = 1, short space = 0), pulse width constant.
/// Defaults match `bpf_encoder.c`'s `encode_pulse_distance` table.
#[derive(Debug, Clone, Copy)]
pub struct PulseDistanceParams {
    pub header_pulse: u32,
    pub header_space: u32,
    pub bits: u32,
    pub bit_pulse: u32,
    pub bit_0_space: u32,
    pub bit_1_space: u32,
    pub trailer_pulse: u32,
    pub reverse: bool,
}

impl Default for PulseDistanceParams {
    fn default() -> Self {
        PulseDistanceParams {
            header_pulse: 2_125,
            header_space: 1_875,
            bits: 4,
            bit_pulse: 625,
            bit_0_space: 375,
            bit_1_space: 1_625,
            trailer_pulse: 625,
            reverse: false,
        }
    }
}

impl PulseDistanceParams {
    /// Builds a parameter set from a keymap's `protocol_param` table,
    /// falling back to the defaults above for anything not overridden.
    pub fn from_keymap(keymap: &Keymap) -> Self {
        let d = Self::default();
        PulseDistanceParams {
            header_pulse: keymap.param_or("header_pulse", d.header_pulse as i64) as u32,
            header_space: keymap.param_or("header_space", d.header_space as i64) as u32,
            bits: keymap.param_or("bits", d.bits as i64) as u32,
            bit_pulse: keymap.param_or("bit_pulse", d.bit_pulse as i64) as u32,
            bit_0_space: keymap.param_or("bit_0_space", d.bit_0_space as i64) as u32,
            bit_1_space: keymap.param_or("bit_1_space", d.bit_1_space as i64) as u32,
            trailer_pulse: keymap.param_or("trailer_pulse", d.trailer_pulse as i64) as u32,
            reverse: keymap.param_or("reverse", 0) != 0,
        }
    }
}

/// Encodes `scancode`'s low `params.bits` bits as a pulse-distance
/// stream: `header_pulse, header_space`, then one `bit_pulse,
/// bit_space` pair per bit (MSB-first unless `reverse` is set), then a
/// trailing `trailer_pulse`.
///
/// Output length is always `2 + 2*bits + 1`, i.e. odd: the trailer is
/// unconditional in the original encoder, unlike its doc comment's
/// claim that pulse-distance output is even-length (see `DESIGN.md`).
pub fn encode_pulse_distance(params: &PulseDistanceParams, scancode: u64) -> Vec<u32> {
    let bits = params.bits;
    let mut out = Vec::with_capacity(2 + bits as usize * 2 + 1);
    out.push(params.header_pulse);
    out.push(params.header_space);

    let order: Box<dyn Iterator<Item = u32>> = if params.reverse {
        Box::new(0..bits)
    } else {
        Box::new((0..bits).rev())
    };
    for i in order {
        out.push(params.bit_pulse);
        out.push(if (scancode >> i) & 1 != 0 { params.bit_1_space } else { params.bit_0_space });
    }
    out.push(params.trailer_pulse);
    out
}

/// Parameters for a pulse-length encoding: bit value is carried by
/// pulse width (long pulse = 1, short pulse = 0), space width constant.
/// Defaults match `bpf_encoder.c`'s `encode_pulse_length` table.
#[derive(Debug, Clone, Copy)]
pub struct PulseLengthParams {
    pub header_pulse: u32,
    pub header_space: u32,
    pub bits: u32,
    pub bit_0_pulse: u32,
    pub bit_1_pulse: u32,
    pub bit_space: u32,
    pub reverse: bool,
}

impl Default for PulseLengthParams {
    fn default() -> Self {
        PulseLengthParams {
            header_pulse: 2_125,
            header_space: 1_875,
            bits: 4,
            bit_0_pulse: 375,
            bit_1_pulse: 1_625,
            bit_space: 625,
            reverse: false,
        }
    }
}

impl PulseLengthParams {
    pub fn from_keymap(keymap: &Keymap) -> Self {
        let d = Self::default();
        PulseLengthParams {
            header_pulse: keymap.param_or("header_pulse", d.header_pulse as i64) as u32,
            header_space: keymap.param_or("header_space", d.header_space as i64) as u32,
            bits: keymap.param_or("bits", d.bits as i64) as u32,
            bit_0_pulse: keymap.param_or("bit_0_pulse", d.bit_0_pulse as i64) as u32,
            bit_1_pulse: keymap.param_or("bit_1_pulse", d.bit_1_pulse as i64) as u32,
            bit_space: keymap.param_or("bit_space", d.bit_space as i64) as u32,
            reverse: keymap.param_or("reverse", 0) != 0,
        }
    }
}

/// Encodes `scancode`'s low `params.bits` bits as a pulse-length
/// stream: `header_pulse, header_space`, then one `bit_pulse,
/// bit_space` pair per bit (MSB-first unless `reverse` is set), with
/// the final `bit_space` dropped so the stream ends on a pulse.
pub fn encode_pulse_length(params: &PulseLengthParams, scancode: u64) -> Vec<u32> {
    let bits = params.bits;
    let mut out = Vec::with_capacity(2 + bits as usize * 2);
    out.push(params.header_pulse);
    out.push(params.header_space);

    let order: Box<dyn Iterator<Item = u32>> = if params.reverse {
        Box::new(0..bits)
    } else {
        Box::new((0..bits).rev())
    };
    for i in order {
        out.push(if (scancode >> i) & 1 != 0 { params.bit_1_pulse } else { params.bit_0_pulse });
        out.push(params.bit_space);
    }
    out.pop();
    out
}

/// Parameters for a Manchester/bi-phase encoding: bit value is carried
/// by transition direction within independently-sized pulse/space
/// halves. Defaults match `bpf_encoder.c`'s `encode_manchester` table.
#[derive(Debug, Clone, Copy)]
pub struct ManchesterParams {
    pub header_pulse: u32,
    pub header_space: u32,
    pub bits: u32,
    pub one_pulse: u32,
    pub one_space: u32,
    pub zero_pulse: u32,
    pub zero_space: u32,
}

impl Default for ManchesterParams {
    fn default() -> Self {
        ManchesterParams {
            header_pulse: 0,
            header_space: 0,
            bits: 14,
            one_pulse: 888,
            one_space: 888,
            zero_pulse: 888,
            zero_space: 888,
        }
    }
}

impl ManchesterParams {
    pub fn from_keymap(keymap: &Keymap) -> Self {
        let d = Self::default();
        ManchesterParams {
            header_pulse: keymap.param_or("header_pulse", d.header_pulse as i64) as u32,
            header_space: keymap.param_or("header_space", d.header_space as i64) as u32,
            bits: keymap.param_or("bits", d.bits as i64) as u32,
            one_pulse: keymap.param_or("one_pulse", d.one_pulse as i64) as u32,
            one_space: keymap.param_or("one_space", d.one_space as i64) as u32,
            zero_pulse: keymap.param_or("zero_pulse", d.zero_pulse as i64) as u32,
            zero_space: keymap.param_or("zero_space", d.zero_space as i64) as u32,
        }
    }
}

/// Merges a same-polarity edge into the buffer at a parity-indexed
/// position: `manchester_advance_pulse` writes to even positions,
/// `manchester_advance_space` to odd ones, accumulating in place when
/// the cursor is already parked on a matching slot and opening a new
/// slot otherwise. This is the same pending-pulse/pending-space
/// coalescing idiom used by the ring receive buffer and the transmit
/// buffer, here applied to a plain growable buffer instead of a ring.
fn manchester_advance_pulse(buf: &mut Vec<u32>, cursor: &mut usize, length: u32) {
    if *cursor % 2 == 1 {
        *cursor += 1;
        if buf.len() <= *cursor {
            buf.resize(*cursor + 1, 0);
        }
        buf[*cursor] = length;
    } else {
        if buf.is_empty() {
            buf.push(0);
        }
        buf[*cursor] += length;
    }
}

fn manchester_advance_space(buf: &mut Vec<u32>, cursor: &mut usize, length: u32) {
    if *cursor % 2 == 1 {
        if buf.is_empty() {
            buf.push(0);
        }
        buf[*cursor] += length;
    } else {
        *cursor += 1;
        if buf.len() <= *cursor {
            buf.resize(*cursor + 1, 0);
        }
        buf[*cursor] = length;
    }
}

/// Encodes `scancode`'s low `params.bits` bits as a Manchester/bi-phase
/// stream. A `1` bit advances a pulse half then a space half; a `0` bit
/// advances a space half then a pulse half; the header (if
/// `header_pulse > 0`) is emitted first as its own pulse/space pair.
/// The result is trimmed to end on a pulse, dropping a trailing space.
pub fn encode_manchester(params: &ManchesterParams, scancode: u64) -> Vec<u32> {
    let mut buf: Vec<u32> = Vec::new();
    let mut cursor: usize = 0;

    if params.header_pulse > 0 {
        manchester_advance_pulse(&mut buf, &mut cursor, params.header_pulse);
        manchester_advance_space(&mut buf, &mut cursor, params.header_space);
    }

    for i in (0..params.bits).rev() {
        if (scancode >> i) & 1 != 0 {
            manchester_advance_pulse(&mut buf, &mut cursor, params.one_pulse);
            manchester_advance_space(&mut buf, &mut cursor, params.one_space);
        } else {
            manchester_advance_space(&mut buf, &mut cursor, params.zero_space);
            manchester_advance_pulse(&mut buf, &mut cursor, params.zero_pulse);
        }
    }

    let keep = if cursor % 2 == 1 { cursor } else { cursor + 1 };
    buf.truncate(keep);
    buf
}

/// Dispatches to the matching generic encoder by `keymap.protocol`
/// name, or returns `None` if the keymap names a protocol this module
/// doesn't know how to generate (e.g. a fixed-parameter family handled
/// instead by `crate::protocols`). Mirrors `encode_bpf_protocol`.
pub fn encode_bpf_protocol(keymap: &Keymap, scancode: u64) -> Option<Vec<u32>> {
    match keymap.protocol.as_str() {
        "pulse_distance" => Some(encode_pulse_distance(&PulseDistanceParams::from_keymap(keymap), scancode)),
        "pulse_length" => Some(encode_pulse_length(&PulseLengthParams::from_keymap(keymap), scancode)),
        "manchester" => Some(encode_manchester(&ManchesterParams::from_keymap(keymap), scancode)),
        _ => None,
    }
}
