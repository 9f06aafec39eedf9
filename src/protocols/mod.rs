//! Fixed-parameter protocol family codecs (component G): ready-made
//! [`Remote`] timing templates for the well-known consumer-IR protocols
//! that don't need a config-file entry to describe their bit timings —
//! NEC and its variants, JVC, Sanyo, Sharp, Sony, RC-5 and its variants,
//! RC-6 and its variants, and the Xbox-DVD remote.
//!
//! Grounded in `ir-encode.c`'s `protocols[]` table: each entry there pairs
//! a protocol name with `scancode_mask`/`max_edges`/carrier and a pulse
//! generator; [`preset`] is the typed equivalent, returning a [`Remote`]
//! scaffold (no buttons yet) that callers populate via
//! [`Remote::codes`].

use crate::remote::{Remote, RemoteFlags};

/// The fixed, kernel-assigned protocol identifiers a hardware decoder
/// reports over the packed driver wire format, mirroring `enum rc_proto`
/// in `original_source/liblircd/src/lirc.h` discriminant-for-discriminant
/// (`RC_PROTO_UNKNOWN` through `RC_PROTO_XBOX_DVD`). A software-side
/// `Driver::decode_func` override that hands decoding off to an in-kernel
/// BPF decoder reports its result as one of these rather than a
/// `ProtocolFamily`, since a single `ProtocolFamily` (e.g. `Rc6`) covers
/// several of these distinct fixed variants (mode 0 vs. the three 6A bit
/// widths vs. MCE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FixedProtocol {
    Unknown = 0,
    Other = 1,
    Rc5 = 2,
    Rc5x20 = 3,
    Rc5Sz = 4,
    Jvc = 5,
    Sony12 = 6,
    Sony15 = 7,
    Sony20 = 8,
    Nec = 9,
    Necx = 10,
    Nec32 = 11,
    Sanyo = 12,
    Mcir2Kbd = 13,
    Mcir2Mse = 14,
    Rc60 = 15,
    Rc66a20 = 16,
    Rc66a24 = 17,
    Rc66a32 = 18,
    Rc6Mce = 19,
    Sharp = 20,
    Xmp = 21,
    Cec = 22,
    Imon = 23,
    RcMm12 = 24,
    RcMm24 = 25,
    RcMm32 = 26,
    XboxDvd = 27,
}

impl FixedProtocol {
    /// The tolerant protocol-family name this identifier corresponds to,
    /// usable with [`preset`] and [`canonicalize_scancode`].
    pub fn name(self) -> &'static str {
        match self {
            FixedProtocol::Unknown => "unknown",
            FixedProtocol::Other => "other",
            FixedProtocol::Rc5 => "rc5",
            FixedProtocol::Rc5x20 => "rc5x_20",
            FixedProtocol::Rc5Sz => "rc5_sz",
            FixedProtocol::Jvc => "jvc",
            FixedProtocol::Sony12 => "sony12",
            FixedProtocol::Sony15 => "sony15",
            FixedProtocol::Sony20 => "sony20",
            FixedProtocol::Nec => "nec",
            FixedProtocol::Necx => "necx",
            FixedProtocol::Nec32 => "nec32",
            FixedProtocol::Sanyo => "sanyo",
            FixedProtocol::Mcir2Kbd => "mcir2-kbd",
            FixedProtocol::Mcir2Mse => "mcir2-mse",
            FixedProtocol::Rc60 => "rc6_0",
            FixedProtocol::Rc66a20 => "rc6_6a_20",
            FixedProtocol::Rc66a24 => "rc6_6a_24",
            FixedProtocol::Rc66a32 => "rc6_6a_32",
            FixedProtocol::Rc6Mce => "rc6_mce",
            FixedProtocol::Sharp => "sharp",
            FixedProtocol::Xmp => "xmp",
            FixedProtocol::Cec => "cec",
            FixedProtocol::Imon => "imon",
            FixedProtocol::RcMm12 => "rc-mm-12",
            FixedProtocol::RcMm24 => "rc-mm-24",
            FixedProtocol::RcMm32 => "rc-mm-32",
            FixedProtocol::XboxDvd => "xbox-dvd",
        }
    }
}

/// Static metadata paired with each preset: the information carried by
/// `ir-encode.c`'s `struct ir_protocol` alongside the pulse generator
/// itself.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolInfo {
    pub name: &'static str,
    pub carrier_hz: u32,
    pub scancode_mask: u64,
    pub max_edges: u32,
}

const NEC_CARRIER: u32 = 38_000;
const SONY_CARRIER: u32 = 40_000;
const RC5_CARRIER: u32 = 36_000;
const RC6_CARRIER: u32 = 36_000;
const SHARP_CARRIER: u32 = 38_000;
const JVC_CARRIER: u32 = 38_000;
const SANYO_CARRIER: u32 = 38_000;

fn nec_like(name: &'static str, carrier: u32, bits: u32, unit: u32) -> (Remote, ProtocolInfo) {
    let mut r = Remote::new(name);
    r.flags = RemoteFlags::SPACE_ENC;
    r.bits = bits;
    r.freq = carrier;
    r.phead = unit * 16;
    r.shead = unit * 8;
    r.pone = unit;
    r.sone = unit * 3;
    r.pzero = unit;
    r.szero = unit;
    r.pfoot = unit;
    r.min_repeat = 0;
    (
        r,
        ProtocolInfo {
            name,
            carrier_hz: carrier,
            scancode_mask: crate::duration::gen_mask(bits),
            max_edges: 2 + bits * 2 + 1,
        },
    )
}

/// Standard NEC: 32-bit (8-bit address + complement, 8-bit command +
/// complement), 562.5 us unit.
pub fn nec() -> (Remote, ProtocolInfo) {
    let (mut r, info) = nec_like("NEC", NEC_CARRIER, 32, 562);
    r.gap = 108_000;
    (r, info)
}

/// NECX: like NEC but without the address-complement redundancy (16-bit
/// address, 16-bit command).
pub fn necx() -> (Remote, ProtocolInfo) {
    let (mut r, info) = nec_like("NECX", NEC_CARRIER, 32, 562);
    r.gap = 108_000;
    (r, info)
}

/// NEC32: full 32-bit payload with no complement redundancy at all.
pub fn nec32() -> (Remote, ProtocolInfo) {
    let (mut r, info) = nec_like("NEC32", NEC_CARRIER, 32, 562);
    r.gap = 108_000;
    (r, info)
}

/// JVC: 16-bit payload, 525 us unit; the header is only sent once and
/// repeats omit it.
pub fn jvc() -> (Remote, ProtocolInfo) {
    let mut r = Remote::new("JVC");
    r.flags = RemoteFlags::SPACE_ENC | RemoteFlags::NO_HEAD_REP;
    r.bits = 16;
    r.freq = JVC_CARRIER;
    r.phead = 8_400;
    r.shead = 4_200;
    r.pone = 525;
    r.sone = 525 * 3;
    r.pzero = 525;
    r.szero = 525;
    r.pfoot = 525;
    r.gap = 55_000;
    (
        r,
        ProtocolInfo {
            name: "JVC",
            carrier_hz: JVC_CARRIER,
            scancode_mask: crate::duration::gen_mask(16),
            max_edges: 36,
        },
    )
}

/// Sanyo: 5-bit address + 13-bit command, 562.5 us unit.
pub fn sanyo() -> (Remote, ProtocolInfo) {
    let mut r = Remote::new("Sanyo");
    r.flags = RemoteFlags::SPACE_ENC;
    r.bits = 18;
    r.freq = SANYO_CARRIER;
    r.phead = 8_500;
    r.shead = 4_250;
    r.pone = 562;
    r.sone = 562 * 3;
    r.pzero = 562;
    r.szero = 562;
    r.pfoot = 562;
    r.gap = 108_000;
    (
        r,
        ProtocolInfo {
            name: "Sanyo",
            carrier_hz: SANYO_CARRIER,
            scancode_mask: crate::duration::gen_mask(18),
            max_edges: 40,
        },
    )
}

/// Sharp: 15-bit payload (5-bit address, 8-bit command, 2 check bits),
/// 40 us unit.
pub fn sharp() -> (Remote, ProtocolInfo) {
    let mut r = Remote::new("Sharp");
    r.flags = RemoteFlags::SPACE_ENC;
    r.bits = 15;
    r.freq = SHARP_CARRIER;
    r.pone = 40 * 8;
    r.sone = 40 * 16;
    r.pzero = 40 * 8;
    r.szero = 40 * 8;
    r.gap = 125_000;
    (
        r,
        ProtocolInfo {
            name: "Sharp",
            carrier_hz: SHARP_CARRIER,
            scancode_mask: crate::duration::gen_mask(15),
            max_edges: 32,
        },
    )
}

fn sony(name: &'static str, bits: u32) -> (Remote, ProtocolInfo) {
    let mut r = Remote::new(name);
    r.flags = RemoteFlags::SPACE_ENC;
    r.bits = bits;
    r.freq = SONY_CARRIER;
    r.phead = 2_400;
    r.shead = 600;
    r.pone = 1_200;
    r.sone = 600;
    r.pzero = 600;
    r.szero = 600;
    r.min_repeat = 2;
    r.gap = 45_000;
    (
        r,
        ProtocolInfo {
            name,
            carrier_hz: SONY_CARRIER,
            scancode_mask: crate::duration::gen_mask(bits),
            max_edges: 2 + bits * 2,
        },
    )
}

pub fn sony12() -> (Remote, ProtocolInfo) {
    sony("Sony12", 12)
}

pub fn sony15() -> (Remote, ProtocolInfo) {
    sony("Sony15", 15)
}

pub fn sony20() -> (Remote, ProtocolInfo) {
    sony("Sony20", 20)
}

fn rc5_like(name: &'static str, bits: u32) -> (Remote, ProtocolInfo) {
    let mut r = Remote::new(name);
    r.flags = RemoteFlags::RC5;
    r.bits = bits;
    r.freq = RC5_CARRIER;
    r.pone = 889;
    r.sone = 889;
    r.gap = 113_960;
    (
        r,
        ProtocolInfo {
            name,
            carrier_hz: RC5_CARRIER,
            scancode_mask: crate::duration::gen_mask(bits),
            max_edges: bits * 2,
        },
    )
}

pub fn rc5() -> (Remote, ProtocolInfo) {
    rc5_like("RC5", 13)
}

/// RC-5X: RC-5 with an extended 6-bit command field.
pub fn rc5x() -> (Remote, ProtocolInfo) {
    rc5_like("RC5X", 14)
}

/// RC-5-SZ: the 20-bit Schwaiger-variant RC-5 encoding.
pub fn rc5_sz() -> (Remote, ProtocolInfo) {
    rc5_like("RC5-SZ", 20)
}

fn rc6_like(name: &'static str, bits: u32, rc6_mask: u64) -> (Remote, ProtocolInfo) {
    let mut r = Remote::new(name);
    r.flags = RemoteFlags::RC6;
    r.bits = bits;
    r.freq = RC6_CARRIER;
    r.phead = 2_666;
    r.shead = 889;
    r.pone = 444;
    r.sone = 444;
    r.rc6_mask = rc6_mask;
    r.gap = 2_666;
    (
        r,
        ProtocolInfo {
            name,
            carrier_hz: RC6_CARRIER,
            scancode_mask: crate::duration::gen_mask(bits),
            max_edges: bits * 2 + 4,
        },
    )
}

/// RC-6 mode 0: 16-bit payload, toggle bit double-width.
pub fn rc6_0() -> (Remote, ProtocolInfo) {
    rc6_like("RC6-0", 16, 0x10)
}

pub fn rc6_6a_20() -> (Remote, ProtocolInfo) {
    rc6_like("RC6-6A-20", 20, 0x10_0000)
}

pub fn rc6_6a_24() -> (Remote, ProtocolInfo) {
    rc6_like("RC6-6A-24", 24, 0x100_0000)
}

pub fn rc6_6a_32() -> (Remote, ProtocolInfo) {
    rc6_like("RC6-6A-32", 32, 0x1_0000_0000)
}

/// RC6-MCE: RC6-6A-32 with a fixed `0x800f` vendor prefix in the top 16
/// bits, used by Windows Media Center remotes.
pub fn rc6_mce() -> (Remote, ProtocolInfo) {
    let (r, info) = rc6_6a_32();
    (r, ProtocolInfo { name: "RC6-MCE", ..info })
}

/// The Xbox-DVD remote's fixed-timing variant of NEC-style framing.
pub fn xbox_dvd() -> (Remote, ProtocolInfo) {
    let (mut r, info) = nec_like("XBOX-DVD", NEC_CARRIER, 32, 500);
    r.gap = 135_000;
    (r, info)
}

/// The vendor prefix Windows Media Center remotes use to distinguish
/// themselves within the RC6-6A-32 scancode space.
pub const RC6_MCE_VENDOR_PREFIX: u64 = 0x800f_0000;

/// Tolerant, case/separator-insensitive name match, mirroring the
/// original's `str_like` lookup against the protocol table.
fn names_match(a: &str, want: &str) -> bool {
    let normalize = |s: &str| s.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_ascii_lowercase();
    normalize(a) == normalize(want)
}

/// Look up a fixed-parameter preset by name (case/separator-insensitive:
/// `"nec-x"`, `"NECX"`, and `"nec_x"` all resolve to the same preset).
pub fn preset(name: &str) -> Option<(Remote, ProtocolInfo)> {
    let candidates: &[fn() -> (Remote, ProtocolInfo)] = &[
        nec, necx, nec32, jvc, sanyo, sharp, sony12, sony15, sony20, rc5, rc5x, rc5_sz, rc6_0,
        rc6_6a_20, rc6_6a_24, rc6_6a_32, rc6_mce, xbox_dvd,
    ];
    for make in candidates {
        let (remote, info) = make();
        if names_match(&remote.name, name) || names_match(info.name, name) {
            return Some((remote, info));
        }
    }
    None
}

/// Canonicalize a decoded `(protocol, scancode)` pair the way the
/// original's `protocol_scancode_valid` retags ambiguous cases: plain NEC
/// frames whose address/complement bytes happen to also satisfy NECX
/// framing are reported as NEC (the more specific, redundancy-checked
/// variant), and RC6-6A-32 frames carrying the `0x800f` vendor prefix are
/// retagged as RC6-MCE.
pub fn canonicalize_scancode(protocol: &str, scancode: u64) -> (String, u64) {
    if names_match(protocol, "NECX") {
        let addr = (scancode >> 24) & 0xFF;
        let addr_inv = (scancode >> 16) & 0xFF;
        if addr ^ addr_inv == 0xFF {
            return ("NEC".to_string(), scancode);
        }
    }
    if names_match(protocol, "RC6-6A-32") && (scancode & 0xFFFF_0000) == RC6_MCE_VENDOR_PREFIX {
        return ("RC6-MCE".to_string(), scancode);
    }
    (protocol.to_string(), scancode)
}
