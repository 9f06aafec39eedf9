//! The remote data model: [`Remote`], [`IrNcode`], [`ProtocolFamily`] and the
//! per-remote decoder runtime state.
//!
//! Grounded in `ir_remote_types.h`'s `struct ir_remote` / `struct ir_ncode`
//! and the `is_*`/`has_*`/`bit_count`/`min_gap`/`max_gap`/`get_duty_cycle`
//! inline helpers in `ir_remote.h`.

pub mod flags;

pub use flags::RemoteFlags;

use std::time::Instant;

pub const DEFAULT_FREQUENCY: u32 = 38_000;

/// `IR_PARITY_{NONE,EVEN,ODD}` for serial remotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// The protocol family selected by a remote's flags. Exactly one is active
/// per remote; this is the typed equivalent of masking `flags &
/// IR_PROTOCOL_MASK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    Raw,
    SpaceEnc,
    SpaceFirst,
    Rc5,
    Rc6,
    RcMm,
    Grundig,
    BangOlufsen,
    Serial,
    Xmp,
}

impl ProtocolFamily {
    /// Derive the active family from a remote's flags, or `None` if no
    /// protocol bit (or more than one) is set.
    pub fn from_flags(flags: RemoteFlags) -> Option<ProtocolFamily> {
        let masked = flags & flags::PROTOCOL_MASK;
        if masked.has_multiple_protocols() {
            return None;
        }
        Some(if masked.contains(RemoteFlags::RAW_CODES) {
            ProtocolFamily::Raw
        } else if masked.contains(RemoteFlags::RC6) {
            ProtocolFamily::Rc6
        } else if masked.contains(RemoteFlags::RC5) {
            ProtocolFamily::Rc5
        } else if masked.contains(RemoteFlags::RCMM) {
            ProtocolFamily::RcMm
        } else if masked.contains(RemoteFlags::GRUNDIG) {
            ProtocolFamily::Grundig
        } else if masked.contains(RemoteFlags::BO) {
            ProtocolFamily::BangOlufsen
        } else if masked.contains(RemoteFlags::SERIAL) {
            ProtocolFamily::Serial
        } else if masked.contains(RemoteFlags::XMP) {
            ProtocolFamily::Xmp
        } else if masked.contains(RemoteFlags::SPACE_FIRST) {
            ProtocolFamily::SpaceFirst
        } else {
            // SPACE_ENC, or no protocol bit at all: space-encoded is the
            // implicit default family, matching the original's behavior
            // when no protocol flag is given.
            ProtocolFamily::SpaceEnc
        })
    }
}

/// A chained successor code, used by remotes whose buttons emit more than
/// one frame in sequence (represented as an owned vector plus cursor index
/// rather than intrusive pointers; see `SPEC_FULL.md` §9).
#[derive(Debug, Clone, Default)]
pub struct CodeChain {
    pub successors: Vec<u64>,
}

/// A button definition: name, primary code, optional chained successors,
/// optional raw signal array.
#[derive(Debug, Clone)]
pub struct IrNcode {
    pub name: String,
    pub code: u64,
    pub chain: CodeChain,
    /// Raw-mode signal array (pulse-first, odd length). Empty for
    /// non-raw remotes.
    pub signals: Vec<u32>,
}

impl IrNcode {
    pub fn new(name: impl Into<String>, code: u64) -> Self {
        IrNcode {
            name: name.into(),
            code,
            chain: CodeChain::default(),
            signals: Vec::new(),
        }
    }

    pub fn with_raw_signals(name: impl Into<String>, signals: Vec<u32>) -> Self {
        IrNcode {
            name: name.into(),
            code: 0,
            chain: CodeChain::default(),
            signals,
        }
    }
}

/// Per-remote state mutated by the decoder across calls: toggle tracking,
/// repeat accounting, and remaining-gap bookkeeping.
///
/// `toggle_mask_state` is encoded as an explicit four-state enum rather
/// than modular arithmetic on an integer, per `SPEC_FULL.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Start,
    FirstHalf,
    SecondHalf,
    Held,
}

impl ToggleState {
    /// Advance one step along the single allowed transition table:
    /// `Start -> FirstHalf -> SecondHalf -> Held -> SecondHalf (held repeat)`.
    pub fn advance(self) -> ToggleState {
        match self {
            ToggleState::Start => ToggleState::FirstHalf,
            ToggleState::FirstHalf => ToggleState::SecondHalf,
            ToggleState::SecondHalf => ToggleState::Held,
            ToggleState::Held => ToggleState::SecondHalf,
        }
    }

    /// True for `FirstHalf`/`Held`, the "odd" states in the original's
    /// `toggle_mask_state & 1` test that trigger `toggle_mask` XOR-folding.
    pub fn is_odd(self) -> bool {
        matches!(self, ToggleState::FirstHalf | ToggleState::Held)
    }
}

impl Default for ToggleState {
    fn default() -> Self {
        ToggleState::Start
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecoderRuntime {
    pub toggle_bit_mask_state: u64,
    pub toggle_mask_state: ToggleState,
    pub reps: u32,
    pub last_code: Option<usize>,
    pub toggle_code: Option<usize>,
    pub last_send: Option<Instant>,
    pub min_remaining_gap: u32,
    pub max_remaining_gap: u32,
    pub release_detected: bool,
}

/// A remote control definition, as produced by the parser (component B)
/// and consumed, read-only except for [`DecoderRuntime`], by the decoder
/// and encoder.
#[derive(Debug, Clone)]
pub struct Remote {
    pub name: String,
    pub driver: Option<String>,
    pub flags: RemoteFlags,
    pub bits: u32,
    pub eps: i32,
    pub aeps: u32,

    pub phead: u32,
    pub shead: u32,
    pub pthree: u32,
    pub sthree: u32,
    pub ptwo: u32,
    pub stwo: u32,
    pub pone: u32,
    pub sone: u32,
    pub pzero: u32,
    pub szero: u32,
    pub plead: u32,
    pub ptrail: u32,
    pub pfoot: u32,
    pub sfoot: u32,
    pub prepeat: u32,
    pub srepeat: u32,

    pub pre_data_bits: u32,
    pub pre_data: u64,
    pub post_data_bits: u32,
    pub post_data: u64,
    pub pre_p: u32,
    pub pre_s: u32,
    pub post_p: u32,
    pub post_s: u32,

    pub gap: u32,
    pub gap2: u32,
    pub repeat_gap: u32,

    /// Raw `toggle_bit`/`repeat_bit` config value (1-based bit position
    /// counted from the end of the frame). Obsolete, kept only as
    /// scratch space between parsing and [`crate::parser::normalize`],
    /// which folds it into `toggle_bit_mask` (or `rc6_mask` for RC-6
    /// remotes) and resets it to 0.
    pub toggle_bit: u32,
    pub toggle_bit_mask: u64,
    pub suppress_repeat: u32,
    pub min_repeat: u32,
    pub min_code_repeat: u32,
    pub freq: u32,
    pub duty_cycle: u32,
    pub toggle_mask: u64,
    pub rc6_mask: u64,

    pub baud: u32,
    pub bits_in_byte: u32,
    pub parity: Parity,
    pub stop_bits: u32,

    pub ignore_mask: u64,
    pub repeat_mask: u64,

    pub manual_sort: bool,

    pub codes: Vec<IrNcode>,

    // Derived, computed post-parse by `calculate_signal_lengths`.
    pub min_total_signal_length: u32,
    pub max_total_signal_length: u32,
    pub min_gap_length: u32,
    pub max_gap_length: u32,
    pub min_pulse_length: u32,
    pub max_pulse_length: u32,
    pub min_space_length: u32,
    pub max_space_length: u32,

    pub runtime: DecoderRuntime,
}

impl Remote {
    pub fn new(name: impl Into<String>) -> Self {
        Remote {
            name: name.into(),
            driver: None,
            flags: RemoteFlags::empty(),
            bits: 0,
            eps: 30,
            aeps: 100,
            phead: 0,
            shead: 0,
            pthree: 0,
            sthree: 0,
            ptwo: 0,
            stwo: 0,
            pone: 0,
            sone: 0,
            pzero: 0,
            szero: 0,
            plead: 0,
            ptrail: 0,
            pfoot: 0,
            sfoot: 0,
            prepeat: 0,
            srepeat: 0,
            pre_data_bits: 0,
            pre_data: 0,
            post_data_bits: 0,
            post_data: 0,
            pre_p: 0,
            pre_s: 0,
            post_p: 0,
            post_s: 0,
            gap: 0,
            gap2: 0,
            repeat_gap: 0,
            toggle_bit: 0,
            toggle_bit_mask: 0,
            suppress_repeat: 0,
            min_repeat: 0,
            min_code_repeat: 0,
            freq: DEFAULT_FREQUENCY,
            duty_cycle: 50,
            toggle_mask: 0,
            rc6_mask: 0,
            baud: 0,
            bits_in_byte: 0,
            parity: Parity::None,
            stop_bits: 0,
            ignore_mask: 0,
            repeat_mask: 0,
            manual_sort: false,
            codes: Vec::new(),
            min_total_signal_length: 0,
            max_total_signal_length: 0,
            min_gap_length: 0,
            max_gap_length: 0,
            min_pulse_length: 0,
            max_pulse_length: 0,
            min_space_length: 0,
            max_space_length: 0,
            runtime: DecoderRuntime::default(),
        }
    }

    pub fn protocol_family(&self) -> Option<ProtocolFamily> {
        ProtocolFamily::from_flags(self.flags)
    }

    pub fn is_raw(&self) -> bool {
        self.flags.contains(RemoteFlags::RAW_CODES)
    }

    pub fn is_rc5(&self) -> bool {
        self.flags.contains(RemoteFlags::RC5)
    }

    pub fn is_rc6(&self) -> bool {
        self.flags.contains(RemoteFlags::RC6)
    }

    pub fn is_rcmm(&self) -> bool {
        self.flags.contains(RemoteFlags::RCMM)
    }

    pub fn is_space_enc(&self) -> bool {
        self.flags.contains(RemoteFlags::SPACE_ENC)
    }

    pub fn is_space_first(&self) -> bool {
        self.flags.contains(RemoteFlags::SPACE_FIRST)
    }

    pub fn is_grundig(&self) -> bool {
        self.flags.contains(RemoteFlags::GRUNDIG)
    }

    pub fn is_bo(&self) -> bool {
        self.flags.contains(RemoteFlags::BO)
    }

    pub fn is_serial(&self) -> bool {
        self.flags.contains(RemoteFlags::SERIAL)
    }

    pub fn is_xmp(&self) -> bool {
        self.flags.contains(RemoteFlags::XMP)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(RemoteFlags::CONST_LENGTH)
    }

    pub fn has_pre(&self) -> bool {
        self.pre_data_bits > 0
    }

    pub fn has_post(&self) -> bool {
        self.post_data_bits > 0
    }

    pub fn has_header(&self) -> bool {
        self.phead != 0 || self.shead != 0
    }

    pub fn has_foot(&self) -> bool {
        self.pfoot != 0 || self.sfoot != 0
    }

    pub fn has_repeat(&self) -> bool {
        self.prepeat != 0 || self.srepeat != 0
    }

    pub fn has_repeat_gap(&self) -> bool {
        self.repeat_gap != 0
    }

    pub fn has_toggle_bit_mask(&self) -> bool {
        self.toggle_bit_mask != 0
    }

    pub fn has_toggle_mask(&self) -> bool {
        self.toggle_mask != 0
    }

    pub fn has_ignore_mask(&self) -> bool {
        self.ignore_mask != 0
    }

    pub fn has_repeat_mask(&self) -> bool {
        self.repeat_mask != 0
    }

    pub fn has_rc6_mask(&self) -> bool {
        self.rc6_mask != 0
    }

    pub fn no_head_rep(&self) -> bool {
        self.flags.contains(RemoteFlags::NO_HEAD_REP)
    }

    pub fn no_foot_rep(&self) -> bool {
        self.flags.contains(RemoteFlags::NO_FOOT_REP)
    }

    pub fn repeat_header(&self) -> bool {
        self.flags.contains(RemoteFlags::REPEAT_HEADER)
    }

    /// Total payload width: `pre_data_bits + bits + post_data_bits`.
    pub fn bit_count(&self) -> u32 {
        self.pre_data_bits + self.bits + self.post_data_bits
    }

    /// `min(gap, gap2)` when `gap2` is set, else `gap`.
    pub fn min_gap(&self) -> u32 {
        if self.gap2 != 0 {
            self.gap.min(self.gap2)
        } else {
            self.gap
        }
    }

    /// `max(gap, gap2)` when `gap2` is set, else `gap`.
    pub fn max_gap(&self) -> u32 {
        if self.gap2 != 0 {
            self.gap.max(self.gap2)
        } else {
            self.gap
        }
    }

    /// Duty cycle, defaulting to 50% when unset (0 means "not specified").
    pub fn get_duty_cycle(&self) -> u32 {
        if self.duty_cycle == 0 {
            50
        } else {
            self.duty_cycle
        }
    }

    pub fn code_by_name(&self, name: &str) -> Option<&IrNcode> {
        self.codes.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_family_defaults_to_space_enc() {
        let r = Remote::new("x");
        assert_eq!(r.protocol_family(), Some(ProtocolFamily::SpaceEnc));
    }

    #[test]
    fn protocol_family_multiple_bits_rejected() {
        let mut r = Remote::new("x");
        r.flags = RemoteFlags::RC5 | RemoteFlags::RC6;
        assert_eq!(r.protocol_family(), None);
    }

    #[test]
    fn min_max_gap_with_gap2() {
        let mut r = Remote::new("x");
        r.gap = 100;
        r.gap2 = 50;
        assert_eq!(r.min_gap(), 50);
        assert_eq!(r.max_gap(), 100);
    }

    #[test]
    fn bit_count_sums_pre_main_post() {
        let mut r = Remote::new("x");
        r.pre_data_bits = 4;
        r.bits = 12;
        r.post_data_bits = 2;
        assert_eq!(r.bit_count(), 18);
    }

    #[test]
    fn toggle_state_transitions() {
        let s = ToggleState::Start;
        let s = s.advance();
        assert_eq!(s, ToggleState::FirstHalf);
        assert!(s.is_odd());
        let s = s.advance();
        assert_eq!(s, ToggleState::SecondHalf);
        assert!(!s.is_odd());
        let s = s.advance();
        assert_eq!(s, ToggleState::Held);
        assert!(s.is_odd());
        let s = s.advance();
        assert_eq!(s, ToggleState::SecondHalf);
    }

    #[test]
    fn duty_cycle_defaults_to_50() {
        let r = Remote::new("x");
        assert_eq!(r.get_duty_cycle(), 50);
    }
}
