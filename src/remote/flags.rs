//! Remote flag set, mirroring the `#define RAW_CODES 0x0001 ...` constants
//! in `ir_remote_types.h`.

use bitflags::bitflags;

bitflags! {
    /// Protocol-family and modifier flags carried by a [`super::Remote`].
    ///
    /// The low bits (within [`PROTOCOL_MASK`]) select the active protocol
    /// family and are mutually exclusive; the parser rejects more than one
    /// protocol bit being set at once. The remaining bits are orthogonal
    /// modifiers that may be combined freely with a protocol bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RemoteFlags: u32 {
        const RAW_CODES     = 0x0001;
        const RC5           = 0x0002;
        const RC6           = 0x0004;
        const RCMM          = 0x0008;
        const SPACE_ENC     = 0x0010;
        const SPACE_FIRST   = 0x0020;
        const GRUNDIG       = 0x0080;
        const BO            = 0x0100;
        const SERIAL        = 0x0200;
        const XMP           = 0x0400;

        const REVERSE       = 0x0800;
        const NO_HEAD_REP   = 0x1000;
        const NO_FOOT_REP   = 0x2000;
        const CONST_LENGTH  = 0x4000;
        const REPEAT_HEADER = 0x8000;

        const COMPAT_REVERSE = 0x0001_0000;
    }
}

/// `SHIFT_ENC` is an obsolete alias for `RC5`.
pub const SHIFT_ENC: RemoteFlags = RemoteFlags::RC5;

/// Bits reserved for mutually-exclusive protocol-family selection.
pub const PROTOCOL_MASK: RemoteFlags = RemoteFlags::from_bits_truncate(0x07ff);

impl RemoteFlags {
    /// True if more than one protocol-family bit is set.
    pub fn has_multiple_protocols(self) -> bool {
        (self & PROTOCOL_MASK).bits().count_ones() > 1
    }

    /// Look up a flag by its case-insensitive config-file name.
    pub fn from_name(name: &str) -> Option<RemoteFlags> {
        let upper = name.to_ascii_uppercase();
        Some(match upper.as_str() {
            "RAW_CODES" => RemoteFlags::RAW_CODES,
            "RC5" => RemoteFlags::RC5,
            "SHIFT_ENC" => SHIFT_ENC,
            "RC6" => RemoteFlags::RC6,
            "RCMM" => RemoteFlags::RCMM,
            "SPACE_ENC" => RemoteFlags::SPACE_ENC,
            "SPACE_FIRST" => RemoteFlags::SPACE_FIRST,
            "GRUNDIG" => RemoteFlags::GRUNDIG,
            "BO" => RemoteFlags::BO,
            "SERIAL" => RemoteFlags::SERIAL,
            "XMP" => RemoteFlags::XMP,
            "REVERSE" => RemoteFlags::REVERSE,
            "NO_HEAD_REP" => RemoteFlags::NO_HEAD_REP,
            "NO_FOOT_REP" => RemoteFlags::NO_FOOT_REP,
            "CONST_LENGTH" => RemoteFlags::CONST_LENGTH,
            "REPEAT_HEADER" => RemoteFlags::REPEAT_HEADER,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_protocol_is_fine() {
        let f = RemoteFlags::RC5 | RemoteFlags::CONST_LENGTH;
        assert!(!f.has_multiple_protocols());
    }

    #[test]
    fn two_protocols_are_rejected() {
        let f = RemoteFlags::RC5 | RemoteFlags::RC6;
        assert!(f.has_multiple_protocols());
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(RemoteFlags::from_name("rc5"), Some(RemoteFlags::RC5));
        assert_eq!(RemoteFlags::from_name("Rc5"), Some(RemoteFlags::RC5));
        assert_eq!(RemoteFlags::from_name("bogus"), None);
    }

    #[test]
    fn shift_enc_aliases_rc5() {
        assert_eq!(RemoteFlags::from_name("SHIFT_ENC"), Some(RemoteFlags::RC5));
    }
}
