//! Event dispatch (component I): turns one decoder match into the
//! newline-terminated event-line wire format, applying `suppress_repeat`
//! squelching and the `__EOF` sentinel along the way.
//!
//! Grounded in `ir_remote.c::decode_all`/`write_message` and
//! `config_file.c`'s `suppress_repeat` field.

use crate::database::{RemoteDatabase, EOF_CODE_NAME, INTERNAL_REMOTE_NAME};
use crate::decode::{DecodeOptions, Decoded};
use crate::driver::Driver;
use crate::receive::ReceiveBuffer;

/// Fixed end-of-stream event line, emitted once for the reserved
/// `lirc`/`__EOF` pseudo-code and never again afterwards on this stream.
pub const EOF_EVENT_LINE: &str = "0000000008000000 00 __EOF lirc\n";

/// Owns the receive-side state a decoding session needs across calls:
/// the ring buffer accumulating edges and the remote database being
/// matched against. Replaces the original's process-wide
/// `last_remote`/`repeat_remote`/`last_code`/`repeat_code` statics (see
/// `DESIGN.md`'s Open Question notes) — each field they held now lives
/// either here or on the individual `Remote::runtime`.
#[derive(Debug, Default)]
pub struct Context {
    pub receive_buffer: ReceiveBuffer,
    pub database: RemoteDatabase,
    pub options: DecodeOptions,
    at_eof: bool,
}

impl Context {
    pub fn new(database: RemoteDatabase) -> Self {
        Context {
            receive_buffer: ReceiveBuffer::new(),
            database,
            options: DecodeOptions::default(),
            at_eof: false,
        }
    }

    /// True once the `__EOF` event line has been emitted for this
    /// context; further calls to [`decode_all`] are a no-op.
    pub fn at_eof(&self) -> bool {
        self.at_eof
    }
}

/// Pulls one edge from `driver`, runs it through the decode engine, and
/// formats a matched button press as an event line. Returns `None` when
/// no edge matched, when a repeat was squelched by `suppress_repeat`, or
/// once end-of-stream has already been reported.
///
/// Grounded in `ir_remote.c::decode_all`'s per-call shape: one pass over
/// the remote list per invocation, with the caller expected to loop.
pub fn decode_all(ctx: &mut Context, driver: &mut impl Driver) -> Option<String> {
    if ctx.at_eof {
        return None;
    }
    driver.pump_once(&mut ctx.receive_buffer, driver.resolution().max(1));
    let decoded = driver.decode_func(&mut ctx.receive_buffer, &mut ctx.database, &ctx.options)?;
    format_event(&mut ctx.database, &mut ctx.at_eof, decoded)
}

fn format_event(db: &mut RemoteDatabase, at_eof: &mut bool, decoded: Decoded) -> Option<String> {
    if decoded.remote == INTERNAL_REMOTE_NAME && decoded.button == EOF_CODE_NAME {
        *at_eof = true;
        log::debug!("dispatch: end of stream");
        return Some(EOF_EVENT_LINE.to_string());
    }

    let suppress_repeat = db.get(&decoded.remote).map(|r| r.suppress_repeat).unwrap_or(0);
    let reps = if decoded.repeat > 0 {
        if decoded.repeat <= suppress_repeat {
            log::trace!("dispatch: squelching repeat {} of {} (suppress_repeat {suppress_repeat})", decoded.repeat, decoded.button);
            return None;
        }
        decoded.repeat - suppress_repeat
    } else {
        0
    };

    let line = format!(
        "{:016x} {:02x} {} {}\n",
        decoded.scancode, reps, decoded.button, decoded.remote
    );
    log::debug!("dispatch: emitting {}", line.trim_end());
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{Duration, Edge};
    use crate::remote::{flags::RemoteFlags, IrNcode, Remote};
    use std::collections::VecDeque;

    struct ScriptedDriver {
        queue: VecDeque<Duration>,
    }

    impl Driver for ScriptedDriver {
        fn read_data(&mut self, _timeout_us: u32) -> Duration {
            self.queue.pop_front().unwrap_or(Duration { magnitude: 0, kind: Edge::Timeout })
        }

        fn resolution(&self) -> u32 {
            50
        }
    }

    fn space_enc_remote() -> Remote {
        let mut r = Remote::new("demo");
        r.flags = RemoteFlags::SPACE_ENC;
        r.bits = 0;
        r.suppress_repeat = 1;
        r.codes.push(IrNcode::new("KEY_POWER", 0));
        r
    }

    #[test]
    fn formats_a_fresh_press_as_an_event_line() {
        let mut db = RemoteDatabase::from_remotes(vec![space_enc_remote()]);
        let decoded = Decoded {
            remote: "demo".to_string(),
            button: "KEY_POWER".to_string(),
            scancode: 0x1,
            repeat: 0,
        };
        let mut at_eof = false;
        let line = format_event(&mut db, &mut at_eof, decoded).unwrap();
        assert_eq!(line, "0000000000000001 00 KEY_POWER demo\n");
        assert!(!at_eof);
    }

    #[test]
    fn squelches_repeats_at_or_below_suppress_repeat() {
        let mut db = RemoteDatabase::from_remotes(vec![space_enc_remote()]);
        for reps in 1..=1 {
            let decoded = Decoded {
                remote: "demo".to_string(),
                button: "KEY_POWER".to_string(),
                scancode: 0x1,
                repeat: reps,
            };
            let mut at_eof = false;
            assert!(format_event(&mut db, &mut at_eof, decoded).is_none());
        }
    }

    #[test]
    fn emits_reps_minus_suppress_repeat_past_the_threshold() {
        let mut db = RemoteDatabase::from_remotes(vec![space_enc_remote()]);
        let decoded = Decoded {
            remote: "demo".to_string(),
            button: "KEY_POWER".to_string(),
            scancode: 0x1,
            repeat: 3,
        };
        let mut at_eof = false;
        let line = format_event(&mut db, &mut at_eof, decoded).unwrap();
        assert_eq!(line, "0000000000000001 02 KEY_POWER demo\n");
    }

    #[test]
    fn eof_pseudo_code_emits_fixed_line_and_latches() {
        let mut db = RemoteDatabase::from_remotes(vec![]);
        let decoded = Decoded {
            remote: INTERNAL_REMOTE_NAME.to_string(),
            button: EOF_CODE_NAME.to_string(),
            scancode: 0,
            repeat: 0,
        };
        let mut at_eof = false;
        let line = format_event(&mut db, &mut at_eof, decoded).unwrap();
        assert_eq!(line, EOF_EVENT_LINE);
        assert!(at_eof);
    }

    #[test]
    fn decode_all_returns_none_once_context_is_at_eof() {
        let db = RemoteDatabase::from_remotes(vec![space_enc_remote()]);
        let mut ctx = Context::new(db);
        ctx.at_eof = true;
        let mut driver = ScriptedDriver { queue: VecDeque::new() };
        assert!(decode_all(&mut ctx, &mut driver).is_none());
    }
}
