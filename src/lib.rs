#![doc = r#"
# ircodec

**ircodec** is a from-scratch, bidirectional consumer-IR remote control
signal codec, modeled on the decode/encode engine at the heart of Linux
LIRC/rc-core userspace (`lircd`). It turns a driver's raw timed
pulse/space stream into `(remote, button, scancode, repeat)` tuples, and
turns a button press back into a pulse/space stream ready for transmit
hardware.

## Layout

The crate is organized around the same pipeline `lircd` uses internally:

* [`parser`] reads a LIRC-style remote config file into [`remote::Remote`]
  values.
* [`database`] holds the parsed remotes as an ordered, sortable
  [`database::RemoteDatabase`].
* [`receive`] buffers a driver's raw edges; [`decode`] matches them
  against the database.
* [`transmit`] turns a matched button back into a pulse/space stream;
  [`protocols`] and [`keymap`] supply ready-made timing templates for
  protocols that don't need a config-file entry.
* [`dispatch`] formats a decoded match as the classic
  `<scancode> <reps> <button> <remote>` event line, including the
  `__EOF` sentinel and `suppress_repeat` squelching.
* [`driver`] is the trait a concrete transceiver implements to plug into
  all of the above; [`device`] is a narrower, write-only sink for
  transmit-only hardware such as a kernel `/dev/lircX` device.

## Example

```rust
use ircodec::database::RemoteDatabase;
use ircodec::decode::{decode, DecodeOptions};
use ircodec::protocols;
use ircodec::receive::ReceiveBuffer;
use ircodec::remote::IrNcode;
use ircodec::transmit::encode_once;

let (mut remote, _info) = protocols::nec();
remote.codes.push(IrNcode::new("KEY_POWER", 0x00FF_00FF));
let code = remote.codes[0].clone();

let pulses = encode_once(&remote, &code, false).unwrap();

let mut buf = ReceiveBuffer::new();
for (i, &edge) in pulses.iter().enumerate() {
    if i % 2 == 0 {
        buf.push_pulse(edge);
    } else {
        buf.push_space(edge);
    }
}
buf.flush();

let mut db = RemoteDatabase::from_remotes(vec![remote]);
let decoded = decode(&mut buf, &mut db, &DecodeOptions::default());
assert_eq!(decoded.unwrap().button, "KEY_POWER");
```

## Hardware

On Linux, with the default `cir` feature, [`device::DefaultPulseTransmitter`]
writes pulses directly to a `/dev/lircX` transmit device, the same
`write(2)` interface `lirc-tools`' `irsend` uses. On other platforms (or
with `cir` disabled), it falls back to an emulator that logs the pulse
train instead, intended for development only.

```ignore
[dependencies]
ircodec = { version = "0.1.0" }               # cir enabled (Linux hardware)
ircodec = { version = "0.1.0", default-features = false }  # emulator only
```
"#]

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;

pub mod database;
pub mod decode;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod duration;
pub mod errors;
pub mod keymap;
pub mod parser;
pub mod protocols;
pub mod receive;
pub mod remote;
pub mod transmit;

pub use database::RemoteDatabase;
pub use decode::{decode as decode_frame, DecodeOptions, Decoded};
pub use device::{DefaultPulseTransmitter, PulseTransmitter};
pub use dispatch::{decode_all, Context};
pub use driver::Driver;
pub use duration::Duration;
pub use errors::{Error, Result};
pub use remote::{IrNcode, ProtocolFamily, Remote, RemoteFlags};
