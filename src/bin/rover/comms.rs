use crate::app;
use crate::control;
use crate::INPUTS;
use core::fmt::Write;
use rtic::Mutex;
use stm32f4xx_hal::prelude::*;

pub fn command_rx(mut cx: app::command_rx::Context) {
    let now = control::now();
    loop {
        let byte = match cx.local.rx.read() {
            Ok(byte) => byte,
            Err(nb::Error::WouldBlock) => break,
            Err(nb::Error::Other(_)) => {
                cx.shared.tx.lock(|tx| writeln!(tx, "command uart error\r").ok());
                break;
            }
        };
        match cx.local.reader.push(byte) {
            Ok(Some(msg)) => {
                if !cx.local.link.handle(msg, &INPUTS, now) {
                    cx.shared.tx.lock(|tx| writeln!(tx, "command refused: {msg:?}\r").ok());
                }
            }
            Ok(None) => {}
            Err(e) => {
                cx.shared.tx.lock(|tx| writeln!(tx, "command frame: {e}\r").ok());
            }
        }
    }
}
