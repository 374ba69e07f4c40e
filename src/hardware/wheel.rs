// License below.
//! Implements the click wheel peripheral.
//!
//! The input backend pushes {buttons, wheel position, touch} events;
//! each event is serialised into the DATA register the way the
//! wheel controller frames its packets, and posts the first serial
//! unit's interrupt when the peripheral is enabled.
//!
//! Register layout (offsets from 0x7000C100):
//!
//! ```text
//! 0x00  CFG   R/W: bit 31 enable
//! 0x30  DATA  R: latest encoded event (reading consumes it)
//! 0x34  STAT  R: bit 30 event pending
//! ```
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use super::irq::{IntCon, IRQ_SER0};

const CFG_ENABLE: u32 = 1 << 31;
const STAT_PENDING: u32 = 1 << 30;

/// Frame header marker of a wheel packet.
const PACKET_HEADER: u32 = 0x1A;

/// Implements the click wheel register file and event encoder.
pub struct Wheel {
    cfg: u32,
    data: u32,
    pending: bool,
    intcon: Rc<RefCell<IntCon>>,
}

impl Wheel {
    /// Creates the peripheral with no event latched.
    pub fn new(intcon: Rc<RefCell<IntCon>>) -> Wheel {
        Wheel {
            cfg: 0,
            data: 0,
            pending: false,
            intcon: intcon,
        }
    }

    /// Encodes and latches one event from the input backend.
    pub fn push_event(&mut self, buttons: u8, position: u8, touching: bool) {
        let position = (position % 96) as u32;
        self.data = 0x8000_0000
            | PACKET_HEADER
            | ((buttons as u32) << 8)
            | (position << 16)
            | ((touching as u32) << 30);
        self.pending = true;
        if 0 != (self.cfg & CFG_ENABLE) {
            self.intcon.borrow_mut().assert_line(IRQ_SER0);
        }
    }

    /// Reads a wheel register.
    pub fn read32(&mut self, offset: u32) -> u32 {
        match offset {
            0x00 => self.cfg,
            0x30 => {
                self.pending = false;
                self.data
            },
            0x34 => if self.pending { STAT_PENDING } else { 0 },
            _ => {
                trace!("Wheel: read from unhandled register {:#04X}.", offset);
                0
            },
        }
    }

    /// Writes a wheel register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        match offset {
            0x00 => self.cfg = data,
            _ => trace!("Wheel: write {:#010X} to unhandled register {:#04X}.", data, offset),
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::irq::IntCon;

    #[test]
    fn event_encoding_and_interrupt() {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        let mut wheel = Wheel::new(ic.clone());

        wheel.push_event(0x02, 48, true);
        assert_eq!(ic.borrow().read32(0x010), 0, "disabled wheel stays silent");

        wheel.write32(0x00, 1 << 31);
        wheel.push_event(0x02, 48, true);
        assert_eq!(ic.borrow().read32(0x010), 1 << IRQ_SER0);

        assert_eq!(wheel.read32(0x34), 1 << 30);
        let packet = wheel.read32(0x30);
        assert_eq!(packet & 0xFF, 0x1A);
        assert_eq!((packet >> 8) & 0xFF, 0x02);
        assert_eq!((packet >> 16) & 0x7F, 48);
        assert_eq!(packet & (1 << 30), 1 << 30);
        assert_eq!(wheel.read32(0x34), 0, "reading DATA consumes the event");
    }

    #[test]
    fn positions_wrap_at_96() {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        let mut wheel = Wheel::new(ic);
        wheel.push_event(0, 96, false);
        assert_eq!((wheel.read32(0x30) >> 16) & 0x7F, 0);
    }
}


/*
Licensed to the Apache Software Foundation (ASF) under one
or more contributor license agreements.  See the NOTICE file
distributed with this work for additional information
regarding copyright ownership.  The ASF licenses this file
to you under the Apache License, Version 2.0 (the
"License"); you may not use this file except in compliance
with the License.  You may obtain a copy of the License at

  http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing,
software distributed under the License is distributed on an
"AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
KIND, either express or implied.  See the License for the
specific language governing permissions and limitations
under the License.
*/
