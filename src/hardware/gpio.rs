// License below.
//! Implements the twelve 32-pin GPIO ports.
//!
//! Ports are grouped four to a 0x80 block (A-D, E-H, I-L) starting
//! at 0x6000D000. Within a block, bits 6..4 of the offset select the
//! register kind and bits 3..2 the port:
//!
//! ```text
//! +0x00  ENABLE      +0x40  INT_STAT
//! +0x10  OUTPUT_EN   +0x50  INT_EN
//! +0x20  OUTPUT_VAL  +0x60  INT_LEV
//! +0x30  INPUT_VAL   +0x70  INT_CLR (W1C on INT_STAT)
//! ```
//!
//! An input edge matching the INT_LEV polarity of an INT_EN'd pin
//! latches into INT_STAT and posts the high-priority GPIO slot on
//! the interrupt controller.
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use super::irq::{IntCon, HI_GPIO};

/// Number of GPIO ports.
pub const PORT_COUNT: usize = 12;

struct GpioPort {
    enable: u32,
    output_en: u32,
    output_val: u32,
    input_val: u32,
    int_stat: u32,
    int_en: u32,
    int_lev: u32,
}

impl GpioPort {
    fn new() -> GpioPort {
        GpioPort {
            enable: 0,
            output_en: 0,
            output_val: 0,
            input_val: 0,
            int_stat: 0,
            int_en: 0,
            int_lev: 0,
        }
    }

    /// The pin levels firmware observes: driven pins read their
    /// output latch, the rest their input sample.
    fn levels(&self) -> u32 {
        (self.output_val & self.output_en) | (self.input_val & !self.output_en)
    }
}

/// Implements the GPIO block.
pub struct Gpio {
    ports: [GpioPort; PORT_COUNT],
    intcon: Rc<RefCell<IntCon>>,
}

impl Gpio {
    /// Creates the block with all pins configured as inputs at
    /// level zero.
    pub fn new(intcon: Rc<RefCell<IntCon>>) -> Gpio {
        Gpio {
            ports: [
                GpioPort::new(), GpioPort::new(), GpioPort::new(), GpioPort::new(),
                GpioPort::new(), GpioPort::new(), GpioPort::new(), GpioPort::new(),
                GpioPort::new(), GpioPort::new(), GpioPort::new(), GpioPort::new(),
            ],
            intcon: intcon,
        }
    }

    fn decode(offset: u32) -> Option<(usize, u32)> {
        let port = ((offset >> 7) * 4 + ((offset >> 2) & 0b11)) as usize;
        if port >= PORT_COUNT { return None; }
        Some((port, (offset >> 4) & 0b111))
    }

    /// Reads a GPIO register.
    pub fn read32(&self, offset: u32) -> u32 {
        let (port, kind) = match Gpio::decode(offset) {
            Some(x) => x,
            None => return 0,
        };
        let p = &self.ports[port];
        match kind {
            0 => p.enable,
            1 => p.output_en,
            2 => p.output_val,
            3 => p.levels(),
            4 => p.int_stat,
            5 => p.int_en,
            6 => p.int_lev,
            _ => 0,
        }
    }

    /// Writes a GPIO register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        let (port, kind) = match Gpio::decode(offset) {
            Some(x) => x,
            None => {
                trace!("GPIO: write {:#010X} to unhandled offset {:#05X}.", data, offset);
                return;
            },
        };
        let p = &mut self.ports[port];
        match kind {
            0 => p.enable = data,
            1 => p.output_en = data,
            2 => p.output_val = data,
            3 => {}, // Input samples come from the host side only.
            4 => {},
            5 => p.int_en = data,
            6 => p.int_lev = data,
            7 => p.int_stat &= !data,
            _ => {},
        }
    }

    /// Feeds a new input level for one pin from the host side.
    ///
    /// A level change against the INT_LEV polarity of an enabled
    /// pin latches an interrupt.
    pub fn set_pin(&mut self, port: usize, pin: u32, level: bool) {
        if port >= PORT_COUNT || pin >= 32 { return; }
        let bit = 1 << pin;
        let p = &mut self.ports[port];
        let old = 0 != (p.input_val & bit);
        if old == level { return; }

        if level { p.input_val |= bit; } else { p.input_val &= !bit; }

        let wants_high = 0 != (p.int_lev & bit);
        if 0 != (p.int_en & bit) && wants_high == level {
            p.int_stat |= bit;
            self.intcon.borrow_mut().assert_hi(HI_GPIO);
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::irq::IntCon;

    fn gpio() -> (Gpio, Rc<RefCell<IntCon>>) {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        (Gpio::new(ic.clone()), ic)
    }

    #[test]
    fn port_decode_reaches_all_twelve_ports() {
        let (mut g, _ic) = gpio();
        // Port A OUTPUT_VAL, port F OUTPUT_VAL, port L OUTPUT_VAL.
        g.write32(0x020, 0x1);
        g.write32(0x0A4, 0x2);
        g.write32(0x12C, 0x4);
        assert_eq!(g.read32(0x020), 0x1);
        assert_eq!(g.read32(0x0A4), 0x2);
        assert_eq!(g.read32(0x12C), 0x4);
    }

    #[test]
    fn driven_pins_read_their_latch() {
        let (mut g, _ic) = gpio();
        g.write32(0x010, 0x0000_00FF); // Port A: low byte driven.
        g.write32(0x020, 0x0000_0055);
        g.set_pin(0, 8, true);
        assert_eq!(g.read32(0x030), 0x0000_0155);
    }

    #[test]
    fn rising_edge_latches_an_interrupt() {
        let (mut g, ic) = gpio();
        g.write32(0x050, 1 << 3); // Port A pin 3 INT_EN.
        g.write32(0x060, 1 << 3); // Rising edge.
        g.set_pin(0, 3, true);
        assert_eq!(g.read32(0x040), 1 << 3);
        assert_eq!(ic.borrow().read32(0x100), 1 << HI_GPIO);

        // W1C through INT_CLR.
        g.write32(0x070, 1 << 3);
        assert_eq!(g.read32(0x040), 0);
    }

    #[test]
    fn falling_edge_respects_polarity() {
        let (mut g, _ic) = gpio();
        g.write32(0x050, 1 << 0);
        g.write32(0x060, 0); // Falling edge.
        g.set_pin(0, 0, true);
        assert_eq!(g.read32(0x040), 0, "rising edge must not latch");
        g.set_pin(0, 0, false);
        assert_eq!(g.read32(0x040), 1 << 0);
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
