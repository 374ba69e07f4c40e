// License below.
//! Implements the PP5020's two system timers and the free-running
//! microsecond counter.
//!
//! Register layout (offsets from 0x60005000):
//!
//! ```text
//! 0x00  TIMER1_CFG  R/W: bit 31 enable, bit 30 repeat, bits 28..0 reload
//! 0x04  TIMER1_VAL  R: current count; W: acknowledge
//! 0x08  TIMER2_CFG  like TIMER1_CFG
//! 0x0C  TIMER2_VAL  like TIMER1_VAL
//! 0x10  USEC_TIMER  R: free-running 32-bit microsecond counter
//! ```
//!
//! Each timer decrements once per orchestrator tick, i.e. once per
//! executed instruction. On underflow it reloads (when repeating)
//! and asserts its interrupt line. A timer with reload 0 fires on
//! every tick.
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use super::irq::{IntCon, IRQ_TIMER1, IRQ_TIMER2};

const CFG_ENABLE: u32 = 1 << 31;
const CFG_REPEAT: u32 = 1 << 30;
const RELOAD_MASK: u32 = 0x1FFF_FFFF;

struct Timer {
    reload: u32,
    current: u32,
    enabled: bool,
    repeat: bool,
}

impl Timer {
    fn new() -> Timer {
        Timer { reload: 0, current: 0, enabled: false, repeat: false }
    }

    fn cfg(&self) -> u32 {
        (if self.enabled { CFG_ENABLE } else { 0 })
        | (if self.repeat { CFG_REPEAT } else { 0 })
        | self.reload
    }

    fn set_cfg(&mut self, data: u32) {
        self.enabled = 0 != (data & CFG_ENABLE);
        self.repeat  = 0 != (data & CFG_REPEAT);
        self.reload  = data & RELOAD_MASK;
        self.current = self.reload;
    }

    /// Advances by one tick.
    ///
    /// A reload of N fires every N ticks; a reload of 0 fires on
    /// every single tick.
    ///
    /// # Returns
    /// `true` on underflow.
    fn tick(&mut self) -> bool {
        if !self.enabled { return false; }
        if self.reload == 0 {
            if !self.repeat { self.enabled = false; }
            return true;
        }
        self.current -= 1;
        if self.current == 0 {
            self.current = self.reload;
            if !self.repeat { self.enabled = false; }
            true
        } else {
            false
        }
    }
}


/// Implements the timer block.
pub struct Timers {
    timers: [Timer; 2],
    usec: u32,
    usec_per_tick: u32,
    intcon: Rc<RefCell<IntCon>>,
}

impl Timers {
    /// Creates the timer block with both timers disabled.
    pub fn new(intcon: Rc<RefCell<IntCon>>) -> Timers {
        Timers {
            timers: [Timer::new(), Timer::new()],
            usec: 0,
            usec_per_tick: 1,
            intcon: intcon,
        }
    }

    /// Calibrates how far the microsecond counter advances per
    /// executed instruction.
    ///
    /// One instruction per microsecond is the default; a front-end
    /// that measures real throughput can re-derive this.
    pub fn set_usec_per_tick(&mut self, usec: u32) {
        self.usec_per_tick = usec;
    }

    /// Advances time by one orchestrator tick.
    pub fn tick(&mut self) {
        if self.timers[0].tick() { self.intcon.borrow_mut().assert_line(IRQ_TIMER1); }
        if self.timers[1].tick() { self.intcon.borrow_mut().assert_line(IRQ_TIMER2); }
        self.usec = self.usec.wrapping_add(self.usec_per_tick);
    }

    /// Reads a timer register.
    pub fn read32(&self, offset: u32) -> u32 {
        match offset {
            0x00 => self.timers[0].cfg(),
            0x04 => self.timers[0].current,
            0x08 => self.timers[1].cfg(),
            0x0C => self.timers[1].current,
            0x10 => self.usec,
            _ => {
                trace!("Timers: read from unhandled register {:#04X}.", offset);
                0
            },
        }
    }

    /// Writes a timer register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        match offset {
            0x00 => self.timers[0].set_cfg(data),
            0x04 => self.intcon.borrow_mut().clear_line(IRQ_TIMER1),
            0x08 => self.timers[1].set_cfg(data),
            0x0C => self.intcon.borrow_mut().clear_line(IRQ_TIMER2),
            0x10 => {}, // The microsecond counter is read-only.
            _ => trace!("Timers: write {:#010X} to unhandled register {:#04X}.", data, offset),
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::irq::IntCon;

    fn timers() -> (Timers, Rc<RefCell<IntCon>>) {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        (Timers::new(ic.clone()), ic)
    }

    fn timer1_pending(ic: &Rc<RefCell<IntCon>>) -> bool {
        0 != (ic.borrow().read32(0x010) & (1 << IRQ_TIMER1))
    }

    #[test]
    fn counts_down_and_fires_on_underflow() {
        let (mut t, ic) = timers();
        t.write32(0x00, (1 << 31) | (1 << 30) | 100);
        for _ in 0..99 { t.tick(); }
        assert!(!timer1_pending(&ic));
        assert_eq!(t.read32(0x04), 1);
        t.tick();
        assert!(timer1_pending(&ic));
        assert_eq!(t.read32(0x04), 100, "a repeating timer must reload");
    }

    #[test]
    fn one_shot_timer_disables_itself() {
        let (mut t, ic) = timers();
        t.write32(0x08, (1 << 31) | 3);
        for _ in 0..3 { t.tick(); }
        assert!(0 != (ic.borrow().read32(0x010) & (1 << IRQ_TIMER2)));
        assert_eq!(t.read32(0x08) & (1 << 31), 0);
    }

    #[test]
    fn reload_zero_fires_every_tick() {
        let (mut t, ic) = timers();
        t.write32(0x00, (1 << 31) | (1 << 30));
        t.tick();
        assert!(timer1_pending(&ic));
        ic.borrow_mut().clear_line(IRQ_TIMER1);
        t.tick();
        assert!(timer1_pending(&ic));
    }

    #[test]
    fn usec_counter_advances_and_wraps() {
        let (mut t, _ic) = timers();
        t.set_usec_per_tick(0x4000_0000);
        for _ in 0..5 { t.tick(); }
        assert_eq!(t.read32(0x10), 0x4000_0000);
        t.write32(0x10, 0);
        assert_eq!(t.read32(0x10), 0x4000_0000, "USEC_TIMER is read-only");
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
