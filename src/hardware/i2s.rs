// License below.
//! Implements the I2S audio output unit.
//!
//! Firmware feeds interleaved 16-bit stereo samples through the
//! FIFO port; they leave the core through the attached `AudioSink`.
//! The unit never back-pressures — the host side owns real-time
//! pacing — but it does assert its interrupt on a steady cadence
//! so interrupt-driven firmware keeps producing.
//!
//! Register layout (offsets from 0x70002800):
//!
//! ```text
//! 0x00  IIS_CONFIG    R/W: bit 31 enable
//! 0x04  IIS_CLOCK     R/W: rate setup latch
//! 0x40  IIS_FIFO_CFG  R/W: bit 9 irq enable
//! 0x44  IIS_FIFO_STAT R: free FIFO slots
//! 0x80  IIS_FIFO      W: two 16-bit samples per word, left low
//! ```
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use super::frontend::{AudioSink, NullSink};
use super::irq::{IntCon, IRQ_IIS};

const CONFIG_ENABLE: u32 = 1 << 31;
const FIFO_CFG_IRQ_EN: u32 = 1 << 9;

/// Free slots the status register always reports.
const FIFO_FREE_SLOTS: u32 = 16;

/// Implements the I2S register file and sample pump.
pub struct I2s {
    config: u32,
    clock: u32,
    fifo_cfg: u32,
    cadence: u32,
    countdown: u32,
    sink: Box<dyn AudioSink>,
    intcon: Rc<RefCell<IntCon>>,
}

impl I2s {
    /// Default instruction count between sample-request interrupts.
    pub const DEFAULT_CADENCE: u32 = 2048;

    /// Creates the unit, disabled, with no sink attached.
    pub fn new(intcon: Rc<RefCell<IntCon>>) -> I2s {
        I2s {
            config: 0,
            clock: 0,
            fifo_cfg: 0,
            cadence: I2s::DEFAULT_CADENCE,
            countdown: I2s::DEFAULT_CADENCE,
            sink: Box::new(NullSink),
            intcon: intcon,
        }
    }

    /// Attaches the host-side audio sink.
    pub fn set_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.sink = sink;
    }

    /// Reconfigures how many instructions pass between sample
    /// requests. Derived from the configured sample rate by the
    /// front-end.
    pub fn set_cadence(&mut self, instructions: u32) {
        self.cadence = instructions.max(1);
        self.countdown = self.cadence;
    }

    /// Advances the sample-request cadence by one instruction.
    pub fn tick(&mut self) {
        if 0 == (self.config & CONFIG_ENABLE) || 0 == (self.fifo_cfg & FIFO_CFG_IRQ_EN) {
            return;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            self.countdown = self.cadence;
            self.intcon.borrow_mut().assert_line(IRQ_IIS);
        }
    }

    /// Reads an I2S register.
    pub fn read32(&self, offset: u32) -> u32 {
        match offset {
            0x00 => self.config,
            0x04 => self.clock,
            0x40 => self.fifo_cfg,
            0x44 => FIFO_FREE_SLOTS << 16,
            _ => {
                trace!("I2S: read from unhandled register {:#04X}.", offset);
                0
            },
        }
    }

    /// Writes an I2S register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        match offset {
            0x00 => self.config = data,
            0x04 => self.clock = data,
            0x40 => self.fifo_cfg = data,
            0x80 => {
                let samples = [data as i16, (data >> 16) as i16];
                self.sink.push(&samples);
            },
            _ => trace!("I2S: write {:#010X} to unhandled register {:#04X}.", data, offset),
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::frontend::AudioSink;
    use super::super::irq::IntCon;

    struct CaptureSink(Rc<RefCell<Vec<i16>>>);

    impl AudioSink for CaptureSink {
        fn push(&mut self, samples: &[i16]) {
            self.0.borrow_mut().extend_from_slice(samples);
        }
    }

    #[test]
    fn fifo_writes_reach_the_sink() {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        let mut i2s = I2s::new(ic);
        let captured = Rc::new(RefCell::new(Vec::new()));
        i2s.set_sink(Box::new(CaptureSink(captured.clone())));

        i2s.write32(0x80, 0x8000_7FFF);
        assert_eq!(*captured.borrow(), vec![32767, -32768]);
    }

    #[test]
    fn cadence_fires_only_when_enabled() {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        let mut i2s = I2s::new(ic.clone());
        i2s.set_cadence(4);
        for _ in 0..8 { i2s.tick(); }
        assert_eq!(ic.borrow().read32(0x010), 0);

        i2s.write32(0x00, 1 << 31);
        i2s.write32(0x40, 1 << 9);
        for _ in 0..4 { i2s.tick(); }
        assert_eq!(ic.borrow().read32(0x010), 1 << IRQ_IIS);
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
