// License below.
//! Implements the I2C master and its two on-board slaves, the
//! power management unit and the audio codec.
//!
//! Register layout (offsets from 0x7000C000):
//!
//! ```text
//! 0x00  CTRL    W: bit 7 start, bit 8 irq enable, bit 5 read,
//!               bits 1..0 byte count - 1
//! 0x04  ADDR    R/W: 7-bit slave address
//! 0x0C  DATA0   R/W  0x14  DATA2   R/W
//! 0x10  DATA1   R/W  0x18  DATA3   R/W
//! 0x1C  STATUS  R: bit 7 done (W1C), bit 6 busy (always clear)
//! ```
//!
//! Transfers complete at the moment the start bit is written; the
//! done bit and the optional interrupt are the only timing firmware
//! can observe.
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use super::irq::{IntCon, IRQ_I2C};

const CTRL_COUNT_MASK: u32 = 0b11;
const CTRL_READ:  u32 = 1 << 5;
const CTRL_START: u32 = 1 << 7;
const CTRL_IRQ_EN: u32 = 1 << 8;

const STATUS_DONE: u32 = 1 << 7;

/// I2C address of the power management unit.
pub const ADDR_PMU: u8 = 0x08;

/// I2C address of the audio codec.
pub const ADDR_CODEC: u8 = 0x1A;

/// Fixed identification byte of the PMU's register 0.
pub const PMU_ID: u8 = 0x35;


/// A slave device on the I2C bus.
///
/// Each slave keeps a register-index cursor: a bare register write
/// moves the cursor, a longer write also stores data, and reads
/// return data at the cursor.
pub trait I2cSlave {
    /// Handles a master-to-slave transfer.
    fn write(&mut self, data: &[u8]);

    /// Handles a slave-to-master transfer.
    fn read(&mut self, data: &mut [u8]);
}


/// The power management unit: an 8-bit register file behind a
/// one-byte sub-address.
pub struct PmuSlave {
    regs: [u8; 256],
    cursor: u8,
}

impl PmuSlave {
    /// Creates the PMU with its ID register preset.
    pub fn new() -> PmuSlave {
        let mut regs = [0u8; 256];
        regs[0] = PMU_ID;
        PmuSlave { regs: regs, cursor: 0 }
    }
}

impl I2cSlave for PmuSlave {
    fn write(&mut self, data: &[u8]) {
        if data.is_empty() { return; }
        self.cursor = data[0];
        for (i, &b) in data[1..].iter().enumerate() {
            let reg = self.cursor.wrapping_add(i as u8);
            if reg == 0 { continue; } // The ID register is fixed.
            self.regs[reg as usize] = b;
        }
    }

    fn read(&mut self, data: &mut [u8]) {
        for (i, b) in data.iter_mut().enumerate() {
            *b = self.regs[self.cursor.wrapping_add(i as u8) as usize];
        }
    }
}


/// The audio codec: 64 registers of up to 9 bits, written as a
/// 7-bit sub-address plus data packed into two bytes.
pub struct CodecSlave {
    regs: [u16; 64],
    cursor: u8,
}

impl CodecSlave {
    /// Creates the codec with all registers cleared.
    pub fn new() -> CodecSlave {
        CodecSlave { regs: [0; 64], cursor: 0 }
    }
}

impl I2cSlave for CodecSlave {
    fn write(&mut self, data: &[u8]) {
        match data.len() {
            0 => {},
            1 => self.cursor = (data[0] >> 1) & 0x3F,
            _ => {
                self.cursor = (data[0] >> 1) & 0x3F;
                let value = (((data[0] & 1) as u16) << 8) | (data[1] as u16);
                self.regs[self.cursor as usize] = value;
            },
        }
    }

    fn read(&mut self, data: &mut [u8]) {
        let value = self.regs[self.cursor as usize];
        if !data.is_empty() { data[0] = (value >> 8) as u8; }
        if data.len() > 1 { data[1] = value as u8; }
    }
}


/// Implements the I2C master's register file and slave table.
pub struct I2cBus {
    ctrl: u32,
    addr: u32,
    data: [u8; 4],
    status: u32,
    slaves: Vec<(u8, Box<dyn I2cSlave>)>,
    intcon: Rc<RefCell<IntCon>>,
}

impl I2cBus {
    /// Creates the master with the PMU and codec attached.
    pub fn new(intcon: Rc<RefCell<IntCon>>) -> I2cBus {
        I2cBus {
            ctrl: 0,
            addr: 0,
            data: [0; 4],
            status: 0,
            slaves: vec![
                (ADDR_PMU, Box::new(PmuSlave::new()) as Box<dyn I2cSlave>),
                (ADDR_CODEC, Box::new(CodecSlave::new()) as Box<dyn I2cSlave>),
            ],
            intcon: intcon,
        }
    }

    /// Reads a controller register.
    pub fn read32(&self, offset: u32) -> u32 {
        match offset {
            0x00 => self.ctrl,
            0x04 => self.addr,
            0x0C => self.data[0] as u32,
            0x10 => self.data[1] as u32,
            0x14 => self.data[2] as u32,
            0x18 => self.data[3] as u32,
            0x1C => self.status,
            _ => {
                trace!("I2C: read from unhandled register {:#04X}.", offset);
                0
            },
        }
    }

    /// Writes a controller register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        match offset {
            0x00 => {
                self.ctrl = data & !CTRL_START;
                if 0 != (data & CTRL_START) {
                    self.transfer(data);
                }
            },
            0x04 => self.addr = data & 0x7F,
            0x0C => self.data[0] = data as u8,
            0x10 => self.data[1] = data as u8,
            0x14 => self.data[2] = data as u8,
            0x18 => self.data[3] = data as u8,
            0x1C => self.status &= !(data & STATUS_DONE),
            _ => trace!("I2C: write {:#010X} to unhandled register {:#04X}.", data, offset),
        }
    }

    fn transfer(&mut self, ctrl: u32) {
        let count = ((ctrl & CTRL_COUNT_MASK) as usize) + 1;
        let target = self.addr as u8;
        let slave = self.slaves.iter_mut().find(|&&mut (a, _)| a == target);

        match slave {
            Some(&mut (_, ref mut slave)) => {
                if 0 != (ctrl & CTRL_READ) {
                    let mut buf = [0u8; 4];
                    slave.read(&mut buf[..count]);
                    self.data[..count].copy_from_slice(&buf[..count]);
                } else {
                    let buf = self.data;
                    slave.write(&buf[..count]);
                }
            },
            None => {
                // No acknowledge; reads float high.
                trace!("I2C: no slave at address {:#04X}.", target);
                if 0 != (ctrl & CTRL_READ) {
                    for b in self.data[..count].iter_mut() { *b = 0xFF; }
                }
            },
        }

        self.status |= STATUS_DONE;
        if 0 != (ctrl & CTRL_IRQ_EN) {
            self.intcon.borrow_mut().assert_line(IRQ_I2C);
        }
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
