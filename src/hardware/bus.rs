// License below.
//! Implements the PP5020's memory bus.
//!
//! The bus decodes every access to one of the regions in
//! [`memory::PhysicalAddress`](super::memory::PhysicalAddress) and
//! dispatches it. RAM regions accept any width at byte granularity;
//! peripheral blocks speak 32-bit words (narrow reads extract the
//! addressed bytes, narrow writes are dropped), except where a
//! device defines narrower ports — the ATA data port is 16-bit and
//! the LCD paths take 16-bit pixels.
//!
//! There are no bus faults on this SoC: reads from unmapped
//! addresses return zero and writes to them are dropped. Unaligned
//! word reads return the architecturally rotated value.
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use super::ata::Ata;
use super::disk::DiskImage;
use super::dma::Dma;
use super::gpio::Gpio;
use super::i2c::I2cBus;
use super::i2s::I2s;
use super::irq::IntCon;
use super::lcd::Lcd;
use super::memory::*;
use super::syscon::{DevCon, SysCon};
use super::timer::Timers;
use super::wheel::Wheel;

/// Implements the memory and bus system of the PP5020.
pub struct Bus {
    boot: Ram,
    sdram: Ram,
    iram: Ram,

    /// The interrupt controller, shared with every device that
    /// raises lines on it.
    pub intcon: Rc<RefCell<IntCon>>,

    /// The system timers.
    pub timers: Timers,
    /// The ATA/IDE controller.
    pub ata: Ata,
    /// The LCD controller.
    pub lcd: Lcd,
    /// The I2C master.
    pub i2c: I2cBus,
    /// The I2S audio unit.
    pub i2s: I2s,
    /// The GPIO ports.
    pub gpio: Gpio,
    /// The DMA engine.
    pub dma: Dma,
    /// The click wheel.
    pub wheel: Wheel,
    /// Core-side miscellaneous registers.
    pub syscon: SysCon,
    /// Device-side miscellaneous registers.
    pub devcon: DevCon,
}

impl Bus {
    /// Creates the bus with zeroed RAM and idle peripherals.
    ///
    /// # Params
    /// - `sdram_len`: Configured SDRAM size in bytes.
    /// - `intcon`: The shared interrupt controller.
    pub fn new(sdram_len: usize, intcon: Rc<RefCell<IntCon>>) -> Bus {
        Bus {
            boot: Ram::new(BOOT_LEN as usize),
            sdram: Ram::new(sdram_len),
            iram: Ram::new(IRAM_LEN as usize),

            timers: Timers::new(intcon.clone()),
            ata: Ata::new(DiskImage::blank(0), intcon.clone()),
            lcd: Lcd::new(),
            i2c: I2cBus::new(intcon.clone()),
            i2s: I2s::new(intcon.clone()),
            gpio: Gpio::new(intcon.clone()),
            dma: Dma::new(intcon.clone()),
            wheel: Wheel::new(intcon.clone()),
            syscon: SysCon::new(),
            devcon: DevCon::new(),

            intcon: intcon,
        }
    }

    /// Copies a block of bytes into memory, e.g. a firmware image.
    ///
    /// Bytes landing outside the RAM regions are written through
    /// the normal byte path and follow its drop rules.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        match PhysicalAddress::from_u32(addr) {
            PhysicalAddress::Boot(p)  => self.boot.load(p as usize, bytes),
            PhysicalAddress::Sdram(p) => self.sdram.load(p as usize, bytes),
            PhysicalAddress::Iram(p)  => self.iram.load(p as usize, bytes),
            _ => {
                for (i, &b) in bytes.iter().enumerate() {
                    self.write8(addr.wrapping_add(i as u32), b as u32);
                }
            },
        }
    }

    /// Loads a zero-extended byte.
    pub fn read8(&mut self, addr: u32) -> u32 {
        match PhysicalAddress::from_u32(addr) {
            PhysicalAddress::Boot(p)     => self.boot.read_byte(p) as u32,
            PhysicalAddress::Sdram(p)    => self.sdram.read_byte(p) as u32,
            PhysicalAddress::Iram(p)     => self.iram.read_byte(p) as u32,
            PhysicalAddress::LcdMain(p)  => self.lcd.main_read(p, 1),
            PhysicalAddress::AtaRegs(p)  => self.ata.read(p & !0b11, 1) & 0xFF,
            PhysicalAddress::CoreRegs(p) => (self.core_read32(p & !0b11) >> (8 * (p & 0b11))) & 0xFF,
            PhysicalAddress::DevRegs(p)  => (self.dev_read32(p & !0b11) >> (8 * (p & 0b11))) & 0xFF,
            PhysicalAddress::Unmapped(p) => { trace!("Byte read from unmapped {:#010X}.", p); 0 },
        }
    }

    /// Loads a zero-extended halfword.
    ///
    /// The address is rounded down to the next halfword boundary.
    pub fn read16(&mut self, addr: u32) -> u32 {
        match PhysicalAddress::from_u32(addr) {
            PhysicalAddress::Boot(p)     => self.boot.read_halfword(p) as u32,
            PhysicalAddress::Sdram(p)    => self.sdram.read_halfword(p) as u32,
            PhysicalAddress::Iram(p)     => self.iram.read_halfword(p) as u32,
            PhysicalAddress::LcdMain(p)  => self.lcd.main_read(p, 2),
            PhysicalAddress::AtaRegs(p)  => self.ata.read(p & !0b11, 2) & 0xFFFF,
            PhysicalAddress::CoreRegs(p) => (self.core_read32(p & !0b11) >> (8 * (p & 0b10))) & 0xFFFF,
            PhysicalAddress::DevRegs(p)  => (self.dev_read32(p & !0b11) >> (8 * (p & 0b10))) & 0xFFFF,
            PhysicalAddress::Unmapped(p) => { trace!("Halfword read from unmapped {:#010X}.", p); 0 },
        }
    }

    /// Loads a word.
    ///
    /// A misaligned address loads the enclosing aligned word and
    /// rotates it right by the misalignment, the way an ARMv4 core
    /// sees it.
    pub fn read32(&mut self, addr: u32) -> u32 {
        let aligned = addr & !0b11;
        let value = match PhysicalAddress::from_u32(aligned) {
            PhysicalAddress::Boot(p)     => self.boot.read_word(p),
            PhysicalAddress::Sdram(p)    => self.sdram.read_word(p),
            PhysicalAddress::Iram(p)     => self.iram.read_word(p),
            PhysicalAddress::LcdMain(p)  => self.lcd.main_read(p, 4),
            PhysicalAddress::AtaRegs(p)  => self.ata.read(p, 4),
            PhysicalAddress::CoreRegs(p) => self.core_read32(p),
            PhysicalAddress::DevRegs(p)  => self.dev_read32(p),
            PhysicalAddress::Unmapped(p) => { trace!("Word read from unmapped {:#010X}.", p); 0 },
        };
        value.rotate_right(8 * (addr & 0b11))
    }

    /// Stores a byte.
    pub fn write8(&mut self, addr: u32, data: u32) {
        let byte = data & 0xFF;
        match PhysicalAddress::from_u32(addr) {
            PhysicalAddress::Boot(p)     => self.boot.write_byte(p, byte as u8),
            PhysicalAddress::Sdram(p)    => self.sdram.write_byte(p, byte as u8),
            PhysicalAddress::Iram(p)     => self.iram.write_byte(p, byte as u8),
            PhysicalAddress::AtaRegs(p)  => self.ata.write(p & !0b11, 1, byte),
            PhysicalAddress::LcdMain(p)  |
            PhysicalAddress::CoreRegs(p) |
            PhysicalAddress::DevRegs(p)  => trace!("Dropped byte write to peripheral offset {:#07X}.", p),
            PhysicalAddress::Unmapped(p) => trace!("Dropped byte write to unmapped {:#010X}.", p),
        }
    }

    /// Stores a halfword.
    ///
    /// The address is rounded down to the next halfword boundary.
    pub fn write16(&mut self, addr: u32, data: u32) {
        let half = data & 0xFFFF;
        match PhysicalAddress::from_u32(addr) {
            PhysicalAddress::Boot(p)     => self.boot.write_halfword(p, half as u16),
            PhysicalAddress::Sdram(p)    => self.sdram.write_halfword(p, half as u16),
            PhysicalAddress::Iram(p)     => self.iram.write_halfword(p, half as u16),
            PhysicalAddress::LcdMain(p)  => self.lcd.main_write(p, 2, half),
            PhysicalAddress::AtaRegs(p)  => self.ata.write(p & !0b11, 2, half),
            PhysicalAddress::DevRegs(p) if (0x8A00..0x8C00).contains(&p) => {
                self.lcd.bridge_write(p - 0x8A00, 2, half);
            },
            PhysicalAddress::CoreRegs(p) |
            PhysicalAddress::DevRegs(p)  => trace!("Dropped halfword write to peripheral offset {:#07X}.", p),
            PhysicalAddress::Unmapped(p) => trace!("Dropped halfword write to unmapped {:#010X}.", p),
        }
    }

    /// Stores a word.
    ///
    /// The address is rounded down to the next word boundary.
    pub fn write32(&mut self, addr: u32, data: u32) {
        match PhysicalAddress::from_u32(addr & !0b11) {
            PhysicalAddress::Boot(p)     => self.boot.write_word(p, data),
            PhysicalAddress::Sdram(p)    => self.sdram.write_word(p, data),
            PhysicalAddress::Iram(p)     => self.iram.write_word(p, data),
            PhysicalAddress::LcdMain(p)  => self.lcd.main_write(p, 4, data),
            PhysicalAddress::AtaRegs(p)  => self.ata.write(p, 4, data),
            PhysicalAddress::CoreRegs(p) => self.core_write32(p, data),
            PhysicalAddress::DevRegs(p)  => self.dev_write32(p, data),
            PhysicalAddress::Unmapped(p) => trace!("Dropped word write to unmapped {:#010X}.", p),
        }
    }

    /// Decodes a 32-bit read within the core peripheral block.
    fn core_read32(&mut self, p: u32) -> u32 {
        match p {
            0x4000..=0x41FF => self.intcon.borrow().read32(p - 0x4000),
            0x5000..=0x50FF => self.timers.read32(p - 0x5000),
            0xB000..=0xBFFF => self.dma.read32(p - 0xB000),
            0xD000..=0xDFFF => self.gpio.read32(p - 0xD000),
            _ => self.syscon.read32(p),
        }
    }

    /// Decodes a 32-bit write within the core peripheral block.
    fn core_write32(&mut self, p: u32, data: u32) {
        match p {
            0x4000..=0x41FF => self.intcon.borrow_mut().write32(p - 0x4000, data),
            0x5000..=0x50FF => self.timers.write32(p - 0x5000, data),
            0xB000..=0xBFFF => self.dma.write32(p - 0xB000, data),
            0xD000..=0xDFFF => self.gpio.write32(p - 0xD000, data),
            _ => self.syscon.write32(p, data),
        }
    }

    /// Decodes a 32-bit read within the device peripheral block.
    fn dev_read32(&mut self, p: u32) -> u32 {
        match p {
            0x2800..=0x28FF => self.i2s.read32(p - 0x2800),
            0x8A00..=0x8BFF => self.lcd.bridge_read(p - 0x8A00, 4),
            0xC000..=0xC0FF => self.i2c.read32(p - 0xC000),
            0xC100..=0xC1FF => self.wheel.read32(p - 0xC100),
            _ => self.devcon.read32(p),
        }
    }

    /// Decodes a 32-bit write within the device peripheral block.
    fn dev_write32(&mut self, p: u32, data: u32) {
        match p {
            0x2800..=0x28FF => self.i2s.write32(p - 0x2800, data),
            0x8A00..=0x8BFF => self.lcd.bridge_write(p - 0x8A00, 4, data),
            0xC000..=0xC0FF => self.i2c.write32(p - 0xC000, data),
            0xC100..=0xC1FF => self.wheel.write32(p - 0xC100, data),
            _ => self.devcon.write32(p, data),
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::irq::IntCon;

    fn bus() -> Bus {
        Bus::new(32 * 1024 * 1024, Rc::new(RefCell::new(IntCon::new())))
    }

    #[test]
    fn sdram_byte_stream_round_trips_at_any_alignment() {
        let mut bus = bus();
        let stream: Vec<u8> = (0u32..64).map(|i| (i * 7 + 3) as u8).collect();
        for start in 0x10000000u32..0x10000004 {
            for (i, &b) in stream.iter().enumerate() {
                bus.write8(start + i as u32, b as u32);
            }
            for (i, &b) in stream.iter().enumerate() {
                assert_eq!(bus.read8(start + i as u32), b as u32);
            }
        }
    }

    #[test]
    fn unaligned_word_reads_rotate() {
        let mut bus = bus();
        bus.write32(0x10000010, 0x11223344);
        assert_eq!(bus.read32(0x10000010), 0x11223344);
        assert_eq!(bus.read32(0x10000011), 0x44112233);
        assert_eq!(bus.read32(0x10000012), 0x33441122);
        assert_eq!(bus.read32(0x10000013), 0x22334411);
    }

    #[test]
    fn unmapped_reads_zero_and_writes_drop() {
        let mut bus = bus();
        bus.write32(0x20000000, 0xDEADBEEF);
        assert_eq!(bus.read32(0x20000000), 0);
        assert_eq!(bus.read8(0x90000000), 0);
        assert_eq!(bus.read16(0x50000000), 0);
    }

    #[test]
    fn smaller_sdram_mirrors_within_the_window() {
        let mut bus = Bus::new(2 * 1024 * 1024, Rc::new(RefCell::new(IntCon::new())));
        bus.write32(0x10000000, 0xCAFEBABE);
        assert_eq!(bus.read32(0x10200000), 0xCAFEBABE);
    }

    #[test]
    fn interrupt_controller_is_reachable_through_the_bus() {
        let mut bus = bus();
        bus.write32(0x60004024, 1 << 23);
        assert_eq!(bus.read32(0x60004020), 1 << 23);
        bus.intcon.borrow_mut().assert_line(23);
        assert_eq!(bus.read32(0x60004000), 1 << 23);
        // W1C through the bus.
        bus.write32(0x60004000, 1 << 23);
        assert_eq!(bus.read32(0x60004000), 0);
    }

    #[test]
    fn ata_register_stride_and_narrow_reads() {
        let mut bus = bus();
        bus.write32(0xC30001E8, 0x12345604);
        assert_eq!(bus.read32(0xC30001E8), 0x04, "task file registers are byte wide");
        assert_eq!(bus.read8(0xC30001E8), 0x04);
    }

    #[test]
    fn narrow_peripheral_writes_are_dropped() {
        let mut bus = bus();
        bus.write8(0x60004024, 0xFF);
        bus.write16(0x60004024, 0xFFFF);
        assert_eq!(bus.read32(0x60004020), 0);
    }

    #[test]
    fn load_reaches_iram_and_sdram() {
        let mut bus = bus();
        bus.load(0x40000000, &[1, 2, 3, 4]);
        assert_eq!(bus.read32(0x40000000), 0x04030201);
        bus.load(0x10000100, &[5, 6]);
        assert_eq!(bus.read16(0x10000100), 0x0605);
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
