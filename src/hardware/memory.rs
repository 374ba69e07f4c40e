// License below.
//! Implements the PP5020 address map and the raw RAM backing stores.
#![warn(missing_docs)]

use byteorder::{ByteOrder, LittleEndian};


/// Address of the first byte of the boot region.
pub const BOOT_FIRST: u32 = 0x00000000;

/// Address of the last byte of the boot region.
pub const BOOT_LAST: u32 = 0x0001FFFF;

/// Length of the boot region in bytes.
pub const BOOT_LEN: u32 = (BOOT_LAST + 1) - BOOT_FIRST;

/// Address of the first byte of SDRAM.
pub const SDRAM_FIRST: u32 = 0x10000000;

/// Address of the last byte of SDRAM.
pub const SDRAM_LAST: u32 = 0x11FFFFFF;

/// Length of the SDRAM window in bytes.
///
/// A smaller configured SDRAM chip mirrors within this window.
pub const SDRAM_WINDOW_LEN: u32 = (SDRAM_LAST + 1) - SDRAM_FIRST;

/// Address of the first byte of the LCD main write path.
pub const LCD_MAIN_FIRST: u32 = 0x30000000;

/// Address of the last byte of the LCD main write path.
pub const LCD_MAIN_LAST: u32 = 0x3007FFFF;

/// Address of the first byte of IRAM.
pub const IRAM_FIRST: u32 = 0x40000000;

/// Address of the last byte of IRAM.
pub const IRAM_LAST: u32 = 0x40017FFF;

/// Length of IRAM in bytes (96 KiB).
pub const IRAM_LEN: u32 = (IRAM_LAST + 1) - IRAM_FIRST;

/// Address of the first byte of the core SoC peripheral block.
pub const CORE_REGS_FIRST: u32 = 0x60000000;

/// Address of the last byte of the core SoC peripheral block.
pub const CORE_REGS_LAST: u32 = 0x6000FFFF;

/// Address of the first byte of the device peripheral block.
pub const DEV_REGS_FIRST: u32 = 0x70000000;

/// Address of the last byte of the device peripheral block.
pub const DEV_REGS_LAST: u32 = 0x7000FFFF;

/// Address of the first byte of the ATA/IDE register window.
pub const ATA_REGS_FIRST: u32 = 0xC3000000;

/// Address of the last byte of the ATA/IDE register window.
pub const ATA_REGS_LAST: u32 = 0xC30003FF;


/// Maps global physical addresses to specialised local addresses.
///
/// The local addresses always start from 0.
pub enum PhysicalAddress {
    /// Boot region, writable RAM optionally seeded from a boot ROM image.
    Boot(u32),
    /// SDRAM, 32 or 64 MiB.
    Sdram(u32),
    /// LCD main write path.
    LcdMain(u32),
    /// On-chip fast IRAM.
    Iram(u32),
    /// Core SoC peripherals (proc-ID, mailbox, intcon, timers, DMA, GPIO, ...).
    CoreRegs(u32),
    /// Device peripherals (device-init, GPO32, I2S, I2C, wheel, LCD bridge).
    DevRegs(u32),
    /// ATA/IDE register window.
    AtaRegs(u32),
    /// Everything else. Reads zero, drops writes.
    Unmapped(u32),
}

impl PhysicalAddress {
    /// Converts a global physical address to a local address.
    pub fn from_u32(p: u32) -> PhysicalAddress {
        match p {
            BOOT_FIRST      ..= BOOT_LAST      => PhysicalAddress::Boot(p - BOOT_FIRST),
            SDRAM_FIRST     ..= SDRAM_LAST     => PhysicalAddress::Sdram(p - SDRAM_FIRST),
            LCD_MAIN_FIRST  ..= LCD_MAIN_LAST  => PhysicalAddress::LcdMain(p - LCD_MAIN_FIRST),
            IRAM_FIRST      ..= IRAM_LAST      => PhysicalAddress::Iram(p - IRAM_FIRST),
            CORE_REGS_FIRST ..= CORE_REGS_LAST => PhysicalAddress::CoreRegs(p - CORE_REGS_FIRST),
            DEV_REGS_FIRST  ..= DEV_REGS_LAST  => PhysicalAddress::DevRegs(p - DEV_REGS_FIRST),
            ATA_REGS_FIRST  ..= ATA_REGS_LAST  => PhysicalAddress::AtaRegs(p - ATA_REGS_FIRST),
            _ => PhysicalAddress::Unmapped(p),
        }
    }
}


/// A zero-initialised, byte-addressable RAM block.
///
/// All typed accessors are little-endian and mirror modulo the
/// block length, so a 32 MiB chip behind a 64 MiB window behaves
/// like the decoded-but-unconnected address lines of the real bus.
/// Word and halfword accessors expect pre-aligned offsets; the bus
/// masks and rotates before calling in here.
pub struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    /// Creates a zero-filled RAM of `len` bytes.
    pub fn new(len: usize) -> Ram {
        Ram { bytes: vec![0u8; len] }
    }

    /// Length of the backing store in bytes.
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Copies `data` into the RAM starting at `offs`.
    ///
    /// Data beyond the end of the block is silently dropped,
    /// like a bus master writing past the last address line.
    pub fn load(&mut self, offs: usize, data: &[u8]) {
        if offs >= self.bytes.len() { return; }
        let n = data.len().min(self.bytes.len() - offs);
        self.bytes[offs..offs + n].copy_from_slice(&data[..n]);
    }

    /// Reads a single byte.
    pub fn read_byte(&self, offs: u32) -> u8 {
        self.bytes[(offs as usize) % self.bytes.len()]
    }

    /// Writes a single byte.
    pub fn write_byte(&mut self, offs: u32, data: u8) {
        let len = self.bytes.len();
        self.bytes[(offs as usize) % len] = data;
    }

    /// Reads a halfword from a 2-aligned offset.
    pub fn read_halfword(&self, offs: u32) -> u16 {
        let i = ((offs & !0b01) as usize) % self.bytes.len();
        LittleEndian::read_u16(&self.bytes[i..])
    }

    /// Writes a halfword to a 2-aligned offset.
    pub fn write_halfword(&mut self, offs: u32, data: u16) {
        let i = ((offs & !0b01) as usize) % self.bytes.len();
        LittleEndian::write_u16(&mut self.bytes[i..], data);
    }

    /// Reads a word from a 4-aligned offset.
    pub fn read_word(&self, offs: u32) -> u32 {
        let i = ((offs & !0b11) as usize) % self.bytes.len();
        LittleEndian::read_u32(&self.bytes[i..])
    }

    /// Writes a word to a 4-aligned offset.
    pub fn write_word(&mut self, offs: u32, data: u32) {
        let i = ((offs & !0b11) as usize) % self.bytes.len();
        LittleEndian::write_u32(&mut self.bytes[i..], data);
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ram_is_little_endian() {
        let mut ram = Ram::new(0x100);
        ram.write_word(0x10, 0x11223344);
        assert_eq!(ram.read_byte(0x10), 0x44);
        assert_eq!(ram.read_byte(0x13), 0x11);
        assert_eq!(ram.read_halfword(0x12), 0x1122);
    }

    #[test]
    fn ram_mirrors_modulo_length() {
        let mut ram = Ram::new(0x100);
        ram.write_word(0x0, 0xDEADBEEF);
        assert_eq!(ram.read_word(0x100), 0xDEADBEEF);
        assert_eq!(ram.read_word(0x700), 0xDEADBEEF);
    }

    #[test]
    fn address_decode_matches_map() {
        match PhysicalAddress::from_u32(0x40000218) {
            PhysicalAddress::Iram(p) => assert_eq!(p, 0x218),
            _ => panic!("IRAM address decoded to the wrong region"),
        }
        match PhysicalAddress::from_u32(0xC30001E0) {
            PhysicalAddress::AtaRegs(p) => assert_eq!(p, 0x1E0),
            _ => panic!("ATA address decoded to the wrong region"),
        }
        match PhysicalAddress::from_u32(0x20000000) {
            PhysicalAddress::Unmapped(p) => assert_eq!(p, 0x20000000),
            _ => panic!("hole in the map decoded to a region"),
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
