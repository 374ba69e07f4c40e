// License below.
//! Implements the ATA/IDE controller.
//!
//! The task file sits at 4-byte stride from 0xC3000000 (the canonical
//! offsets are listed below); the 16-bit data port is backed by a
//! 512-byte sector buffer with a cursor, and a small state machine
//! tracks whether the host is currently reading or writing sector
//! data. Commands complete instantly; only the DRQ handshake is
//! spread over time, because firmware polls it word by word.
//!
//! ```text
//! 0x1E0  DATA (16-bit)      0x1F0  LBA_MID
//! 0x1E4  ERROR / FEATURE    0x1F4  LBA_HIGH
//! 0x1E8  SECTOR_COUNT       0x1F8  DEVICE
//! 0x1EC  LBA_LOW            0x1FC  STATUS / COMMAND
//! 0x3F8  CONTROL            0x3FC  ALT_STATUS
//! ```
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use byteorder::{ByteOrder, LittleEndian};

use super::disk::{DiskImage, SECTOR_SIZE};
use super::irq::{IntCon, IRQ_IDE};

// Status register bits.
const STATUS_BSY:  u8 = 0x80;
const STATUS_DRDY: u8 = 0x40;
const STATUS_DRQ:  u8 = 0x08;
const STATUS_ERR:  u8 = 0x01;

// Error register bits.
const ERROR_IDNF: u8 = 0x10;
const ERROR_ABRT: u8 = 0x04;

// Device control bits.
const CONTROL_NIEN: u8 = 0x02;

#[derive(Debug, PartialEq, Clone, Copy)]
enum AtaState {
    #[doc = "No data transfer in flight."]       Idle,
    #[doc = "The host is reading sector data."]  DataIn,
    #[doc = "The host is writing sector data."]  DataOut,
}

/// Implements the ATA controller's register file and command
/// state machine.
pub struct Ata {
    error: u8,
    feature: u8,
    nsector: u8,
    sector: u8,
    lcyl: u8,
    hcyl: u8,
    select: u8,
    status: u8,
    control: u8,

    // Previous task file values, for the 48-bit LBA snapshot.
    hob_nsector: u8,
    hob_sector: u8,
    hob_lcyl: u8,
    hob_hcyl: u8,

    buf: [u8; SECTOR_SIZE],
    buf_pos: usize,
    state: AtaState,
    lba: u64,
    remaining: u32,

    disk: DiskImage,
    intcon: Rc<RefCell<IntCon>>,
}

impl Ata {
    /// Creates the controller in front of the given disk image.
    pub fn new(disk: DiskImage, intcon: Rc<RefCell<IntCon>>) -> Ata {
        Ata {
            error: 0,
            feature: 0,
            nsector: 0,
            sector: 0,
            lcyl: 0,
            hcyl: 0,
            select: 0,
            status: STATUS_DRDY,
            control: 0,

            hob_nsector: 0,
            hob_sector: 0,
            hob_lcyl: 0,
            hob_hcyl: 0,

            buf: [0; SECTOR_SIZE],
            buf_pos: 0,
            state: AtaState::Idle,
            lba: 0,
            remaining: 0,

            disk: disk,
            intcon: intcon,
        }
    }

    /// Replaces the disk image behind the controller.
    pub fn set_disk(&mut self, disk: DiskImage) {
        self.disk = disk;
    }

    /// Borrows the disk image, e.g. for firmware header parsing.
    pub fn disk(&self) -> &DiskImage { &self.disk }

    /// Reads an ATA register.
    ///
    /// Narrow reads hit the low byte of the addressed register;
    /// only the data port carries 16 significant bits.
    pub fn read(&mut self, offset: u32, _width: u32) -> u32 {
        match offset {
            0x1E0 => self.read_data() as u32,
            0x1E4 => self.error as u32,
            0x1E8 => self.nsector as u32,
            0x1EC => self.sector as u32,
            0x1F0 => self.lcyl as u32,
            0x1F4 => self.hcyl as u32,
            0x1F8 => self.select as u32,
            0x1FC => {
                // Reading the status register acknowledges the
                // interrupt; the alternate register does not.
                self.intcon.borrow_mut().clear_line(IRQ_IDE);
                self.status as u32
            },
            0x3F8 | 0x3FC => self.status as u32,
            _ => {
                trace!("ATA: read from unhandled register {:#05X}.", offset);
                0
            },
        }
    }

    /// Writes an ATA register.
    pub fn write(&mut self, offset: u32, _width: u32, data: u32) {
        let byte = data as u8;
        match offset {
            0x1E0 => self.write_data(data as u16),
            0x1E4 => self.feature = byte,
            0x1E8 => { self.hob_nsector = self.nsector; self.nsector = byte; },
            0x1EC => { self.hob_sector  = self.sector;  self.sector  = byte; },
            0x1F0 => { self.hob_lcyl    = self.lcyl;    self.lcyl    = byte; },
            0x1F4 => { self.hob_hcyl    = self.hcyl;    self.hcyl    = byte; },
            0x1F8 => self.select = byte,
            0x1FC => self.command(byte),
            0x3F8 | 0x3FC => self.control = byte,
            _ => trace!("ATA: write {:#010X} to unhandled register {:#05X}.", data, offset),
        }
    }

    /// Asserts the IDE interrupt unless nIEN gates it off.
    fn raise_irq(&mut self) {
        if 0 == (self.control & CONTROL_NIEN) {
            self.intcon.borrow_mut().assert_line(IRQ_IDE);
        }
    }

    fn lba28(&self) -> u64 {
        (((self.select & 0x0F) as u64) << 24)
        | ((self.hcyl as u64) << 16)
        | ((self.lcyl as u64) << 8)
        | (self.sector as u64)
    }

    fn count28(&self) -> u32 {
        if self.nsector == 0 { 256 } else { self.nsector as u32 }
    }

    fn lba48(&self) -> u64 {
        ((self.hob_hcyl as u64) << 40)
        | ((self.hob_lcyl as u64) << 32)
        | ((self.hob_sector as u64) << 24)
        | ((self.hcyl as u64) << 16)
        | ((self.lcyl as u64) << 8)
        | (self.sector as u64)
    }

    fn count48(&self) -> u32 {
        let n = ((self.hob_nsector as u32) << 8) | (self.nsector as u32);
        if n == 0 { 0x10000 } else { n }
    }

    fn command(&mut self, cmd: u8) {
        self.error = 0;
        self.status &= !(STATUS_ERR | STATUS_DRQ);
        trace!("ATA command {:#04X}.", cmd);

        match cmd {
            // IDENTIFY DEVICE
            0xEC => {
                self.fill_identify();
                self.begin_data_in(0, 1, false);
            },
            // READ SECTORS
            0x20 | 0x21 => {
                let (lba, count) = (self.lba28(), self.count28());
                self.begin_data_in(lba, count, true);
            },
            // READ SECTORS EXT
            0x24 => {
                let (lba, count) = (self.lba48(), self.count48());
                self.begin_data_in(lba, count, true);
            },
            // WRITE SECTORS
            0x30 | 0x31 => {
                let (lba, count) = (self.lba28(), self.count28());
                self.begin_data_out(lba, count);
            },
            // WRITE SECTORS EXT
            0x34 => {
                let (lba, count) = (self.lba48(), self.count48());
                self.begin_data_out(lba, count);
            },
            // FLUSH CACHE / FLUSH CACHE EXT
            0xE7 | 0xEA => {
                if let Err(e) = self.disk.flush() {
                    warn!("Disk flush failed: {}", e);
                }
                self.raise_irq();
            },
            // STANDBY / IDLE family and SET FEATURES: accepted no-ops.
            0xE0 | 0xE1 | 0xE2 | 0xE3 => {
                self.raise_irq();
            },
            0xEF => {
                trace!("ATA: SET FEATURES {:#04X} accepted.", self.feature);
                self.raise_irq();
            },
            _ => {
                warn!("ATA: unsupported command {:#04X} aborted.", cmd);
                self.error = ERROR_ABRT;
                self.status |= STATUS_ERR;
                self.raise_irq();
            },
        }
    }

    fn begin_data_in(&mut self, lba: u64, count: u32, from_disk: bool) {
        self.lba = lba;
        self.remaining = count;
        self.buf_pos = 0;
        if from_disk {
            self.load_sector();
        }
        self.status |= STATUS_DRQ;
        self.state = AtaState::DataIn;
    }

    fn begin_data_out(&mut self, lba: u64, count: u32) {
        self.lba = lba;
        self.remaining = count;
        self.buf_pos = 0;
        self.status |= STATUS_DRQ;
        self.state = AtaState::DataOut;
    }

    fn load_sector(&mut self) {
        if !self.disk.read_sector(self.lba, &mut self.buf) {
            warn!("ATA: read beyond the disk at LBA {:#X}.", self.lba);
            self.error |= ERROR_IDNF;
            self.status |= STATUS_ERR;
        }
    }

    fn read_data(&mut self) -> u16 {
        if self.state != AtaState::DataIn {
            return 0;
        }
        let word = LittleEndian::read_u16(&self.buf[self.buf_pos..]);
        self.buf_pos += 2;
        if self.buf_pos >= SECTOR_SIZE {
            self.remaining -= 1;
            if self.remaining > 0 {
                self.lba += 1;
                self.buf_pos = 0;
                self.load_sector();
            } else {
                self.status &= !STATUS_DRQ;
                self.state = AtaState::Idle;
                self.raise_irq();
            }
        }
        word
    }

    fn write_data(&mut self, data: u16) {
        if self.state != AtaState::DataOut {
            return;
        }
        LittleEndian::write_u16(&mut self.buf[self.buf_pos..], data);
        self.buf_pos += 2;
        if self.buf_pos >= SECTOR_SIZE {
            if !self.disk.write_sector(self.lba, &self.buf) {
                warn!("ATA: write beyond the disk at LBA {:#X}.", self.lba);
                self.error |= ERROR_IDNF;
                self.status |= STATUS_ERR;
            }
            self.remaining -= 1;
            if self.remaining > 0 {
                self.lba += 1;
                self.buf_pos = 0;
            } else {
                self.status &= !STATUS_DRQ;
                self.state = AtaState::Idle;
                self.raise_irq();
            }
        }
    }

    /// Builds the synthetic IDENTIFY DEVICE page in the sector buffer.
    fn fill_identify(&mut self) {
        self.buf = [0; SECTOR_SIZE];
        let sectors = self.disk.sector_count();
        let lba28 = sectors.min(0x0FFF_FFFF) as u32;

        self.put_id_word(0, 0x0040); // Fixed, non-removable device.
        self.put_id_word(1, sectors.min(16383) as u16);
        self.put_id_word(3, 16);
        self.put_id_word(6, 63);
        self.put_id_string(10, 20, "PODRS000000000000001");
        self.put_id_string(23, 8, "1.0");
        self.put_id_string(27, 40, "PODRS EMULATED HARD DISK");
        self.put_id_word(47, 0x8001);
        self.put_id_word(49, 1 << 9); // LBA capable.
        self.put_id_word(53, 0x0001);
        self.put_id_word(60, lba28 as u16);
        self.put_id_word(61, (lba28 >> 16) as u16);
        self.put_id_word(83, (1 << 14) | (1 << 10)); // LBA48 capable.
        self.put_id_word(86, 1 << 10);
        self.put_id_word(100, sectors as u16);
        self.put_id_word(101, (sectors >> 16) as u16);
        self.put_id_word(102, (sectors >> 32) as u16);
        self.put_id_word(103, (sectors >> 48) as u16);
    }

    fn put_id_word(&mut self, word: usize, data: u16) {
        LittleEndian::write_u16(&mut self.buf[word * 2..], data);
    }

    /// Stores an ASCII field with the pair-swapped byte order ATA
    /// identify pages use, space-padded to `chars` characters.
    fn put_id_string(&mut self, word: usize, chars: usize, s: &str) {
        let bytes = s.as_bytes();
        for i in 0..chars {
            let c = if i < bytes.len() { bytes[i] } else { b' ' };
            self.buf[word * 2 + (i ^ 1)] = c;
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::disk::DiskImage;
    use super::super::irq::IntCon;

    fn ata(sectors: usize) -> (Ata, Rc<RefCell<IntCon>>) {
        let ic = Rc::new(RefCell::new(IntCon::new()));
        (Ata::new(DiskImage::blank(sectors), ic.clone()), ic)
    }

    fn ide_pending(ic: &Rc<RefCell<IntCon>>) -> bool {
        0 != (ic.borrow().read32(0x010) & (1 << IRQ_IDE))
    }

    fn read_page(ata: &mut Ata) -> Vec<u16> {
        (0..256).map(|_| ata.read(0x1E0, 2) as u16).collect()
    }

    #[test]
    fn identify_reports_model_and_capacity() {
        let (mut ata, _ic) = ata(2048);
        ata.write(0x1FC, 4, 0xEC);
        assert_eq!(ata.read(0x3FC, 4) as u8 & STATUS_DRQ, STATUS_DRQ);

        let page = read_page(&mut ata);
        assert_eq!(ata.read(0x3FC, 4) as u8 & STATUS_DRQ, 0);

        // Un-swap the model field (words 27..46).
        let mut model = String::new();
        for w in 27..47 {
            model.push((page[w] >> 8) as u8 as char);
            model.push((page[w] & 0xFF) as u8 as char);
        }
        assert_eq!(model.trim_end(), "PODRS EMULATED HARD DISK");

        let lba28 = (page[60] as u32) | ((page[61] as u32) << 16);
        assert_eq!(lba28, 2048);
        let lba48 = (page[100] as u64) | ((page[101] as u64) << 16);
        assert_eq!(lba48, 2048);
        assert_eq!(page[83] & (1 << 10), 1 << 10);
    }

    #[test]
    fn write_then_read_round_trips() {
        let (mut ata, ic) = ata(64);

        // WRITE SECTORS, one sector at LBA 5.
        ata.write(0x1E8, 4, 1);
        ata.write(0x1EC, 4, 5);
        ata.write(0x1F0, 4, 0);
        ata.write(0x1F4, 4, 0);
        ata.write(0x1F8, 4, 0xE0);
        ata.write(0x1FC, 4, 0x30);
        for i in 0..256u32 {
            ata.write(0x1E0, 2, i & 0xFFFF);
        }
        assert!(ide_pending(&ic));
        assert_eq!(ata.read(0x1FC, 4) as u8 & STATUS_DRQ, 0);
        assert!(!ide_pending(&ic), "reading STATUS must acknowledge");

        // READ SECTORS back.
        ata.write(0x1E8, 4, 1);
        ata.write(0x1EC, 4, 5);
        ata.write(0x1FC, 4, 0x20);
        let page = read_page(&mut ata);
        for i in 0..256usize {
            assert_eq!(page[i] as u32, (i as u32) & 0xFFFF);
        }
    }

    #[test]
    fn multi_sector_read_refills_the_buffer() {
        let (mut ata, ic) = ata(16);
        {
            let mut sector = [0u8; SECTOR_SIZE];
            sector[0] = 0xAB;
            ata.disk.write_sector(3, &sector);
            sector[0] = 0xCD;
            ata.disk.write_sector(4, &sector);
        }
        ata.write(0x1E8, 4, 2);
        ata.write(0x1EC, 4, 3);
        ata.write(0x1F8, 4, 0xE0);
        ata.write(0x1FC, 4, 0x20);

        let first = ata.read(0x1E0, 2) as u16;
        assert_eq!(first & 0xFF, 0xAB);
        for _ in 1..256 { ata.read(0x1E0, 2); }
        assert!(!ide_pending(&ic), "interrupt only fires after the last sector");

        let second = ata.read(0x1E0, 2) as u16;
        assert_eq!(second & 0xFF, 0xCD);
        for _ in 1..256 { ata.read(0x1E0, 2); }
        assert!(ide_pending(&ic));
    }

    #[test]
    fn invalid_lba_sets_err_and_zero_data() {
        let (mut ata, _ic) = ata(4);
        ata.write(0x1E8, 4, 1);
        ata.write(0x1EC, 4, 99);
        ata.write(0x1FC, 4, 0x20);
        assert_eq!(ata.read(0x3FC, 4) as u8 & STATUS_ERR, STATUS_ERR);
        assert_eq!(ata.read(0x1E4, 4) as u8 & ERROR_IDNF, ERROR_IDNF);
        let page = read_page(&mut ata);
        assert!(page.iter().all(|&w| w == 0));
    }

    #[test]
    fn nien_gates_the_interrupt() {
        let (mut ata, ic) = ata(4);
        ata.write(0x3F8, 4, CONTROL_NIEN as u32);
        ata.write(0x1FC, 4, 0xE0); // STANDBY IMMEDIATE
        assert!(!ide_pending(&ic));

        ata.write(0x3F8, 4, 0);
        ata.write(0x1FC, 4, 0xE0);
        assert!(ide_pending(&ic));
    }

    #[test]
    fn unknown_command_aborts() {
        let (mut ata, _ic) = ata(4);
        ata.write(0x1FC, 4, 0x77);
        assert_eq!(ata.read(0x3FC, 4) as u8 & STATUS_ERR, STATUS_ERR);
        assert_eq!(ata.read(0x1E4, 4) as u8 & ERROR_ABRT, ERROR_ABRT);
    }

    #[test]
    fn lba48_uses_the_task_file_snapshot() {
        let (mut ata, _ic) = ata(8);
        // Two writes per register: the first lands in the snapshot.
        ata.write(0x1E8, 4, 0); ata.write(0x1E8, 4, 1);
        ata.write(0x1EC, 4, 0); ata.write(0x1EC, 4, 6);
        ata.write(0x1F0, 4, 0); ata.write(0x1F0, 4, 0);
        ata.write(0x1F4, 4, 0); ata.write(0x1F4, 4, 0);
        ata.write(0x1FC, 4, 0x34);
        for _ in 0..256u32 { ata.write(0x1E0, 2, 0x5A5A); }

        let mut sector = [0u8; SECTOR_SIZE];
        assert!(ata.disk.read_sector(6, &mut sector));
        assert!(sector.iter().all(|&b| b == 0x5A));
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
