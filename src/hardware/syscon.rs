// License below.
//! Implements the miscellaneous system controller blocks: the
//! processor ID, the inter-core mailbox, the system/device control
//! latches, the core sleep controls, cache control, and GPO32.
//!
//! Most of these registers only need to hold whatever the firmware
//! last wrote so that its read-modify-write sequences see their own
//! state again; nothing in the emulator consumes the values. The
//! ones with real behaviour are documented inline.
#![warn(missing_docs)]

/// PROC_ID value identifying the primary core.
pub const PROC_ID_CPU: u32 = 0x55;

/// PROC_ID value identifying the coprocessor.
pub const PROC_ID_COP: u32 = 0xAA;

/// Implements the core-side miscellaneous registers at 0x60000000,
/// 0x60001000, 0x60006000, 0x60007000, and 0x6000C000.
pub struct SysCon {
    mailbox: [u32; 2],
    latch: [u32; 0x400],
    cpu_ctl: u32,
    cop_ctl: u32,
}

impl SysCon {
    /// Creates the block with all latches cleared.
    pub fn new() -> SysCon {
        SysCon {
            mailbox: [0; 2],
            latch: [0; 0x400],
            cpu_ctl: 0,
            cop_ctl: 0,
        }
    }

    /// Reads a core-side register, addressed by the offset into
    /// the 0x60000000 region.
    pub fn read32(&mut self, offset: u32) -> u32 {
        match offset {
            // Only the primary core runs; it always sees itself.
            0x0000 => PROC_ID_CPU,

            // Mailbox reads consume the posted bits. The second
            // core never runs, so its side of the handshake is
            // forever empty after the read.
            0x1010 => { let v = self.mailbox[0]; self.mailbox[0] = 0; v },
            0x1020 => { let v = self.mailbox[1]; self.mailbox[1] = 0; v },

            // System control latch: device reset, clock and PLL
            // setup. Firmware only ever reads back what it wrote.
            0x6000..=0x6FFF => self.latch[((offset - 0x6000) >> 2) as usize],

            // Sleep controls: the stored setup minus the sleep
            // request bit, so the core always reads as running.
            0x7000 => self.cpu_ctl & !0x8000_0000,
            0x7004 => self.cop_ctl & !0x8000_0000,

            // Cache control has no observable read state.
            0xC000..=0xCFFF => 0,

            _ => {
                trace!("SysCon: read from unhandled offset {:#06X}.", offset);
                0
            },
        }
    }

    /// Writes a core-side register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        match offset {
            0x1010 => self.mailbox[0] |= data,
            0x1020 => self.mailbox[1] |= data,
            0x6000..=0x6FFF => self.latch[((offset - 0x6000) >> 2) as usize] = data,
            0x7000 => self.cpu_ctl = data,
            0x7004 => self.cop_ctl = data,
            0xC000..=0xCFFF => {}, // Cache maintenance: nothing to do.
            _ => trace!("SysCon: write {:#010X} to unhandled offset {:#06X}.", data, offset),
        }
    }
}


/// Implements the device-side miscellaneous registers at 0x70000000:
/// the device-init latch and GPO32.
pub struct DevCon {
    init_latch: [u32; 0x20],
    gpo32_val: u32,
    gpo32_enable: u32,
}

impl DevCon {
    /// Creates the block with all latches cleared.
    pub fn new() -> DevCon {
        DevCon {
            init_latch: [0; 0x20],
            gpo32_val: 0,
            gpo32_enable: 0,
        }
    }

    /// Reads a device-side register, addressed by the offset into
    /// the 0x70000000 region.
    pub fn read32(&self, offset: u32) -> u32 {
        match offset {
            0x00..=0x7F => self.init_latch[(offset >> 2) as usize],
            0x80 => self.gpo32_val,
            0x84 => self.gpo32_enable,
            _ => {
                trace!("DevCon: read from unhandled offset {:#06X}.", offset);
                0
            },
        }
    }

    /// Writes a device-side register.
    pub fn write32(&mut self, offset: u32, data: u32) {
        match offset {
            0x00..=0x7F => self.init_latch[(offset >> 2) as usize] = data,
            0x80 => self.gpo32_val = data,
            0x84 => self.gpo32_enable = data,
            _ => trace!("DevCon: write {:#010X} to unhandled offset {:#06X}.", data, offset),
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn proc_id_names_the_primary_core() {
        let mut sc = SysCon::new();
        assert_eq!(sc.read32(0x0000), PROC_ID_CPU);
    }

    #[test]
    fn mailbox_reads_consume() {
        let mut sc = SysCon::new();
        sc.write32(0x1010, 0b101);
        sc.write32(0x1010, 0b010);
        assert_eq!(sc.read32(0x1010), 0b111, "writes accumulate");
        assert_eq!(sc.read32(0x1010), 0, "the read cleared the bits");
    }

    #[test]
    fn control_latches_read_back() {
        let mut sc = SysCon::new();
        sc.write32(0x6034, 0xDEAD_BEEF);
        assert_eq!(sc.read32(0x6034), 0xDEAD_BEEF);

        let mut dc = DevCon::new();
        dc.write32(0x20, 0x1234_5678);
        assert_eq!(dc.read32(0x20), 0x1234_5678);
        dc.write32(0x80, 0xFF);
        assert_eq!(dc.read32(0x80), 0xFF);
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
