// License below.
//! Implements the LCD controller: one 320x240 RGB565 framebuffer
//! fed by two write paths.
//!
//! The "main" path is the region at 0x30000000:
//!
//! ```text
//! 0x00000  DATA  W: one pixel (16-bit) or two pixels (32-bit)
//! 0x10000  ADDR  W: pixel cursor into the framebuffer
//! 0x30000  CMD   W: 0x34 publishes the framebuffer
//! ```
//!
//! The "bridge" path mirrors the LCD2 interface at 0x70008A00:
//!
//! ```text
//! 0x000  CTRL          R: ready bits
//! 0x008  ADDR          W: pixel cursor
//! 0x00C  PORT          W: one/two pixels, auto-increment
//! 0x020  BLOCK_CTRL    R/W: bit 31 arms a block transfer
//! 0x024  BLOCK_CONFIG  W: pixel count of the block
//! 0x100  BLOCK_DATA    W: block pixel FIFO, two pixels per word
//! ```
//!
//! Both paths deposit RGB565 pixels at an auto-incrementing cursor.
//! A completed block transfer publishes the framebuffer, as does
//! the main path's 0x34 command.
#![warn(missing_docs)]

use super::frontend::{FrameSink, NullSink, FRAME_HEIGHT, FRAME_WIDTH};

/// Pixels in the framebuffer.
pub const FRAME_PIXELS: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// The main path command that publishes the framebuffer.
const CMD_UPDATE: u32 = 0x34;

/// Bridge BLOCK_CTRL bit arming a transfer.
const BLOCK_ARM: u32 = 1 << 31;

/// Bridge CTRL value: always ready to accept data.
const CTRL_READY: u32 = 0x0000_0002;

/// Implements the LCD framebuffer and both of its write paths.
pub struct Lcd {
    fb: Box<[u16]>,
    cursor: usize,

    bridge_cursor: usize,
    block_remaining: u32,
    block_config: u32,

    sink: Box<dyn FrameSink>,
}

impl Lcd {
    /// Creates a black framebuffer with no sink attached.
    pub fn new() -> Lcd {
        Lcd {
            fb: vec![0u16; FRAME_PIXELS].into_boxed_slice(),
            cursor: 0,
            bridge_cursor: 0,
            block_remaining: 0,
            block_config: 0,
            sink: Box::new(NullSink),
        }
    }

    /// Attaches the host-side frame sink.
    pub fn set_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sink = sink;
    }

    /// Copies the framebuffer out to the sink.
    fn publish(&mut self) {
        self.sink.publish(&self.fb);
    }

    fn put_pixel(cursor: &mut usize, fb: &mut [u16], pixel: u16) {
        fb[*cursor] = pixel;
        *cursor = (*cursor + 1) % FRAME_PIXELS;
    }

    /// Handles a write on the main path at 0x30000000.
    pub fn main_write(&mut self, offset: u32, width: u32, data: u32) {
        match offset {
            0x00000 => {
                Lcd::put_pixel(&mut self.cursor, &mut self.fb, data as u16);
                if width == 4 {
                    Lcd::put_pixel(&mut self.cursor, &mut self.fb, (data >> 16) as u16);
                }
            },
            0x10000 => self.cursor = (data as usize) % FRAME_PIXELS,
            0x30000 => {
                if data == CMD_UPDATE {
                    self.publish();
                } else {
                    trace!("LCD: unhandled main-path command {:#04X}.", data);
                }
            },
            _ => trace!("LCD: write {:#010X} to unhandled main-path offset {:#07X}.", data, offset),
        }
    }

    /// Handles a read on the main path. The panel never drives the
    /// data bus on this SoC, so everything reads zero.
    pub fn main_read(&self, _offset: u32, _width: u32) -> u32 { 0 }

    /// Handles a read on the bridge path at 0x70008A00.
    pub fn bridge_read(&self, offset: u32, _width: u32) -> u32 {
        match offset {
            0x000 => CTRL_READY,
            0x020 => if self.block_remaining > 0 { BLOCK_ARM } else { 0 },
            0x024 => self.block_config,
            _ => 0,
        }
    }

    /// Handles a write on the bridge path.
    pub fn bridge_write(&mut self, offset: u32, width: u32, data: u32) {
        match offset {
            0x008 => self.bridge_cursor = (data as usize) % FRAME_PIXELS,
            0x00C => {
                Lcd::put_pixel(&mut self.bridge_cursor, &mut self.fb, data as u16);
                if width == 4 {
                    Lcd::put_pixel(&mut self.bridge_cursor, &mut self.fb, (data >> 16) as u16);
                }
            },
            0x020 => {
                if 0 != (data & BLOCK_ARM) {
                    self.block_remaining = self.block_config;
                }
            },
            0x024 => self.block_config = data,
            0x100 => self.block_data(width, data),
            _ => trace!("LCD2: write {:#010X} to unhandled offset {:#05X}.", data, offset),
        }
    }

    fn block_data(&mut self, width: u32, data: u32) {
        if self.block_remaining == 0 {
            trace!("LCD2: block data without an armed transfer.");
            return;
        }
        let pixels: u32 = if width == 4 { 2 } else { 1 };
        Lcd::put_pixel(&mut self.bridge_cursor, &mut self.fb, data as u16);
        if pixels == 2 && self.block_remaining > 1 {
            Lcd::put_pixel(&mut self.bridge_cursor, &mut self.fb, (data >> 16) as u16);
        }
        self.block_remaining = self.block_remaining.saturating_sub(pixels);
        if self.block_remaining == 0 {
            self.publish();
        }
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::frontend::FrameSink;

    struct CaptureSink(Rc<RefCell<Vec<u16>>>);

    impl FrameSink for CaptureSink {
        fn publish(&mut self, fb: &[u16]) {
            *self.0.borrow_mut() = fb.to_vec();
        }
    }

    fn lcd_with_capture() -> (Lcd, Rc<RefCell<Vec<u16>>>) {
        let captured = Rc::new(RefCell::new(Vec::new()));
        let mut lcd = Lcd::new();
        lcd.set_sink(Box::new(CaptureSink(captured.clone())));
        (lcd, captured)
    }

    #[test]
    fn full_red_fill_and_commit() {
        let (mut lcd, captured) = lcd_with_capture();
        // 0x9600 32-bit writes carry two pixels each: 320 * 240.
        for _ in 0..0x9600 {
            lcd.main_write(0x00000, 4, 0xF800_F800);
        }
        assert!(captured.borrow().is_empty(), "nothing published before the commit");
        lcd.main_write(0x30000, 4, 0x34);

        let frame = captured.borrow();
        assert_eq!(frame.len(), FRAME_PIXELS);
        assert!(frame.iter().all(|&p| p == 0xF800));
    }

    #[test]
    fn cursor_register_repositions_the_main_path(){
        let (mut lcd, captured) = lcd_with_capture();
        lcd.main_write(0x10000, 4, 100);
        lcd.main_write(0x00000, 2, 0x07E0);
        lcd.main_write(0x30000, 4, 0x34);
        let frame = captured.borrow();
        assert_eq!(frame[100], 0x07E0);
        assert_eq!(frame[101], 0);
    }

    #[test]
    fn bridge_block_transfer_publishes_on_completion() {
        let (mut lcd, captured) = lcd_with_capture();
        lcd.bridge_write(0x008, 4, 0);
        lcd.bridge_write(0x024, 4, 4);          // Four pixels...
        lcd.bridge_write(0x020, 4, 1 << 31);    // ...armed.
        lcd.bridge_write(0x100, 4, 0x001F_001F);
        assert!(captured.borrow().is_empty());
        lcd.bridge_write(0x100, 4, 0x001F_001F);

        let frame = captured.borrow();
        assert_eq!(&frame[0..4], &[0x001F; 4]);
        assert_eq!(lcd.bridge_read(0x020, 4), 0, "transfer no longer armed");
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
