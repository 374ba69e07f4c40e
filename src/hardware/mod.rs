// License below.
//! Implements the emulated iPod: the CPU, the bus with all its
//! peripherals, and the per-instruction orchestrator loop.
#![allow(dead_code)]
#![warn(missing_docs)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;

pub use self::error::*;
pub use self::frontend::{AudioSink, FrameSink, InputEvent};

pub mod ata;
pub mod bus;
pub mod cpu;
pub mod debug;
pub mod disk;
pub mod dma;
pub mod error;
pub mod firmware;
pub mod frontend;
pub mod gpio;
pub mod i2c;
pub mod i2s;
pub mod irq;
pub mod lcd;
pub mod memory;
pub mod syscon;
pub mod timer;
pub mod wheel;

use self::bus::Bus;
use self::cpu::arm7tdmi::Arm7Tdmi;
use self::debug::Debugger;
use self::disk::DiskImage;
use self::firmware::ImageKind;
use self::irq::{IntCon, IRQ_TIMER1};

/// Host-side configuration of the emulated device.
pub struct PodConfig {
    /// SDRAM size in MiB; real devices shipped with 32 or 64.
    pub sdram_mib: usize,

    /// Reset vector the CPU starts at; a parsed firmware image
    /// overrides this with its own entry point.
    pub reset_pc: u32,

    /// Keeps the Timer1 interrupt enable alive across disable
    /// writes. A workaround for firmware that disables the very
    /// interrupt its scheduler runs on; not a hardware feature.
    pub protect_timer1: bool,

    /// Button bitmap held down at power-on.
    pub initial_buttons: u8,
}

impl Default for PodConfig {
    fn default() -> PodConfig {
        PodConfig {
            sdram_mib: 32,
            reset_pc: memory::SDRAM_FIRST,
            protect_timer1: false,
            initial_buttons: 0,
        }
    }
}


/// The emulated 5th-generation iPod.
pub struct Pod {
    cpu: Arm7Tdmi,
    bus: Rc<RefCell<Bus>>,
    intcon: Rc<RefCell<IntCon>>,
    dbg: Debugger,

    input_tx: SyncSender<InputEvent>,
    input_rx: Receiver<InputEvent>,
    shutdown: Arc<AtomicBool>,

    entry_pc: u32,
    initial_buttons: u8,
    ticks: u64,
}

impl Pod {
    /// Builds the device from its configuration.
    pub fn new(config: PodConfig) -> Result<Pod, PodError> {
        if config.sdram_mib != 32 && config.sdram_mib != 64 {
            return Err(PodError::InvalidConfig(
                format!("SDRAM must be 32 or 64 MiB, not {}", config.sdram_mib)));
        }

        let intcon = Rc::new(RefCell::new(IntCon::new()));
        if config.protect_timer1 {
            intcon.borrow_mut().protect(1 << IRQ_TIMER1);
            info!("Timer1 interrupt protection is active.");
        }

        let bus = Rc::new(RefCell::new(Bus::new(config.sdram_mib * 1024 * 1024, intcon.clone())));
        let cpu = Arm7Tdmi::new(bus.clone());
        let (input_tx, input_rx) = frontend::input_queue();

        Ok(Pod {
            cpu: cpu,
            bus: bus,
            intcon: intcon,
            dbg: Debugger::new(),
            input_tx: input_tx,
            input_rx: input_rx,
            shutdown: Arc::new(AtomicBool::new(false)),
            entry_pc: config.reset_pc,
            initial_buttons: config.initial_buttons,
            ticks: 0,
        })
    }

    /// Resets the CPU to the current entry point and replays the
    /// initial button state.
    pub fn reset(&mut self) {
        self.cpu.reset(self.entry_pc);
        if self.initial_buttons != 0 {
            self.bus.borrow_mut().wheel.push_event(self.initial_buttons, 0, false);
        }
    }

    /// Loads a firmware image from a byte buffer.
    ///
    /// A buffer carrying the `"]ih["` master header is unpacked:
    /// its `osos` image lands at the directory's load address and
    /// provides the entry point. Anything else is treated as a raw
    /// binary loaded at `load_addr` (or the configured reset PC).
    pub fn load_firmware_bytes(&mut self, bytes: &[u8], load_addr: Option<u32>) -> Result<(), PodError> {
        if firmware::has_master_header(bytes) {
            let entries = firmware::parse_directory(bytes)?;
            let osos = entries.iter().find(|e| e.kind == ImageKind::Osos)
                .ok_or_else(|| PodError::InvalidFirmwareImage("no osos image in the directory".to_string()))?;
            let payload = firmware::payload(bytes, osos)?;
            self.bus.borrow_mut().load(osos.load_addr, payload);
            self.entry_pc = osos.entry_point();
            info!("Loaded {} ({} bytes) at {:#010X}, entry {:#010X}.",
                  osos.kind, payload.len(), osos.load_addr, self.entry_pc);
        } else {
            let addr = load_addr.unwrap_or(self.entry_pc);
            self.bus.borrow_mut().load(addr, bytes);
            self.entry_pc = addr;
            info!("Loaded raw firmware ({} bytes) at {:#010X}.", bytes.len(), addr);
        }
        Ok(())
    }

    /// Loads a firmware image from a host file.
    pub fn load_firmware_file(&mut self, fp: &Path, load_addr: Option<u32>) -> Result<(), PodError> {
        use std::fs::File;
        use std::io::Read;
        let mut bytes = Vec::new();
        File::open(fp)?.read_to_end(&mut bytes)?;
        self.load_firmware_bytes(&bytes, load_addr)
    }

    /// Attaches a disk image to the ATA controller.
    pub fn set_disk(&mut self, disk: DiskImage) {
        self.bus.borrow_mut().ata.set_disk(disk);
    }

    /// Loads a disk image from a host file.
    pub fn load_disk_file(&mut self, fp: &Path) -> Result<(), PodError> {
        let disk = DiskImage::from_file(fp)?;
        self.set_disk(disk);
        Ok(())
    }

    /// Writes a file-backed disk image back to its host file.
    pub fn flush_disk(&self) -> Result<(), PodError> {
        self.bus.borrow().ata.disk().flush()
    }

    /// Attaches the host-side frame sink.
    pub fn set_frame_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.bus.borrow_mut().lcd.set_sink(sink);
    }

    /// Attaches the host-side audio sink.
    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.bus.borrow_mut().i2s.set_sink(sink);
    }

    /// Hands out the producer end of the input event queue.
    pub fn input_sender(&self) -> SyncSender<InputEvent> {
        self.input_tx.clone()
    }

    /// Hands out the shutdown flag shared with host threads.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Number of instructions executed since construction.
    pub fn ticks(&self) -> u64 { self.ticks }

    /// Runs until the limit, a breakpoint, a halt request, or
    /// shutdown stops the loop.
    ///
    /// # Returns
    /// The number of instructions executed by this call.
    pub fn run(&mut self, limit: Option<u64>) -> u64 {
        let mut executed = 0;
        loop {
            if let Some(n) = limit { if executed >= n { break; } }
            if self.shutdown.load(Ordering::Relaxed) { break; }
            if self.dbg.is_halted() { break; }
            let pc = self.cpu.reg(15);
            if self.dbg.is_breakpoint(pc) {
                info!("Breakpoint hit at {:#010X}.", pc);
                self.dbg.halt();
                break;
            }
            self.tick();
            executed += 1;
        }
        executed
    }

    /// Executes exactly one instruction, halted or not.
    ///
    /// This is the debugger's single-step entry point.
    pub fn step(&mut self) {
        self.tick();
    }

    /// One orchestrator tick: input, one instruction, time advance,
    /// DMA commit, interrupt sampling.
    fn tick(&mut self) {
        self.drain_input();
        self.cpu.step();
        {
            let mut bus = self.bus.borrow_mut();
            bus.timers.tick();
            bus.i2s.tick();
        }
        self.commit_dma();
        let (irq, fiq) = self.intcon.borrow().lines();
        self.cpu.poll_interrupts(irq, fiq);
        self.ticks += 1;
    }

    fn drain_input(&mut self) {
        while let Ok(ev) = self.input_rx.try_recv() {
            let mut bus = self.bus.borrow_mut();
            match ev {
                InputEvent::Wheel { buttons, position, touching } =>
                    bus.wheel.push_event(buttons, position, touching),
                InputEvent::Pin { port, pin, level } =>
                    bus.gpio.set_pin(port, pin, level),
            }
        }
    }

    /// Commits transfers armed since the last boundary.
    ///
    /// This is the single place DMA touches the bus, so a channel
    /// can never re-enter it from inside the store that armed it.
    fn commit_dma(&mut self) {
        loop {
            let pending = self.bus.borrow_mut().dma.take_pending();
            let (ch, cfg) = match pending {
                Some(x) => x,
                None => break,
            };
            let mut src = cfg.src;
            let mut dst = cfg.dst;
            let mut bus = self.bus.borrow_mut();
            for _ in 0..cfg.count {
                let word = bus.read32(src);
                bus.write32(dst, word);
                if cfg.src_inc { src = src.wrapping_add(4); }
                if cfg.dst_inc { dst = dst.wrapping_add(4); }
            }
            trace!("DMA channel {} moved {} words.", ch, cfg.count);
            bus.dma.complete(ch, src, dst);
        }
    }

    // ----- Debugger hook surface ------------------------------------

    /// Reads a debugger-visible register: 0..15 are the GPRs, 16 is
    /// CPSR, 17 the current SPSR.
    pub fn read_reg(&self, n: usize) -> u32 {
        match n {
            0..=15 => self.cpu.reg(n),
            16 => self.cpu.cpsr().0,
            17 => self.cpu.spsr().0,
            _ => 0,
        }
    }

    /// Writes a debugger-visible register; see [`Pod::read_reg`]
    /// for the numbering.
    pub fn write_reg(&mut self, n: usize, data: u32) {
        match n {
            0..=15 => self.cpu.set_reg(n, data),
            16 => self.cpu.set_cpsr(data),
            17 => self.cpu.set_spsr(data),
            _ => warn!("Debugger wrote unknown register {}.", n),
        }
    }

    /// Reads one byte of guest memory.
    pub fn read_mem_byte(&mut self, addr: u32) -> u8 {
        self.bus.borrow_mut().read8(addr) as u8
    }

    /// Writes one byte of guest memory.
    pub fn write_mem_byte(&mut self, addr: u32, data: u8) {
        self.bus.borrow_mut().write8(addr, data as u32);
    }

    /// Arms a breakpoint; at most 16 may be set.
    pub fn add_breakpoint(&mut self, addr: u32) -> bool {
        self.dbg.add_breakpoint(addr)
    }

    /// Disarms a breakpoint.
    pub fn remove_breakpoint(&mut self, addr: u32) -> bool {
        self.dbg.remove_breakpoint(addr)
    }

    /// Requests a halt at the next instruction boundary.
    pub fn halt(&mut self) { self.dbg.halt(); }

    /// Releases a halt.
    pub fn resume(&mut self) { self.dbg.resume(); }

    /// Queries the halt state.
    pub fn is_halted(&self) -> bool { self.dbg.is_halted() }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::frontend::FrameSink;

    fn pod_at(reset_pc: u32) -> Pod {
        let mut config = PodConfig::default();
        config.reset_pc = reset_pc;
        let mut pod = Pod::new(config).unwrap();
        pod.reset();
        pod
    }

    fn write_program(pod: &mut Pod, base: u32, program: &[u32]) {
        let mut bus = pod.bus.borrow_mut();
        for (i, &inst) in program.iter().enumerate() {
            bus.write32(base + 4 * (i as u32), inst);
        }
    }

    #[test]
    fn compute_and_store_scenario() {
        let mut pod = pod_at(0x40000000);
        write_program(&mut pod, 0x40000000, &[
            0xE3A004DE, // mov r0, #0xDE000000
            0xE38008AD, // orr r0, r0, #0x00AD0000
            0xE3800C12, // orr r0, r0, #0x00001200
            0xE3800034, // orr r0, r0, #0x34
            0xE3A01101, // mov r1, #0x40000000
            0xE3811F46, // orr r1, r1, #0x118
            0xE5810000, // str r0, [r1]
            0xEAFFFFFE, // b .
        ]);
        pod.run(Some(5000));
        let word = pod.bus.borrow_mut().read32(0x40000118);
        assert_eq!(word, 0xDEAD1234);
    }

    #[test]
    fn timer_interrupt_round_trip() {
        let mut pod = pod_at(0x40000100);

        // IRQ vector: ldr pc, [pc, #-4] through a literal.
        {
            let mut bus = pod.bus.borrow_mut();
            bus.write32(0x18, 0xE51FF004);
            bus.write32(0x1C, 0x40000200);
        }
        // Main loop.
        write_program(&mut pod, 0x40000100, &[0xEAFFFFFE]);
        // Handler: acknowledge Timer1, bump the counter, return.
        write_program(&mut pod, 0x40000200, &[
            0xE3A00206, // mov r0, #0x60000000
            0xE3800901, // orr r0, r0, #0x4000
            0xE3A01001, // mov r1, #1
            0xE5801000, // str r1, [r0]        ; W1C on CPU_INT_STAT
            0xE3A02101, // mov r2, #0x40000000
            0xE5923000, // ldr r3, [r2]
            0xE2833001, // add r3, r3, #1
            0xE5823000, // str r3, [r2]
            0xE25EF004, // subs pc, lr, #4
        ]);

        // Timer1: repeat, reload 100; unmask it in the controller
        // and in CPSR.
        {
            let mut bus = pod.bus.borrow_mut();
            bus.write32(0x60005000, (1 << 31) | (1 << 30) | 100);
            bus.write32(0x60004024, 1 << irq::IRQ_TIMER1);
        }
        let cpsr = pod.read_reg(16);
        pod.write_reg(16, cpsr & !0x80);

        pod.run(Some(10_000));
        let count = pod.bus.borrow_mut().read32(0x40000000);
        assert!((99..=101).contains(&count), "expected ~100 interrupts, counted {}", count);
    }

    struct CaptureSink(Rc<RefCell<Vec<u16>>>);

    impl FrameSink for CaptureSink {
        fn publish(&mut self, fb: &[u16]) {
            *self.0.borrow_mut() = fb.to_vec();
        }
    }

    #[test]
    fn thumb_firmware_fills_the_framebuffer() {
        let mut pod = pod_at(0x40000000);
        let captured = Rc::new(RefCell::new(Vec::new()));
        pod.set_frame_sink(Box::new(CaptureSink(captured.clone())));

        // ARM prologue: point r0 at the LCD and switch to THUMB.
        write_program(&mut pod, 0x40000000, &[
            0xE3A00203, // mov r0, #0x30000000
            0xE3A01101, // mov r1, #0x40000000
            0xE3810021, // orr r1, r1, #0x21
            0xE12FFF11, // bx r1
        ]);
        // THUMB body: fill 320*240 green pixels, then commit.
        let thumb: &[u16] = &[
            0x213F, // mov r1, #0x3F
            0x0149, // lsl r1, r1, #5      ; 0x07E0
            0x2296, // mov r2, #0x96
            0x0252, // lsl r2, r2, #9      ; 76800
            0x8001, // strh r1, [r0]       ; loop:
            0x3A01, // sub r2, #1
            0xD1FC, // bne loop
            0x2303, // mov r3, #3
            0x041B, // lsl r3, r3, #16     ; 0x30000
            0x181B, // add r3, r3, r0      ; LCD command port
            0x2434, // mov r4, #0x34
            0x601C, // str r4, [r3]        ; publish
            0xE7FE, // b .
        ];
        {
            let mut bus = pod.bus.borrow_mut();
            for (i, &inst) in thumb.iter().enumerate() {
                bus.write16(0x40000020 + 2 * (i as u32), inst as u32);
            }
        }

        pod.run(Some(300_000));
        let frame = captured.borrow();
        assert_eq!(frame.len(), 320 * 240);
        assert!(frame.iter().all(|&p| p == 0x07E0), "framebuffer must be solid green");
    }

    #[test]
    fn dma_commits_at_the_instruction_boundary() {
        let mut pod = pod_at(0x40000000);
        write_program(&mut pod, 0x40000000, &[0xEAFFFFFE]); // b .
        {
            let mut bus = pod.bus.borrow_mut();
            bus.write32(0x10000000, 0x11111111);
            bus.write32(0x10000004, 0x22222222);
            bus.write32(0x6000B000, 0x10000000);           // SRC
            bus.write32(0x6000B004, 0x10001000);           // DST
            bus.write32(0x6000B008, 2);                    // COUNT
            bus.write32(0x6000B00C, (1 << 31) | 0b11);     // START
        }

        pod.run(Some(1));
        let mut bus = pod.bus.borrow_mut();
        assert_eq!(bus.read32(0x10001000), 0x11111111);
        assert_eq!(bus.read32(0x10001004), 0x22222222);
        assert_eq!(bus.intcon.borrow().read32(0x010) & (1 << irq::IRQ_DMA), 1 << irq::IRQ_DMA);
    }

    #[test]
    fn breakpoints_halt_the_run_loop() {
        let mut pod = pod_at(0x40000000);
        write_program(&mut pod, 0x40000000, &[
            0xE3A00001, // mov r0, #1
            0xE3A00002, // mov r0, #2
            0xE3A00003, // mov r0, #3
            0xEAFFFFFE, // b .
        ]);
        pod.add_breakpoint(0x40000008);
        let executed = pod.run(Some(100));
        assert_eq!(executed, 2);
        assert!(pod.is_halted());
        assert_eq!(pod.read_reg(0), 2);
        assert_eq!(pod.read_reg(15), 0x40000008);

        // Single-step across the breakpoint, then run free.
        pod.step();
        assert_eq!(pod.read_reg(0), 3);
        pod.resume();
        pod.run(Some(10));
        assert_eq!(pod.read_reg(0), 3);
    }

    #[test]
    fn master_image_loading_sets_the_entry_point() {
        use super::firmware::{DIRECTORY_OFFSET, ENTRY_SIGNATURE, ENTRY_SIZE, MAGIC, MAGIC_OFFSET};

        let mut image = vec![0u8; 0x5000];
        image[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(MAGIC);
        let mut entry = vec![0u8; ENTRY_SIZE];
        entry[0..4].copy_from_slice(ENTRY_SIGNATURE);
        entry[4..8].copy_from_slice(b"soso");
        entry[12..16].copy_from_slice(&0x4800u32.to_le_bytes());
        entry[16..20].copy_from_slice(&8u32.to_le_bytes());
        entry[20..24].copy_from_slice(&0x10000000u32.to_le_bytes());
        entry[24..28].copy_from_slice(&4u32.to_le_bytes());
        image[DIRECTORY_OFFSET..DIRECTORY_OFFSET + ENTRY_SIZE].copy_from_slice(&entry);
        image[0x4800..0x4808].copy_from_slice(&[0xEF, 0xBE, 0xAD, 0xDE, 0xFE, 0xFF, 0xFF, 0xEA]);

        let mut pod = pod_at(0x40000000);
        pod.load_firmware_bytes(&image, None).unwrap();
        pod.reset();
        assert_eq!(pod.read_reg(15), 0x10000004);
        let word = pod.bus.borrow_mut().read32(0x10000000);
        assert_eq!(word, 0xDEADBEEF);
    }

    #[test]
    fn protect_policy_survives_firmware_disable_writes() {
        let mut config = PodConfig::default();
        config.reset_pc = 0x40000000;
        config.protect_timer1 = true;
        let mut pod = Pod::new(config).unwrap();
        pod.reset();

        let mut bus = pod.bus.borrow_mut();
        bus.write32(0x60004024, (1 << irq::IRQ_TIMER1) | (1 << irq::IRQ_IDE));
        bus.write32(0x60004028, 0xFFFFFFFF);
        assert_eq!(bus.read32(0x60004020), 1 << irq::IRQ_TIMER1,
                   "only the protected enable bit may survive");
    }

    #[test]
    fn input_events_reach_the_wheel() {
        let mut pod = pod_at(0x40000000);
        write_program(&mut pod, 0x40000000, &[0xEAFFFFFE]);
        pod.bus.borrow_mut().wheel.write32(0x00, 1 << 31);

        let tx = pod.input_sender();
        tx.send(InputEvent::Wheel { buttons: 1, position: 10, touching: true }).unwrap();
        pod.run(Some(1));

        let packet = pod.bus.borrow_mut().wheel.read32(0x30);
        assert_eq!(packet & 0xFF, 0x1A);
        assert_eq!((packet >> 16) & 0x7F, 10);
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
