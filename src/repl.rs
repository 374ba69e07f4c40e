// License below.
//! Implements a debug REPL over the emulator's debugger hook
//! surface.
#![warn(missing_docs)]

use super::hardware;
use super::hardware::cpu::{Arm7Tdmi, ArmInstruction};
use std::io;
use std::io::Write;
use std::str::SplitWhitespace;

/// Implements a debug REPL for the iPod emulator.
///
/// REPL stands for **R**ead, **E**val, **P**rint, **L**oop,
/// so all it does is running the emulator step by step waiting
/// for user inputs. It drives the same hook surface a remote
/// debugger stub would.
pub struct PodRepl {
    colour: bool,
}

impl PodRepl {
    /// Creates a new REPL without running it.
    pub fn new() -> PodRepl {
        PodRepl {
            colour: true,
        }
    }

    /// Configure whether terminal outputs should be colourised.
    pub fn with_colour(&mut self, c: bool) -> &mut PodRepl { self.colour = c; self }

    /// Runs the REPL until the user quits.
    pub fn run(&mut self, pod: &mut hardware::Pod) {
        let mut terminal = term::stdout().expect("Failed grabbing a terminal handle!");
        let mut input = String::new();

        self.print_registers(pod, &mut terminal);

        loop {
            let mut words = match self.input_prompt(&mut terminal, &mut input) {
                Ok(s) => s,
                Err(e) => { error!("{}", e); break; },
            };

            match words.next() {
                Some("q") => break,
                Some("s") => {
                    let n = words.next().and_then(|w| w.parse::<u64>().ok()).unwrap_or(1);
                    for _ in 0..n { pod.step(); }
                    self.print_registers(pod, &mut terminal);
                },
                Some("c") => {
                    pod.resume();
                    let executed = pod.run(None);
                    writeln!(terminal, "\tStopped after {} instructions.", executed).unwrap_or(());
                    self.print_registers(pod, &mut terminal);
                },
                Some("r") => self.print_registers(pod, &mut terminal),
                Some("x") => {
                    let addr = words.next().and_then(parse_u32);
                    let len = words.next().and_then(|w| w.parse::<u32>().ok()).unwrap_or(64);
                    match addr {
                        Some(a) => self.dump_memory(pod, &mut terminal, a, len),
                        None => writeln!(terminal, "\tUsage: x ADDR [LEN]").unwrap_or(()),
                    }
                },
                Some("b") => {
                    match words.next().and_then(parse_u32) {
                        Some(a) => {
                            if pod.add_breakpoint(a) { writeln!(terminal, "\tBreakpoint set at {:#010X}.", a).unwrap_or(()); }
                            else { writeln!(terminal, "\tAll breakpoint slots are taken.").unwrap_or(()); }
                        },
                        None => writeln!(terminal, "\tUsage: b ADDR").unwrap_or(()),
                    }
                },
                Some("d") => {
                    match words.next().and_then(parse_u32) {
                        Some(a) => { pod.remove_breakpoint(a); },
                        None => { writeln!(terminal, "\tUsage: d ADDR").unwrap_or(()); },
                    }
                },
                Some("i") => self.disassemble_at_pc(pod, &mut terminal),
                Some("?") => {
                    writeln!(terminal, "\tq quit | s [N] step | c continue | r registers\n\
                                       \tx ADDR [LEN] dump | b ADDR | d ADDR | i disassemble").unwrap_or(());
                },
                _ => write!(terminal, "\t\t<What?>\n").unwrap_or_else(|e| { error!("{}", e); }),
            }
        }
    }

    fn print_registers(&self, pod: &hardware::Pod, terminal: &mut Box<term::StdoutTerminal>) {
        if self.colour { terminal.fg(term::color::CYAN).unwrap_or(()); }
        for i in 0..16 {
            if i % 4 == 0 { write!(terminal, "\t").unwrap_or(()); }
            write!(terminal, "{:>3}={:#010X}  ", Arm7Tdmi::register_name(i), pod.read_reg(i)).unwrap_or(());
            if i % 4 == 3 { writeln!(terminal, "").unwrap_or(()); }
        }
        writeln!(terminal, "\tCPSR={:#010X}  SPSR={:#010X}", pod.read_reg(16), pod.read_reg(17)).unwrap_or(());
        terminal.reset().unwrap_or(());
    }

    fn dump_memory(&self, pod: &mut hardware::Pod, terminal: &mut Box<term::StdoutTerminal>, addr: u32, len: u32) {
        for row in 0..(len + 15) / 16 {
            let base = addr + row * 16;
            write!(terminal, "\t{:#010X}: ", base).unwrap_or(());
            for i in 0..16 {
                write!(terminal, "{:02X} ", pod.read_mem_byte(base + i)).unwrap_or(());
            }
            writeln!(terminal, "").unwrap_or(());
        }
    }

    fn disassemble_at_pc(&self, pod: &mut hardware::Pod, terminal: &mut Box<term::StdoutTerminal>) {
        let pc = pod.read_reg(15);
        let mut raw = 0u32;
        for i in 0..4 {
            raw |= (pod.read_mem_byte(pc + i) as u32) << (8 * i);
        }
        match ArmInstruction::decode(raw) {
            Ok(inst) => writeln!(terminal, "\t{:#010X}: {}", pc, inst).unwrap_or(()),
            Err(e)   => writeln!(terminal, "\t{:#010X}: {}", pc, e).unwrap_or(()),
        }
    }

    fn input_prompt<'a>(&self, terminal: &mut Box<term::StdoutTerminal>, input: &'a mut String)
    -> io::Result<SplitWhitespace<'a>> {
        write!(terminal, "\t")?;
        if self.colour {
            terminal.fg(term::color::BLACK).unwrap_or(());
            terminal.bg(term::color::WHITE).unwrap_or(());
        }
        write!(terminal, "[? = Help, q = Quit, s = Step, c = Continue]")?;
        terminal.reset().unwrap_or(());
        write!(terminal, "\n\t> ")?;
        io::stdout().flush().unwrap();

        input.clear();
        io::stdin().read_line(input)?;
        write!(terminal, "\n")?;
        Ok(input.trim().split_whitespace())
    }
}

fn parse_u32(word: &str) -> Option<u32> {
    let trimmed = word.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(trimmed, 16).ok()
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
