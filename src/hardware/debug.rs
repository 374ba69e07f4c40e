// License below.
//! Implements the debugger hook surface's bookkeeping: breakpoints
//! and the halt/step handshake.
//!
//! Register and memory access go straight through the CPU and bus;
//! this block only owns the state a remote debugger or the REPL
//! manipulates between instructions.
#![warn(missing_docs)]

/// Maximum number of concurrently set breakpoints.
pub const MAX_BREAKPOINTS: usize = 16;

/// Implements breakpoint slots and the halt flag.
pub struct Debugger {
    breakpoints: [Option<u32>; MAX_BREAKPOINTS],
    halted: bool,
}

impl Debugger {
    /// Creates the debugger state, running, with no breakpoints.
    pub fn new() -> Debugger {
        Debugger {
            breakpoints: [None; MAX_BREAKPOINTS],
            halted: false,
        }
    }

    /// Arms a breakpoint.
    ///
    /// # Returns
    /// `false` if all slots are taken.
    pub fn add_breakpoint(&mut self, addr: u32) -> bool {
        if self.breakpoints.iter().any(|&b| b == Some(addr)) {
            return true;
        }
        match self.breakpoints.iter_mut().find(|b| b.is_none()) {
            Some(slot) => { *slot = Some(addr); true },
            None => {
                warn!("All {} breakpoint slots are taken.", MAX_BREAKPOINTS);
                false
            },
        }
    }

    /// Disarms a breakpoint.
    ///
    /// # Returns
    /// `false` if no breakpoint was set on that address.
    pub fn remove_breakpoint(&mut self, addr: u32) -> bool {
        match self.breakpoints.iter_mut().find(|b| **b == Some(addr)) {
            Some(slot) => { *slot = None; true },
            None => false,
        }
    }

    /// Checks whether an address carries a breakpoint.
    pub fn is_breakpoint(&self, addr: u32) -> bool {
        self.breakpoints.iter().any(|&b| b == Some(addr))
    }

    /// Requests a halt at the next instruction boundary.
    pub fn halt(&mut self) { self.halted = true; }

    /// Releases a halt.
    pub fn resume(&mut self) { self.halted = false; }

    /// Queries the halt state.
    pub fn is_halted(&self) -> bool { self.halted }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn breakpoints_arm_and_disarm() {
        let mut dbg = Debugger::new();
        assert!(dbg.add_breakpoint(0x40000010));
        assert!(dbg.is_breakpoint(0x40000010));
        assert!(!dbg.is_breakpoint(0x40000014));
        assert!(dbg.remove_breakpoint(0x40000010));
        assert!(!dbg.is_breakpoint(0x40000010));
        assert!(!dbg.remove_breakpoint(0x40000010));
    }

    #[test]
    fn setting_the_same_breakpoint_twice_takes_one_slot() {
        let mut dbg = Debugger::new();
        for _ in 0..MAX_BREAKPOINTS {
            assert!(dbg.add_breakpoint(0x1000));
        }
        assert!(dbg.add_breakpoint(0x2000), "only one slot may be used so far");
    }

    #[test]
    fn slots_are_bounded() {
        let mut dbg = Debugger::new();
        for i in 0..MAX_BREAKPOINTS as u32 {
            assert!(dbg.add_breakpoint(0x1000 + 4 * i));
        }
        assert!(!dbg.add_breakpoint(0x9000));
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
