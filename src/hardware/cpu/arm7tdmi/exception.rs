// License below.
//! Implements the ARM7TDMI's exception model.
#![warn(missing_docs)]

use super::psr::Mode;

/// CPU exceptions.
///
/// The discriminants are chosen so that the fixed vector address
/// of each exception is `discriminant * 4`; slot 5 is the reserved
/// vector of the architecture.
#[derive(Debug, PartialEq, Clone, Copy)]
#[repr(u8)]
pub enum Exception {
    #[doc = "Power-on or watchdog reset."]               Reset = 0,
    #[doc = "Executed an instruction nobody defined."]   UndefinedInstruction = 1,
    #[doc = "Executed a SWI instruction."]               SoftwareInterrupt = 2,
    #[doc = "Instruction fetch was aborted."]            PrefetchAbort = 3,
    #[doc = "Data access was aborted."]                  DataAbort = 4,
    #[doc = "Normal hardware interrupt."]                NormalInterrupt = 6,
    #[doc = "Fast hardware interrupt."]                  FastInterrupt = 7,
}

impl Exception {
    /// Get the exception's CPU mode on entry.
    pub fn mode_on_entry(self) -> Mode {
        match self {
            Exception::Reset                => Mode::Supervisor,
            Exception::UndefinedInstruction => Mode::Undefined,
            Exception::SoftwareInterrupt    => Mode::Supervisor,
            Exception::PrefetchAbort        => Mode::Abort,
            Exception::DataAbort            => Mode::Abort,
            Exception::NormalInterrupt      => Mode::IRQ,
            Exception::FastInterrupt        => Mode::FIQ,
        }
    }

    /// Check whether fast interrupts should be disabled.
    ///
    /// # Returns
    /// - `true` if FIQ should be disabled on entry.
    /// - `false` if FIQ should be left unchanged.
    pub fn disable_fiq_on_entry(self) -> bool {
        (self == Exception::Reset) | (self == Exception::FastInterrupt)
    }

    /// Get the exception vector address.
    pub fn vector_address(self) -> u32 {
        (self as u8 as u32) * 4
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vector_addresses_match_the_architecture() {
        assert_eq!(Exception::Reset.vector_address(),                0x00);
        assert_eq!(Exception::UndefinedInstruction.vector_address(), 0x04);
        assert_eq!(Exception::SoftwareInterrupt.vector_address(),    0x08);
        assert_eq!(Exception::PrefetchAbort.vector_address(),        0x0C);
        assert_eq!(Exception::DataAbort.vector_address(),            0x10);
        assert_eq!(Exception::NormalInterrupt.vector_address(),      0x18);
        assert_eq!(Exception::FastInterrupt.vector_address(),        0x1C);
    }

    #[test]
    fn only_reset_and_fiq_mask_fiq() {
        assert!( Exception::Reset.disable_fiq_on_entry());
        assert!( Exception::FastInterrupt.disable_fiq_on_entry());
        assert!(!Exception::NormalInterrupt.disable_fiq_on_entry());
        assert!(!Exception::SoftwareInterrupt.disable_fiq_on_entry());
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
