// License below.
//! Implements the emulator's error type.
#![warn(missing_docs)]

use std::error;
use std::fmt;
use std::io;

/// Any kind of error the emulator might raise.
///
/// Only the host-setup variants ever travel upwards out of the
/// core; instruction decoding failures are consumed by the CPU,
/// which turns them into an Undefined exception for the firmware
/// to deal with.
#[derive(Debug)]
pub enum PodError {
    /// Reading a firmware or disk image file failed.
    Io(io::Error),

    /// A firmware image file is malformed.
    InvalidFirmwareImage(String),

    /// The emulator configuration is unusable.
    InvalidConfig(String),

    /// Tried decoding an invalid instruction in ARM state.
    InvalidArmInstruction(u32),

    /// Tried decoding an invalid instruction in THUMB state.
    InvalidThumbInstruction(u16),
}

impl error::Error for PodError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            PodError::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for PodError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PodError::Io(ref e)                   => write!(f, "I/O error: {}", e),
            PodError::InvalidFirmwareImage(ref m) => write!(f, "Invalid firmware image: {}", m),
            PodError::InvalidConfig(ref m)        => write!(f, "Invalid configuration: {}", m),
            PodError::InvalidArmInstruction(x)    => write!(f, "Invalid ARM instruction {:#010X}", x),
            PodError::InvalidThumbInstruction(x)  => write!(f, "Invalid THUMB instruction {:#06X}", x),
        }
    }
}

impl From<io::Error> for PodError {
    fn from(e: io::Error) -> PodError { PodError::Io(e) }
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
