// License below.
//! Implements the seams between the emulator core and the host
//! front-end.
//!
//! The core never talks to a window, an audio device, or a keyboard
//! directly: frames leave through a [`FrameSink`], samples through an
//! [`AudioSink`], and input comes in through a bounded event queue
//! drained between instructions. Whatever sits on the other end of
//! those seams runs on the host's threads.
#![warn(missing_docs)]

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// Width of the published framebuffer in pixels.
pub const FRAME_WIDTH: usize = 320;

/// Height of the published framebuffer in pixels.
pub const FRAME_HEIGHT: usize = 240;

/// Capacity of the input event queue.
pub const INPUT_QUEUE_DEPTH: usize = 256;

/// A consumer of published frames.
///
/// Called with the full 320x240 RGB565 framebuffer each time the
/// firmware commits; the slice is only valid for the duration of
/// the call, so sinks copy what they keep.
pub trait FrameSink {
    /// Publishes one complete frame.
    fn publish(&mut self, fb: &[u16]);
}

/// A consumer of produced audio.
///
/// Samples are interleaved signed 16-bit stereo; the host side owns
/// pacing and buffering.
pub trait AudioSink {
    /// Pushes a batch of interleaved stereo samples.
    fn push(&mut self, samples: &[i16]);
}

/// A sink that throws frames and samples away.
///
/// Installed by default so the core can run headless.
pub struct NullSink;

impl FrameSink for NullSink {
    fn publish(&mut self, _fb: &[u16]) {}
}

impl AudioSink for NullSink {
    fn push(&mut self, _samples: &[i16]) {}
}


/// An input event travelling from the host into the core.
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    /// A click wheel sample.
    Wheel {
        /// Pressed-button bitmap.
        buttons: u8,
        /// Finger position on the wheel, 0..95.
        position: u8,
        /// Whether a finger touches the wheel at all.
        touching: bool,
    },
    /// A raw GPIO pin level change.
    Pin {
        /// Port index, 0..11.
        port: usize,
        /// Pin index, 0..31.
        pin: u32,
        /// New pin level.
        level: bool,
    },
}

/// Creates the bounded host-to-core input queue.
pub fn input_queue() -> (SyncSender<InputEvent>, Receiver<InputEvent>) {
    sync_channel(INPUT_QUEUE_DEPTH)
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
