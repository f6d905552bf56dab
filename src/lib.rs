// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Piano scale trainer engine.
//!
//! Models keys, scale shapes and fingerings, and grades timestamped key
//! presses against them: wrong notes, missing notes, wrong fingers and
//! notes played off the beat. A practice attempt can be run as an exam that
//! ends in a letter grade.

pub mod audio;
pub mod config;
pub mod keyboard;
pub mod music;
pub mod playback;
pub mod session;
pub mod timing;
