// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot-oriented backends implementing the shared [`crate::Backend`] trait.

pub mod flatvec;
