// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Signal preprocessing: IIR filter primitives and the tissue-coupling filter

pub mod acoustic;
pub mod filter;

pub use acoustic::{AcousticFilter, FilterCoefficients};
pub use filter::Filter;
