// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! LabelCanvas - vector annotation editing over images.

pub mod config;
pub mod editor;
pub mod io;
pub mod models;
pub mod util;
