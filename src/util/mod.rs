// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pure math helpers shared by the editor.

pub mod geometry;
pub mod transform;
