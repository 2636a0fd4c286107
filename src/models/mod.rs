// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotation records and project files.

pub mod annotation;
pub mod project;

pub use annotation::{Annotation, Color, Point, Shape, ShapeId, ShapeKind, Style};
pub use project::ProjectData;
