// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive editing engine: live scene, polygon vertex editing, tool
//! modes and undo/redo history.

pub mod bridge;
pub mod controller;
pub mod deferred;
pub mod history;
pub mod polygon;
pub mod scene;
pub mod viewport;

pub use controller::{Editor, EditorKey, ToolMode};
pub use history::History;
pub use scene::{LiveShape, Primitive, Scene};
pub use viewport::Viewport;
