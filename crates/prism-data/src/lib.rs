// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Prism Data
//!
//! The data side of the scene pipeline: the serializable scene description
//! read from disk, the immutable scene definition produced from it, the
//! geometry offset layout, and the plain-old-data records uploaded to the GPU.

#![warn(missing_docs)]

pub mod gpu;
pub mod scene;
