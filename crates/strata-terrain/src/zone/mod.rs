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

//! Zone rendering: staging, commit and draw submission for terrain zones.

mod commit;
mod draw;
mod geometry;
mod parts;
mod renderer;
mod stats;

pub use draw::{bindings, ZoneDrawConfig, ZoneShaders};
pub use geometry::ZoneData;
pub use parts::{PartMaterials, RenderingPart};
pub use renderer::{CommitOutcome, DrawOutcome, ZoneRenderer, ZoneState};
pub use stats::ZoneStatsSnapshot;
