//! Build Script for gst-playersink-rs
//!
//! Generates the `COMMIT_ID` and `BUILD_REL_DATE` environment variables
//! consumed by `gst::plugin_define!` in lib.rs.

// SPDX-FileCopyrightText: 2025 Contributors to the gstplayer project.
// SPDX-License-Identifier: Apache-2.0

fn main() {
    gst_plugin_version_helper::info()
}
