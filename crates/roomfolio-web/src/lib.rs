//! Roomfolio Web - WebGPU-powered portfolio room frontend
//!
//! This crate provides the browser entry point and the Bevy app builder
//! shared with the native `roomfolio` binary.

pub mod app;
mod embed;

use roomfolio_core::RoomConfig;
use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build()
    );

    match RoomConfig::builtin() {
        Ok(config) => app::run(config),
        Err(e) => tracing::error!("Built-in room is invalid: {}", e),
    }
}
