//! Roomfolio Core - Room description and interaction state
//!
//! This crate provides the renderer-independent pieces of the Roomfolio
//! portfolio room:
//! - Annotation registry (hotspots and their tooltip payloads)
//! - Selection controller (the single active annotation)
//! - Camera focus controller (the seated/desk framing state machine)
//! - Loading gate timing for the splash screen
//! - TOML room configuration

pub mod annotation;
pub mod config;
pub mod focus;
pub mod loading;
pub mod selection;

pub use annotation::{AnnotationRegistry, Hotspot, Payload, PayloadLink, TooltipView};
pub use config::{ConfigError, RoomConfig};
pub use focus::{CameraFocus, CameraMove, FocusCommand, FocusPhase, TransitionTicket};
pub use loading::{GatePhase, LoadingGate};
pub use selection::Selection;
