//! Room configuration loading and validation
//!
//! The whole room (objects, hotspots, camera, lights, splash screen) is
//! described by a TOML file. A default room is compiled in; native builds can
//! load another file from disk.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::annotation::{AnnotationRegistry, Hotspot, Payload, PayloadLink};

/// Room shipped with the application
pub const BUILTIN_ROOM: &str = include_str!("../room.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read room config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse room config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Duplicate hotspot id: {0}")]
    DuplicateHotspot(String),
    #[error("Duplicate object id: {0}")]
    DuplicateObject(String),
    #[error("{referrer} references unknown object '{object}'")]
    UnknownObject { referrer: String, object: String },
    #[error("Invalid colour '{0}', expected #rrggbb")]
    InvalidColor(String),
    #[error("Focus volume '{0}' must be an object with a box shape")]
    MissingFocusVolume(String),
    #[error("Object '{0}' is its own ancestor")]
    ParentCycle(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomConfig {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub focus: Option<FocusConfig>,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default, rename = "object")]
    pub objects: Vec<ObjectConfig>,
    #[serde(default, rename = "hotspot")]
    pub hotspots: Vec<HotspotConfig>,
    #[serde(default, rename = "embed")]
    pub embeds: Vec<EmbedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// CSS selector of the canvas to render into (web builds)
    #[serde(default)]
    pub canvas: Option<String>,
    #[serde(default = "default_background")]
    pub background: String,
    /// Offset applied to the room root
    #[serde(default)]
    pub root_offset: [f32; 3],
    /// Optional glTF scene spawned under the room root (e.g. "model/room.glb#Scene0")
    #[serde(default)]
    pub backdrop: Option<String>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            canvas: None,
            background: default_background(),
            root_offset: [0.0; 3],
            backdrop: None,
        }
    }
}

fn default_title() -> String {
    "Roomfolio".to_string()
}

fn default_background() -> String {
    "#fcc5c5".to_string()
}

/// Orthographic camera and orbit limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_eye")]
    pub eye: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    /// Pixels per world unit
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default = "default_zoom_limits")]
    pub zoom_limits: [f32; 2],
    /// Azimuth range in radians, measured from +Z towards +X in [0, 2π)
    #[serde(default = "default_azimuth_limits")]
    pub azimuth_limits: [f32; 2],
    /// Polar range in radians, measured from +Y
    #[serde(default = "default_polar_limits")]
    pub polar_limits: [f32; 2],
    /// Duration of fit/reset/follow-up moves
    #[serde(default = "default_transition_secs")]
    pub transition_secs: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: default_eye(),
            target: [0.0; 3],
            zoom: default_zoom(),
            zoom_limits: default_zoom_limits(),
            azimuth_limits: default_azimuth_limits(),
            polar_limits: default_polar_limits(),
            transition_secs: default_transition_secs(),
            sensitivity: default_sensitivity(),
            zoom_speed: default_zoom_speed(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_eye() -> [f32; 3] {
    [-2.5, 1.0, 2.5]
}

fn default_zoom() -> f32 {
    160.0
}

fn default_zoom_limits() -> [f32; 2] {
    [80.0, 600.0]
}

fn default_azimuth_limits() -> [f32; 2] {
    [std::f32::consts::TAU - 1.57, std::f32::consts::TAU]
}

fn default_polar_limits() -> [f32; 2] {
    [-0.5, std::f32::consts::FRAC_PI_2]
}

fn default_transition_secs() -> f32 {
    0.8
}

fn default_sensitivity() -> f32 {
    0.005
}

fn default_zoom_speed() -> f32 {
    0.1
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    100.0
}

/// Click-to-sit camera focus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Object whose click toggles focus (the chair)
    pub trigger: String,
    /// Box-shaped object framed on activation
    pub volume: String,
    /// Objects whose click forces exit (the desk group)
    #[serde(default)]
    pub exit: Vec<String>,
    /// Eye position applied once the fit completes
    #[serde(default = "default_follow_up_eye")]
    pub follow_up_eye: [f32; 3],
}

fn default_follow_up_eye() -> [f32; 3] {
    [-6.9, 2.3, -0.5]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingConfig {
    #[serde(default = "default_ambient")]
    pub ambient_brightness: f32,
    #[serde(default = "default_sleep_ambient")]
    pub sleep_brightness: f32,
    /// Dim the ambient light ("go to sleep")
    #[serde(default)]
    pub sleep: bool,
    #[serde(default, rename = "lamp")]
    pub lamps: Vec<LampConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_brightness: default_ambient(),
            sleep_brightness: default_sleep_ambient(),
            sleep: false,
            lamps: Vec::new(),
        }
    }
}

impl LightingConfig {
    pub fn effective_ambient(&self) -> f32 {
        if self.sleep {
            self.sleep_brightness
        } else {
            self.ambient_brightness
        }
    }
}

fn default_ambient() -> f32 {
    900.0
}

fn default_sleep_ambient() -> f32 {
    40.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LampKind {
    #[default]
    Point,
    Spot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LampConfig {
    pub name: String,
    #[serde(default)]
    pub kind: LampKind,
    pub position: [f32; 3],
    /// Spot lamps aim at this point
    #[serde(default)]
    pub look_at: Option<[f32; 3]>,
    #[serde(default = "default_lamp_color")]
    pub color: String,
    /// Luminous power in lumens
    pub intensity: f32,
    #[serde(default = "default_lamp_range")]
    pub range: f32,
    /// Spot cone half-angle in radians
    #[serde(default = "default_spot_angle")]
    pub angle: f32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_lamp_color() -> String {
    "#ffffff".to_string()
}

fn default_lamp_range() -> f32 {
    1.5
}

fn default_spot_angle() -> f32 {
    0.6
}

fn default_true() -> bool {
    true
}

/// Splash screen shown until the visitor enters the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
    #[serde(default = "default_message_secs")]
    pub message_secs: f32,
    #[serde(default = "default_ready_secs")]
    pub ready_secs: f32,
    #[serde(default = "default_ready_title")]
    pub ready_title: String,
    #[serde(default = "default_button_label")]
    pub button_label: String,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            messages: default_messages(),
            message_secs: default_message_secs(),
            ready_secs: default_ready_secs(),
            ready_title: default_ready_title(),
            button_label: default_button_label(),
        }
    }
}

fn default_messages() -> Vec<String> {
    vec![
        "Setting the scene".to_string(),
        "Cleaning the room".to_string(),
        "Feeding the cat".to_string(),
    ]
}

fn default_message_secs() -> f32 {
    1.25
}

fn default_ready_secs() -> f32 {
    3.75
}

fn default_ready_title() -> String {
    "Cat fed, room cleaned, scene set!".to_string()
}

fn default_button_label() -> String {
    "ENTER".to_string()
}

/// Hotspot marker look
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_marker_size")]
    pub size: f32,
    /// Yaw speed in radians per second
    #[serde(default = "default_spin_speed")]
    pub spin_speed: f32,
    #[serde(default = "default_idle_color")]
    pub idle_color: String,
    #[serde(default = "default_active_color")]
    pub active_color: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            size: default_marker_size(),
            spin_speed: default_spin_speed(),
            idle_color: default_idle_color(),
            active_color: default_active_color(),
        }
    }
}

fn default_marker_size() -> f32 {
    0.05
}

fn default_spin_speed() -> f32 {
    0.6
}

fn default_idle_color() -> String {
    "#00acff".to_string()
}

fn default_active_color() -> String {
    "#ffa500".to_string()
}

/// Primitive geometry for a room object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeConfig {
    Box { size: [f32; 3] },
    /// Vertical plane facing +Z
    Plane { size: [f32; 2] },
    Cylinder { radius: f32, height: f32 },
    Sphere { radius: f32 },
}

/// One object (or empty group) in the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// None for pure groups
    #[serde(default)]
    pub shape: Option<ShapeConfig>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler XYZ in radians
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub sway: Option<SwayConfig>,
    #[serde(default)]
    pub portal: Option<PortalConfig>,
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

/// Idle yaw oscillation (the chair)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwayConfig {
    #[serde(default = "default_sway_frequency")]
    pub frequency: f32,
    #[serde(default = "default_sway_magnitude")]
    pub magnitude: f32,
    #[serde(default = "default_sway_damping")]
    pub damping: f32,
}

fn default_sway_frequency() -> f32 {
    1.0
}

fn default_sway_magnitude() -> f32 {
    -2.0
}

fn default_sway_damping() -> f32 {
    0.24
}

/// Time-driven colour surface (the TV screen)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_portal_start")]
    pub color_start: String,
    #[serde(default = "default_portal_end")]
    pub color_end: String,
    #[serde(default = "default_portal_speed")]
    pub speed: f32,
}

fn default_portal_start() -> String {
    "#00b2ff".to_string()
}

fn default_portal_end() -> String {
    "#ebbee2".to_string()
}

fn default_portal_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotConfig {
    pub id: String,
    pub object: String,
    #[serde(default)]
    pub marker_offset: [f32; 3],
    #[serde(default)]
    pub anchor_offset: [f32; 3],
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default, rename = "link")]
    pub links: Vec<PayloadLink>,
}

/// External document shown on a screen surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    pub object: String,
    pub url: String,
    #[serde(default)]
    pub offset: [f32; 3],
    #[serde(default = "default_embed_size")]
    pub size: [f32; 2],
}

fn default_embed_size() -> [f32; 2] {
    [0.3, 0.2]
}

impl RoomConfig {
    /// Parse and validate a room from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RoomConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a room file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!(
            "Loaded room config from {:?}: {} objects, {} hotspots",
            path,
            config.objects.len(),
            config.hotspots.len()
        );
        Ok(config)
    }

    /// The compiled-in room
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_ROOM)
    }

    pub fn object(&self, id: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Whether `id` is `ancestor` or sits somewhere below it
    pub fn is_within(&self, id: &str, ancestor: &str) -> bool {
        let mut current = Some(id);
        // Bounded so an unvalidated cycle cannot spin forever
        for _ in 0..=self.objects.len() {
            let Some(node) = current else {
                return false;
            };
            if node == ancestor {
                return true;
            }
            current = self.object(node).and_then(|o| o.parent.as_deref());
        }
        false
    }

    /// Build the annotation registry from the hotspot list
    pub fn registry(&self) -> Result<AnnotationRegistry, ConfigError> {
        let hotspots = self
            .hotspots
            .iter()
            .map(|h| Hotspot {
                id: h.id.clone(),
                object: h.object.clone(),
                marker_offset: h.marker_offset,
                anchor_offset: h.anchor_offset,
                payload: Payload {
                    lines: h.lines.clone(),
                    links: h.links.clone(),
                },
            })
            .collect();
        AnnotationRegistry::new(hotspots)
    }

    /// Check cross references, colours and ids
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for object in &self.objects {
            if !ids.insert(object.id.as_str()) {
                return Err(ConfigError::DuplicateObject(object.id.clone()));
            }
        }

        let require = |referrer: String, object: &str| {
            if ids.contains(object) {
                Ok(())
            } else {
                Err(ConfigError::UnknownObject {
                    referrer,
                    object: object.to_string(),
                })
            }
        };

        for object in &self.objects {
            if let Some(parent) = &object.parent {
                require(format!("object '{}'", object.id), parent)?;
            }
            if let Some(color) = &object.color {
                parse_hex_color(color)?;
            }
            if let Some(portal) = &object.portal {
                parse_hex_color(&portal.color_start)?;
                parse_hex_color(&portal.color_end)?;
            }
        }

        // Every parent chain has to end at the room root
        let parents: HashMap<&str, &str> = self
            .objects
            .iter()
            .filter_map(|o| o.parent.as_deref().map(|parent| (o.id.as_str(), parent)))
            .collect();
        for object in &self.objects {
            let mut seen = HashSet::new();
            let mut current = object.id.as_str();
            while let Some(&parent) = parents.get(current) {
                if !seen.insert(current) {
                    return Err(ConfigError::ParentCycle(object.id.clone()));
                }
                current = parent;
            }
        }

        for hotspot in &self.hotspots {
            require(format!("hotspot '{}'", hotspot.id), &hotspot.object)?;
        }
        for embed in &self.embeds {
            require(format!("embed '{}'", embed.url), &embed.object)?;
        }

        if let Some(focus) = &self.focus {
            require("focus trigger".to_string(), &focus.trigger)?;
            for exit in &focus.exit {
                require("focus exit".to_string(), exit)?;
            }
            match self.object(&focus.volume).and_then(|o| o.shape.as_ref()) {
                Some(ShapeConfig::Box { .. }) => {}
                _ => return Err(ConfigError::MissingFocusVolume(focus.volume.clone())),
            }
        }

        parse_hex_color(&self.scene.background)?;
        parse_hex_color(&self.markers.idle_color)?;
        parse_hex_color(&self.markers.active_color)?;
        for lamp in &self.lighting.lamps {
            parse_hex_color(&lamp.color)?;
        }

        // Duplicate hotspot ids
        self.registry().map(|_| ())
    }
}

/// Parse `#rrggbb` into sRGB components in 0..=1
pub fn parse_hex_color(s: &str) -> Result<[f32; 3], ConfigError> {
    let invalid = || ConfigError::InvalidColor(s.to_string());
    let hex = s.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }

    let mut rgb = [0.0; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        *channel = byte as f32 / 255.0;
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r##"
[[object]]
id = "tv"
shape = { kind = "box", size = [1.3, 0.8, 0.05] }
position = [-0.257, 1.248, -1.841]

[[object]]
id = "chair"
shape = { kind = "cylinder", radius = 0.3, height = 0.6 }

[[object]]
id = "deskGroup"

[[object]]
id = "deskBounds"
parent = "deskGroup"
shape = { kind = "box", size = [0.7, 0.8, 1.2] }
visible = false

[focus]
trigger = "chair"
volume = "deskBounds"
exit = ["deskGroup"]

[[hotspot]]
id = "tv"
object = "tv"
marker_offset = [0.0, 0.5, 0.0]
anchor_offset = [0.0, 1.0, 0.0]
lines = ["PHILIPS AMBILIGHT OLED", "", "Currently watching: The Sopranos"]
"##;

    #[test]
    fn test_minimal_room_with_defaults() {
        let config = RoomConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(config.objects.len(), 4);
        assert_eq!(config.camera.zoom, 160.0);
        assert_eq!(config.camera.eye, [-2.5, 1.0, 2.5]);
        assert_eq!(config.scene.background, "#fcc5c5");
        assert_eq!(config.loading.messages.len(), 3);
        assert_eq!(config.markers.idle_color, "#00acff");
        assert_eq!(config.markers.active_color, "#ffa500");

        let focus = config.focus.as_ref().unwrap();
        assert_eq!(focus.follow_up_eye, [-6.9, 2.3, -0.5]);

        let registry = config.registry().unwrap();
        let tv = registry.get("tv").unwrap();
        assert_eq!(tv.anchor_offset, [0.0, 1.0, 0.0]);
        assert_eq!(tv.payload.lines.len(), 3);
    }

    #[test]
    fn test_unknown_hotspot_object() {
        let toml = r#"
[[hotspot]]
id = "ghost"
object = "nowhere"
"#;
        let err = RoomConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownObject { object, .. } if object == "nowhere"));
    }

    #[test]
    fn test_duplicate_hotspot() {
        let toml = r#"
[[object]]
id = "tv"

[[hotspot]]
id = "tv"
object = "tv"

[[hotspot]]
id = "tv"
object = "tv"
"#;
        let err = RoomConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateHotspot(_)));
    }

    #[test]
    fn test_focus_volume_must_be_box() {
        let toml = r#"
[[object]]
id = "chair"

[focus]
trigger = "chair"
volume = "chair"
"#;
        let err = RoomConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFocusVolume(_)));
    }

    #[test]
    fn test_parent_cycles_rejected() {
        let self_parent = r#"
[[object]]
id = "a"
parent = "a"
"#;
        let err = RoomConfig::from_toml(self_parent).unwrap_err();
        assert!(matches!(err, ConfigError::ParentCycle(id) if id == "a"));

        let mutual = r#"
[[object]]
id = "root"

[[object]]
id = "b"
parent = "c"

[[object]]
id = "c"
parent = "b"
"#;
        let err = RoomConfig::from_toml(mutual).unwrap_err();
        assert!(matches!(err, ConfigError::ParentCycle(_)));

        // A plain chain is fine
        let chain = r#"
[[object]]
id = "a"

[[object]]
id = "b"
parent = "a"

[[object]]
id = "c"
parent = "b"
"#;
        assert!(RoomConfig::from_toml(chain).is_ok());
    }

    #[test]
    fn test_is_within_follows_parents() {
        let config = RoomConfig::from_toml(MINIMAL).unwrap();
        assert!(config.is_within("deskBounds", "deskGroup"));
        assert!(config.is_within("deskGroup", "deskGroup"));
        assert!(!config.is_within("tv", "deskGroup"));
        assert!(!config.is_within("nowhere", "deskGroup"));
    }

    #[test]
    fn test_invalid_color() {
        let toml = r#"
[scene]
background = "pink"
"#;
        let err = RoomConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor(c) if c == "pink"));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000").unwrap(), [1.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("#000000").unwrap(), [0.0, 0.0, 0.0]);
        assert!(parse_hex_color("ff0000").is_err());
        assert!(parse_hex_color("#ff00").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn test_sleep_dims_ambient() {
        let mut lighting = LightingConfig::default();
        assert_eq!(lighting.effective_ambient(), lighting.ambient_brightness);
        lighting.sleep = true;
        assert_eq!(lighting.effective_ambient(), lighting.sleep_brightness);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = RoomConfig::load(file.path()).unwrap();
        assert!(config.object("deskBounds").is_some());

        let missing = RoomConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_builtin_room_is_valid() {
        let config = RoomConfig::builtin().unwrap();
        let registry = config.registry().unwrap();

        for id in ["tv", "irlo", "desk", "ozi"] {
            assert!(registry.contains(id), "missing hotspot {id}");
        }
        assert!(config.focus.is_some());
        assert!(!config.embeds.is_empty());
    }
}
