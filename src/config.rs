use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use ratatui::style::Color;
use serde::{Deserialize, Deserializer};
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::error::{DialError, DialResult};

// ─── Embedded Default ────────────────────────────────────────────────────
/// Baked into the binary at compile time. The app can never crash due to a
/// missing config file — this is always available as the base layer.
const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

// ─── CLI Arguments (override layer) ─────────────────────────────────────
/// navdial — an animated car-navigation progress dial for the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "navdial", version, about, long_about = None)]
pub struct CliArgs {
    /// Target FPS for the render loop (overrides config file)
    #[arg(long)]
    pub fps: Option<u16>,

    /// Log file path (logging disabled if not specified)
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Log level filter (overrides config file)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to a custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the default config to stdout and exit
    #[arg(long)]
    pub print_default_config: bool,

    /// Run the scripted demo tour on startup
    #[arg(long)]
    pub tour: bool,
}

// ─── TOML Structs ───────────────────────────────────────────────────────

/// Root configuration — parsed from TOML, then overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dial: DialSection,
    #[serde(default)]
    pub theme: ThemeSection,
    #[serde(default)]
    pub assets: AssetsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Target FPS
    #[serde(default = "default_fps")]
    pub fps: u16,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Dial dimensions, in dial units (one unit = one terminal column).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialSection {
    pub car_icon_size: f32,
    pub icon_bg_radius: f32,
    pub center_point_radius: f32,
    pub bar_radius: f32,
    pub bar_width: f32,
    pub arrow_distance: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeSection {
    #[serde(deserialize_with = "deserialize_color", default = "default_color_cyan")]
    pub icon_backdrop: Color,

    #[serde(deserialize_with = "deserialize_color", default = "default_color_green")]
    pub bar_used: Color,

    #[serde(
        deserialize_with = "deserialize_color",
        default = "default_color_darkgray"
    )]
    pub bar_unused: Color,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsSection {
    pub car_icon: String,
    pub arrival_arrow: String,
    pub sector: String,
}

// ─── Defaults ───────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        // Parse the embedded TOML — this cannot fail since we control it
        toml::from_str(DEFAULT_CONFIG_TOML)
            .expect("BUG: embedded default_config.toml is invalid TOML")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DialSection {
    fn default() -> Self {
        Self {
            car_icon_size: 4.0,
            icon_bg_radius: 3.0,
            center_point_radius: 1.0,
            bar_radius: 16.0,
            bar_width: 1.0,
            arrow_distance: 8.0,
        }
    }
}

impl Default for ThemeSection {
    fn default() -> Self {
        Self {
            icon_backdrop: Color::Cyan,
            bar_used: Color::Green,
            bar_unused: Color::DarkGray,
        }
    }
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            car_icon: "▣".into(),
            arrival_arrow: "▼".into(),
            sector: " ░░▒▒▒▒░░\n░▒▒▓▓▓▓▒▒░".into(),
        }
    }
}

// ─── Color Deserializer ─────────────────────────────────────────────────

fn deserialize_color<'de, D>(deserializer: D) -> std::result::Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_color(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: \"{s}\"")))
}

/// Parse a color string into a ratatui Color.
/// Supports: named colors, "reset", "#RRGGBB" hex.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "reset" | "default" | "transparent" => Some(Color::Reset),
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" | "dark_gray" | "dark_grey" => Some(Color::DarkGray),
        "lightred" | "light_red" => Some(Color::LightRed),
        "lightgreen" | "light_green" => Some(Color::LightGreen),
        "lightyellow" | "light_yellow" => Some(Color::LightYellow),
        "lightblue" | "light_blue" => Some(Color::LightBlue),
        "lightmagenta" | "light_magenta" => Some(Color::LightMagenta),
        "lightcyan" | "light_cyan" => Some(Color::LightCyan),
        hex if hex.starts_with('#') && hex.len() == 7 => {
            let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
            let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
            let b = u8::from_str_radix(&hex[5..7], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

// ─── Serde Default Helpers ──────────────────────────────────────────────

fn default_fps() -> u16 {
    30
}
fn default_log_level() -> String {
    "info".into()
}
fn default_color_cyan() -> Color {
    Color::Cyan
}
fn default_color_green() -> Color {
    Color::Green
}
fn default_color_darkgray() -> Color {
    Color::DarkGray
}

// ─── Path Resolution ────────────────────────────────────────────────────

impl Config {
    /// Standard config file path: ~/.config/navdial/config.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("navdial")
            .join("config.toml")
    }

    /// Convenience: tick interval from FPS
    pub fn tick_rate_ms(&self) -> u64 {
        let fps = self.general.fps.max(1);
        1000 / fps as u64
    }
}

// ─── Bootloader ─────────────────────────────────────────────────────────

/// The single entry point for configuration. Called exactly once at startup.
///
/// 1. Resolve config file path (CLI override or default)
/// 2. If the config file doesn't exist, create directory tree + write defaults
/// 3. Parse TOML from disk into Config
/// 4. Apply CLI overrides on top
pub fn load(cli: &CliArgs) -> Result<Config> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    // Bootstrap: ensure the file exists on disk
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&config_path, DEFAULT_CONFIG_TOML).wrap_err_with(|| {
            format!(
                "Failed to write default config to {}",
                config_path.display()
            )
        })?;
        info!("Created default config at {}", config_path.display());
    }

    // Read and parse
    let toml_str = std::fs::read_to_string(&config_path)
        .wrap_err_with(|| format!("Failed to read config from {}", config_path.display()))?;

    let mut config: Config = toml::from_str(&toml_str).wrap_err_with(|| {
        format!(
            "Failed to parse config at {}.\n\
             Delete the file to regenerate defaults, or run:\n  \
             navdial --print-default-config > {:?}",
            config_path.display(),
            config_path
        )
    })?;

    // ── CLI overrides ───────────────────────────────────────────────
    if let Some(fps) = cli.fps {
        config.general.fps = fps;
    }
    if let Some(ref level) = cli.log_level {
        config.general.log_level = level.clone();
    }

    Ok(config)
}

/// Returns the embedded default config TOML string.
pub fn default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

// ─── Sprites ────────────────────────────────────────────────────────────

/// A glyph-art image asset, drawn row by row on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    lines: Vec<String>,
    width: f32,
    height: f32,
}

impl Sprite {
    /// Parse a sprite from its config string. A sprite with no visible
    /// glyphs is a fatal configuration error — the dial cannot render
    /// without its image assets.
    pub fn parse(name: &'static str, source: &str) -> DialResult<Self> {
        let mut lines: Vec<String> = source
            .lines()
            .map(|line| line.trim_end().to_string())
            .skip_while(|line| line.is_empty())
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(DialError::MissingAsset(name));
        }
        let width = lines
            .iter()
            .map(|line| UnicodeWidthStr::width(line.as_str()))
            .max()
            .unwrap_or(0) as f32;
        let height = lines.len() as f32;
        Ok(Self {
            lines,
            width,
            height,
        })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

// ─── Resolved Dial Bundle ───────────────────────────────────────────────

/// Immutable configuration bundle consumed by the dial at construction and
/// shared read-only by every visual part.
#[derive(Debug, Clone)]
pub struct DialConfig {
    pub car_icon_size: f32,
    pub icon_bg_radius: f32,
    pub center_point_radius: f32,
    pub bar_radius: f32,
    pub bar_width: f32,
    pub arrow_distance: f32,

    pub car_icon: Sprite,
    pub arrival_arrow: Sprite,
    pub sector: Sprite,

    pub icon_backdrop_color: Color,
    pub bar_used_color: Color,
    pub bar_unused_color: Color,
}

impl DialConfig {
    /// Validate and resolve the raw config into the runtime bundle.
    /// Missing assets and broken dimensions fail construction.
    pub fn resolve(config: &Config) -> DialResult<Self> {
        let dial = &config.dial;
        for (name, value) in [
            ("car_icon_size", dial.car_icon_size),
            ("icon_bg_radius", dial.icon_bg_radius),
            ("center_point_radius", dial.center_point_radius),
            ("bar_radius", dial.bar_radius),
            ("bar_width", dial.bar_width),
            ("arrow_distance", dial.arrow_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DialError::InvalidDimension { name, value });
            }
        }

        Ok(Self {
            car_icon_size: dial.car_icon_size,
            icon_bg_radius: dial.icon_bg_radius,
            center_point_radius: dial.center_point_radius,
            bar_radius: dial.bar_radius,
            bar_width: dial.bar_width,
            arrow_distance: dial.arrow_distance,

            car_icon: Sprite::parse("car_icon", &config.assets.car_icon)?,
            arrival_arrow: Sprite::parse("arrival_arrow", &config.assets.arrival_arrow)?,
            sector: Sprite::parse("sector", &config.assets.sector)?,

            icon_backdrop_color: config.theme.icon_backdrop,
            bar_used_color: config.theme.bar_used,
            bar_unused_color: config.theme.bar_unused,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_config_parses_and_resolves() {
        let config = Config::default();
        let dial = DialConfig::resolve(&config).expect("default config must resolve");
        assert!(dial.bar_radius > 0.0);
        assert!(dial.car_icon.width() >= 1.0);
        assert_eq!(dial.sector.height(), 2.0);
    }

    #[test]
    fn missing_asset_is_fatal() {
        let mut config = Config::default();
        config.assets.car_icon = "   \n  ".into();
        let err = DialConfig::resolve(&config).unwrap_err();
        assert!(matches!(err, DialError::MissingAsset("car_icon")));
    }

    #[test]
    fn negative_dimension_is_fatal() {
        let mut config = Config::default();
        config.dial.bar_radius = -1.0;
        let err = DialConfig::resolve(&config).unwrap_err();
        assert!(matches!(
            err,
            DialError::InvalidDimension {
                name: "bar_radius",
                ..
            }
        ));
    }

    #[test]
    fn sprite_measures_multiline_art() {
        let sprite = Sprite::parse("sector", " ░░ \n░▓▓░\n").unwrap();
        assert_eq!(sprite.height(), 2.0);
        assert_eq!(sprite.width(), 4.0);
        assert_eq!(sprite.lines().len(), 2);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(parse_color("cyan"), Some(Color::Cyan));
        assert_eq!(parse_color("dark_gray"), Some(Color::DarkGray));
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn tick_rate_from_fps() {
        let mut config = Config::default();
        config.general.fps = 50;
        assert_eq!(config.tick_rate_ms(), 20);
        config.general.fps = 0;
        assert_eq!(config.tick_rate_ms(), 1000);
    }
}
