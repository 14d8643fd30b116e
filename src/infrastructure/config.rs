use crate::domain::coordinates::{
    CoordinateModel, OverlayBreakpoint, Padding, PaddingBreakpoint,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {0}")]
    InvalidBind(String),

    #[error("grid {0} must be positive")]
    NonPositive(&'static str),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            data_dir: default_data_dir(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }
}

/// Grid geometry as written in `config/grid`; snake_case keys throughout.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GridSettings {
    pub cell: f64,
    pub cols: u32,
    pub cell_inset: f64,
    pub overlay_cols: u32,
    pub overlay_rows: u32,
    pub overlay_breakpoints: Vec<OverlayBreakpointSettings>,
    pub padding: Padding,
    pub padding_breakpoints: Vec<PaddingBreakpointSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayBreakpointSettings {
    pub max_width: f64,
    pub cols: u32,
    pub rows: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaddingBreakpointSettings {
    pub max_width: f64,
    #[serde(default)]
    pub padding: Padding,
}

impl Default for GridSettings {
    fn default() -> Self {
        let model = CoordinateModel::default();
        Self {
            cell: model.cell,
            cols: model.cols,
            cell_inset: model.cell_inset,
            overlay_cols: model.overlay_cols,
            overlay_rows: model.overlay_rows,
            overlay_breakpoints: Vec::new(),
            padding: model.padding,
            padding_breakpoints: Vec::new(),
        }
    }
}

impl GridSettings {
    pub fn into_model(self) -> Result<CoordinateModel, ConfigError> {
        if !(self.cell > 0.0) {
            return Err(ConfigError::NonPositive("cell"));
        }
        if self.cols == 0 {
            return Err(ConfigError::NonPositive("cols"));
        }

        Ok(CoordinateModel {
            cell: self.cell,
            cols: self.cols,
            cell_inset: self.cell_inset,
            overlay_cols: self.overlay_cols,
            overlay_rows: self.overlay_rows,
            overlay_breakpoints: self
                .overlay_breakpoints
                .into_iter()
                .map(|bp| OverlayBreakpoint {
                    max_width: bp.max_width,
                    cols: bp.cols,
                    rows: bp.rows,
                })
                .collect(),
            padding: self.padding,
            padding_breakpoints: self
                .padding_breakpoints
                .into_iter()
                .map(|bp| PaddingBreakpoint {
                    max_width: bp.max_width,
                    padding: bp.padding,
                })
                .collect(),
        })
    }
}

/// `config/server` (optional) overlaid with `DASHBOARD_SERVER__*` env vars.
pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// `config/grid` (optional); falls back to the built-in geometry.
pub fn load_grid_config() -> anyhow::Result<CoordinateModel> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/grid").required(false))
        .build()?;

    grid_model_from(settings)
}

fn grid_model_from(settings: config::Config) -> anyhow::Result<CoordinateModel> {
    let grid: GridSettings = settings.try_deserialize()?;
    Ok(grid.into_model()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn from_toml(src: &str) -> Config {
        Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn test_server_defaults_when_empty() {
        let cfg: ServerConfig = from_toml("").try_deserialize().unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.server.data_dir, PathBuf::from("data"));
        assert!(cfg.server.bind_addr().is_ok());
    }

    #[test]
    fn test_server_bind_is_validated() {
        let cfg: ServerConfig = from_toml("[server]\nbind = \"not an address\"\n")
            .try_deserialize()
            .unwrap();
        assert!(matches!(cfg.server.bind_addr(), Err(ConfigError::InvalidBind(_))));
    }

    #[test]
    fn test_grid_breakpoints() {
        let src = r#"
cell = 80
cols = 40

[[overlay_breakpoints]]
max_width = 1920
cols = 0
rows = 0

[[overlay_breakpoints]]
max_width = 2560
cols = 25
rows = 13

[[padding_breakpoints]]
max_width = 2560
padding = { left = 12, right = 12 }
"#;
        let model = grid_model_from(from_toml(src)).unwrap();
        assert_eq!(model.overlay_breakpoints.len(), 2);
        assert_eq!(model.resolve_overlay_dims(2000.0).cols, 25);
        assert_eq!(model.resolve_overlay_dims(4000.0).rows, 12);

        let pad = model.resolve_padding(2560.0);
        assert_eq!((pad.left, pad.top), (12.0, 0.0));
    }

    #[test]
    fn test_grid_rejects_zero_cell() {
        let err = grid_model_from(from_toml("cell = 0")).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_grid_defaults() {
        let model = grid_model_from(from_toml("")).unwrap();
        assert_eq!(model, CoordinateModel::default());
    }
}
