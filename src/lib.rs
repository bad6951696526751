// Camera-controlled arcade: color-blob tracking feeding two small games.

pub mod camera;
pub mod capture;
pub mod config;
pub mod control;
pub mod draw;
pub mod driver;
pub mod error;
pub mod games;
pub mod slot;
pub mod types;
pub mod vision;
