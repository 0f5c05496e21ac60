pub mod geo;
pub mod geodesy;
pub mod overlay;
pub mod render;
pub mod layer;
pub mod io;
pub mod config;
pub mod ui;
