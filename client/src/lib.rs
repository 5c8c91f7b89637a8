#![warn(clippy::all, rust_2018_idioms)]
mod app;
mod model;

pub use app::DemoApp;
pub use model::SearchModel;
