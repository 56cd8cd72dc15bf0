//! HTTP API handlers for rsa-demo

pub mod analyze;
pub mod buildinfo;
pub mod health;
pub mod token;
pub mod ui;
pub mod view;

pub use analyze::analyze_routes;
pub use buildinfo::buildinfo_routes;
pub use health::health_routes;
pub use token::token_routes;
pub use ui::ui_routes;
pub use view::view_routes;
