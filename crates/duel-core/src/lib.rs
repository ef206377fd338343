#![deny(warnings)]
pub mod game;
pub mod model;
pub mod sampler;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "card-duel"
    }

    pub const fn codename() -> &'static str {
        "Thirty Cards"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
