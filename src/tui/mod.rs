pub mod host;
pub mod render;
pub mod theme;

pub use host::ScreenHost;
pub use theme::Theme;
