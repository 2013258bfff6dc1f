pub mod health;
pub mod qrcodes;
pub mod redirect;

pub use health::{AppStartTime, HealthService, health_routes};
pub use qrcodes::qrcode_routes;
pub use redirect::{RedirectPolicy, RedirectService, redirect_routes};
