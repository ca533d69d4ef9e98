pub mod service;

pub use service::CsrfTokenPair;
pub use service::CsrfTokenService;
