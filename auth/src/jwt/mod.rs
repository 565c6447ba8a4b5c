pub mod claims;
pub mod errors;
pub mod handler;
pub mod secret;

pub use claims::Claims;
pub use errors::JwtError;
pub use errors::TokenRejection;
pub use handler::IssuedToken;
pub use handler::JwtHandler;
pub use handler::VerifiedToken;
pub use secret::SigningSecret;
