pub mod extractor;
pub mod password;
pub mod tokens;

pub use extractor::{AuthUser, MaybeAuthUser};
pub use tokens::{TokenKind, TokenPair, TokenService};
