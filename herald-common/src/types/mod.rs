pub mod config;
pub mod form;
pub mod http;
pub mod texture;
pub mod token;

pub use config::ClientConfig;
pub use form::{Form, Multipart, Query, encode_form};
pub use http::{ContentType, HttpMethod};
pub use texture::Texture;
pub use token::Token;
