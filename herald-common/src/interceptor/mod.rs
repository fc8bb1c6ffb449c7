pub mod traits;

pub use traits::{HeaderInterceptor, Interceptor, NoOpInterceptor};
