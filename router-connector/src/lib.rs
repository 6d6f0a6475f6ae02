pub const REFERENCE: &'static str = include_str!("../reference.toml");

pub mod config;
pub mod connector;
pub mod endpoint;
pub mod error;
pub mod ext;
pub mod properties;
pub mod registry;
pub mod router;
pub mod snapshot;
pub mod transport;

#[cfg(test)]
mod test {
    use tracing::Level;

    use crate::ext::init_logger;

    #[ctor::ctor]
    fn init() {
        init_logger(Level::DEBUG)
    }
}
