pub mod prepare_env;
mod provider;

pub use provider::StaticProvider;
