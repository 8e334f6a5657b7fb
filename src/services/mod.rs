pub mod error;
pub mod media;
pub mod ownership;
pub mod portfolio;
pub mod subdomain;

pub use error::{PortfolioError, PortfolioResult, Resource};
pub use portfolio::PortfolioService;
