pub mod media_host;
pub mod relay_service;
pub mod staging;
