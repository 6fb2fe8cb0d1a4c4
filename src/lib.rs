pub mod api;
pub mod config;
pub mod db;
pub mod schedule;

pub use db::DbPool;

use anyhow::Result;
use config::{BookingPolicy, Config};

use crate::schedule::BookingService;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub policy: BookingPolicy,
    pub booking: BookingService,
}

impl AppState {
    /// Resolve the booking policy and wire the services to the pool
    pub fn new(config: Config, db: DbPool) -> Result<Self> {
        let policy = config.booking_policy()?;
        let booking = BookingService::new(db.clone(), policy);
        Ok(Self {
            config,
            db,
            policy,
            booking,
        })
    }
}
