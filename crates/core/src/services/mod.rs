pub mod aggregator;
pub mod goal_tracker;
pub mod projection_service;
pub mod quote_service;
pub mod repository;
