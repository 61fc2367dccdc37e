pub mod availability;
pub mod helpdesk_schedule;
pub mod service;
pub mod store;
