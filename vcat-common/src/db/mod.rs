//! Database access for the vehicle catalog

pub mod init;
pub mod makes;
pub mod vehicle_types;

pub use init::{create_tables, init_db};
pub use makes::{Make, MakeWithVehicleTypes, VehicleType};
pub use vehicle_types::VehicleTypeWithMake;
