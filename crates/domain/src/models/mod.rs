//! Domain model definitions.

mod reservation;
mod resource;
mod user;

pub use reservation::{NewReservation, Reservation, ReservationStatus};
pub use resource::Resource;
pub use user::User;
