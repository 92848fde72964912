pub mod booking;
pub mod slot;
pub mod turf;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use slot::Slot;
pub use turf::Turf;
