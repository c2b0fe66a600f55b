pub mod memory;
pub mod postgrest;
pub mod store;
pub mod supabase;

pub use memory::InMemoryBookingStore;
pub use postgrest::SupabaseBookingStore;
pub use store::{AppointmentQuery, BlockQuery, BookingStore, StoreError};
