pub mod error;
pub mod memory;
pub mod store;
pub mod supabase;

pub use error::DatabaseError;
pub use memory::InMemoryClinicStore;
pub use store::ClinicStore;
pub use supabase::{SupabaseClient, SupabaseClinicStore};
