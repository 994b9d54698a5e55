pub mod company;
pub mod placement;
pub mod session;
pub mod student;
pub mod user;

// Re-export models for easier access
pub use company::*;
pub use placement::*;
pub use session::*;
pub use student::*;
pub use user::*;
