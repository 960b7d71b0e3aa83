pub mod device;
pub mod diagnostic;
pub mod queued_submission;
pub mod user;

pub use device::Entity as Device;
pub use diagnostic::Entity as Diagnostic;
pub use queued_submission::Entity as QueuedSubmission;
pub use user::Entity as User;
