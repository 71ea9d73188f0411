pub mod activities;
pub mod events;
pub mod form_fields;
pub mod profiles;
pub mod registrations;

pub use activities::ActivitiesRow;
pub use events::EventsRow;
pub use form_fields::FormFieldRow;
pub use profiles::ProfilesRow;
pub use registrations::RegistrationsRow;
