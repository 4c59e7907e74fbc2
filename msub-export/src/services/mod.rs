//! External collaborators: file content store, person lookup, mail relay,
//! and the import-result reconciliation handler

pub mod file_store;
pub mod import_result;
pub mod mailer;
pub mod people_client;

pub use file_store::{FileContentStore, LocalFileStore};
pub use import_result::{store_result, validate_response};
pub use mailer::{MailSender, RelayMailer};
pub use people_client::{PeopleApiClient, Person, PersonLookup};
