//! Local mind core: the UI thread's pure state machine and view-model helpers.
mod effect;
mod etr;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use etr::estimate_remaining;
pub use msg::Msg;
pub use state::{AppState, InitStatus, PendingUpload, SearchHit, UploadProgress, UploadStatus};
pub use update::update;
pub use view_model::{AppViewModel, DocumentRowView, UploadRowView};
