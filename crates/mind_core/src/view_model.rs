use crate::{InitStatus, SearchHit, UploadStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub ready: bool,
    pub init: Option<InitStatus>,
    pub init_error: Option<String>,
    pub uploads: Vec<UploadRowView>,
    pub documents: Vec<DocumentRowView>,
    pub chunk_count: usize,
    pub query: String,
    pub searching: bool,
    pub can_search: bool,
    pub results: Vec<SearchHit>,
    pub last_error: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    /// True once no upload is pending or processing.
    pub fn uploads_settled(&self) -> bool {
        self.uploads.iter().all(|u| !u.status.is_active())
    }

    pub fn upload(&self, filename: &str) -> Option<&UploadRowView> {
        self.uploads.iter().find(|u| u.filename == filename)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRowView {
    pub filename: String,
    pub status: UploadStatus,
    pub current: usize,
    pub total: usize,
    pub percent: f64,
    /// `None` until the first progress report.
    pub etr: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRowView {
    pub id: String,
    pub selected: bool,
}
