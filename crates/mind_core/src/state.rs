use crate::etr::estimate_remaining;
use crate::view_model::{AppViewModel, DocumentRowView, UploadRowView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl UploadStatus {
    /// Pending and processing uploads still have work queued in the worker.
    pub fn is_active(self) -> bool {
        matches!(self, UploadStatus::Pending | UploadStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub current: usize,
    pub total: usize,
    pub percent: f64,
    pub etr: String,
    pub started_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub filename: String,
    pub status: UploadStatus,
    pub progress: Option<UploadProgress>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitStatus {
    pub percent: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_id: String,
    pub content: String,
    pub sender: Option<String>,
    pub date: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    ready: bool,
    init_requested: bool,
    init: Option<InitStatus>,
    init_error: Option<String>,
    uploads: Vec<PendingUpload>,
    documents: Vec<String>,
    chunk_count: usize,
    query: String,
    searching: bool,
    results: Vec<SearchHit>,
    filter: Vec<String>,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            ready: self.ready,
            init: self.init.clone(),
            init_error: self.init_error.clone(),
            uploads: self.uploads.iter().map(upload_row).collect(),
            documents: self
                .documents
                .iter()
                .map(|id| DocumentRowView {
                    id: id.clone(),
                    selected: self.filter.contains(id),
                })
                .collect(),
            chunk_count: self.chunk_count,
            query: self.query.clone(),
            searching: self.searching,
            can_search: self.can_search(),
            results: self.results.clone(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn request_init(&mut self) -> bool {
        if self.ready || self.init_requested {
            return false;
        }
        self.init_requested = true;
        self.init_error = None;
        self.init = Some(InitStatus {
            percent: 0.0,
            status: "Initializing".to_string(),
        });
        self.mark_dirty();
        true
    }

    pub(crate) fn set_ready(&mut self) {
        self.ready = true;
        self.init_error = None;
        self.mark_dirty();
    }

    pub(crate) fn set_init_progress(&mut self, percent: f64, status: String) {
        self.init = Some(InitStatus { percent, status });
        self.mark_dirty();
    }

    /// Queues an upload unless one for the same file is still active.
    pub(crate) fn submit_upload(&mut self, filename: &str) -> bool {
        if let Some(existing) = self.upload(filename) {
            if existing.status.is_active() {
                return false;
            }
        }
        self.uploads.retain(|u| u.filename != filename);
        self.uploads.push(PendingUpload {
            filename: filename.to_string(),
            status: UploadStatus::Pending,
            progress: None,
            error: None,
        });
        self.mark_dirty();
        true
    }

    /// Drops the upload row. Returns whether the worker still had it queued.
    pub(crate) fn remove_upload(&mut self, filename: &str) -> Option<bool> {
        let index = self.uploads.iter().position(|u| u.filename == filename)?;
        let removed = self.uploads.remove(index);
        self.mark_dirty();
        Some(removed.status.is_active())
    }

    pub(crate) fn apply_index_progress(
        &mut self,
        filename: &str,
        current: usize,
        total: usize,
        percent: f64,
        at_ms: u64,
    ) {
        let Some(upload) = self.upload_mut(filename) else {
            return;
        };
        if !upload.status.is_active() {
            return;
        }
        let started_at_ms = upload
            .progress
            .as_ref()
            .map_or(at_ms, |p| p.started_at_ms);
        upload.status = UploadStatus::Processing;
        upload.progress = Some(UploadProgress {
            current,
            total,
            percent,
            etr: estimate_remaining(at_ms.saturating_sub(started_at_ms), current, total),
            started_at_ms,
        });
        self.mark_dirty();
    }

    pub(crate) fn apply_document_added(&mut self, id: &str, count: usize) {
        self.chunk_count = count;
        self.remember_document(id);
        if let Some(upload) = self.upload_mut(id) {
            let (total, started_at_ms) = upload
                .progress
                .as_ref()
                .map_or((0, 0), |p| (p.total, p.started_at_ms));
            upload.status = UploadStatus::Completed;
            upload.error = None;
            upload.progress = Some(UploadProgress {
                current: total,
                total,
                percent: 100.0,
                etr: "done".to_string(),
                started_at_ms,
            });
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_restored(&mut self, ids: Vec<String>) {
        for id in ids {
            self.remember_document(&id);
        }
        self.mark_dirty();
    }

    pub(crate) fn set_query(&mut self, query: String) {
        if self.query != query {
            self.query = query;
            self.mark_dirty();
        }
    }

    /// Starts a search if one may run now; returns the trimmed query and the
    /// document filter to send.
    pub(crate) fn begin_search(&mut self) -> Option<(String, Option<Vec<String>>)> {
        if !self.can_search() {
            return None;
        }
        self.searching = true;
        self.mark_dirty();
        let allowed = (!self.filter.is_empty()).then(|| self.filter.clone());
        Some((self.query.trim().to_string(), allowed))
    }

    pub(crate) fn apply_results(&mut self, results: Vec<SearchHit>) {
        self.results = results;
        self.searching = false;
        self.mark_dirty();
    }

    pub(crate) fn toggle_filter(&mut self, id: &str) {
        if !self.documents.iter().any(|d| d == id) {
            return;
        }
        if let Some(index) = self.filter.iter().position(|d| d == id) {
            self.filter.remove(index);
        } else {
            self.filter.push(id.to_string());
        }
        self.mark_dirty();
    }

    pub(crate) fn clear_filter(&mut self) {
        if !self.filter.is_empty() {
            self.filter.clear();
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_error(&mut self, message: String, document: Option<String>) {
        match document {
            Some(id) => {
                if let Some(upload) = self.upload_mut(&id) {
                    upload.status = UploadStatus::Error;
                    upload.error = Some(message.clone());
                }
            }
            None => {
                self.searching = false;
                if !self.ready {
                    self.init_requested = false;
                    self.init_error = Some(message.clone());
                }
            }
        }
        self.last_error = Some(message);
        self.mark_dirty();
    }

    fn can_search(&self) -> bool {
        self.ready && !self.searching && !self.query.trim().is_empty()
    }

    fn remember_document(&mut self, id: &str) {
        if !self.documents.iter().any(|d| d == id) {
            self.documents.push(id.to_string());
        }
    }

    fn upload(&self, filename: &str) -> Option<&PendingUpload> {
        self.uploads.iter().find(|u| u.filename == filename)
    }

    fn upload_mut(&mut self, filename: &str) -> Option<&mut PendingUpload> {
        self.uploads.iter_mut().find(|u| u.filename == filename)
    }
}

fn upload_row(upload: &PendingUpload) -> UploadRowView {
    let progress = upload.progress.as_ref();
    UploadRowView {
        filename: upload.filename.clone(),
        status: upload.status,
        current: progress.map_or(0, |p| p.current),
        total: progress.map_or(0, |p| p.total),
        percent: progress.map_or(0.0, |p| p.percent),
        etr: progress.map(|p| p.etr.clone()),
        error: upload.error.clone(),
    }
}
